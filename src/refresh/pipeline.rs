use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::catalog::{fetch_groups, CatalogCache, CatalogSource, ObjectGroup};
use crate::fusion::resolve;
use crate::propagate::{AnalyticalModel, BatchPropagator, PropagatedPosition, Sgp4Model};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown group: {0}")]
    UnknownGroup(String),
}

/// What caused a propagation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PassTrigger {
    Mount,
    GroupToggled,
    CacheUpdated,
    Timer,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchScope {
    /// Every enabled group.
    Enabled,
    /// Enabled groups with nothing cached yet.
    Missing,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub enum PipelineMode {
    Idle,
    Propagating { since: DateTime<Utc> },
}

/// The position set from the last completed pass.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct PublishedSet {
    pub positions: Vec<PropagatedPosition>,
    /// Instant the positions were propagated to.
    pub timestamp: Option<DateTime<Utc>>,
    /// Wall-clock time the pass finished.
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PipelineStatus {
    pub mode: PipelineMode,
    pub last_pass_at: Option<DateTime<Utc>>,
    pub position_count: usize,
    pub cached_element_sets: usize,
    pub loaded_groups: Vec<String>,
    pub loading: bool,
    pub fetch_error: bool,
}

#[derive(Debug, Clone)]
pub struct PassSummary {
    pub trigger: PassTrigger,
    pub resolved: usize,
    pub published: usize,
    pub rejected: usize,
    pub duration_ms: u128,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    pub fetched_groups: Vec<String>,
    pub failed_groups: Vec<String>,
    pub element_sets: usize,
}

struct Shared {
    groups: Arc<Vec<ObjectGroup>>,
    cache: CatalogCache,
    published: Arc<PublishedSet>,
    pass_started: Option<DateTime<Utc>>,
    loading: bool,
    fetch_error: bool,
}

/// Clears its flag when dropped.
struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlagGuard(flag))
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the group configuration, the catalog cache and the published set.
///
/// Inputs are held as shared snapshots and replaced by value. A pass clones
/// the current snapshots once and never sees later changes.
pub struct Pipeline<S, M = Sgp4Model> {
    source: S,
    engine: BatchPropagator<M>,
    shared: StdMutex<Shared>,
    propagating: AtomicBool,
    fetching: AtomicBool,
}

impl<S, M> Pipeline<S, M>
where
    S: CatalogSource,
    M: AnalyticalModel + 'static,
{
    pub fn new(source: S, engine: BatchPropagator<M>, groups: Vec<ObjectGroup>) -> Self {
        Self {
            source,
            engine,
            shared: StdMutex::new(Shared {
                groups: Arc::new(groups),
                cache: CatalogCache::default(),
                published: Arc::new(PublishedSet::default()),
                pass_started: None,
                loading: false,
                fetch_error: false,
            }),
            propagating: AtomicBool::new(false),
            fetching: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn groups(&self) -> Arc<Vec<ObjectGroup>> {
        self.lock().groups.clone()
    }

    pub fn cache(&self) -> CatalogCache {
        self.lock().cache.clone()
    }

    pub fn published(&self) -> Arc<PublishedSet> {
        self.lock().published.clone()
    }

    pub fn status(&self) -> PipelineStatus {
        let shared = self.lock();
        let mode = match shared.pass_started {
            Some(since) => PipelineMode::Propagating { since },
            None => PipelineMode::Idle,
        };
        PipelineStatus {
            mode,
            last_pass_at: shared.published.completed_at,
            position_count: shared.published.positions.len(),
            cached_element_sets: shared.cache.element_count(),
            loaded_groups: shared.cache.loaded_groups(),
            loading: shared.loading,
            fetch_error: shared.fetch_error,
        }
    }

    /// Cached element sets across enabled groups, before deduplication.
    pub fn enabled_object_count(&self) -> usize {
        let shared = self.lock();
        shared
            .groups
            .iter()
            .filter(|g| g.enabled)
            .map(|g| shared.cache.get(&g.id).len())
            .sum()
    }

    pub fn set_group_enabled(&self, id: &str, enabled: bool) -> Result<ObjectGroup, PipelineError> {
        self.update_group(id, |group| group.enabled = enabled)
    }

    pub fn toggle_group(&self, id: &str) -> Result<ObjectGroup, PipelineError> {
        self.update_group(id, |group| group.enabled = !group.enabled)
    }

    fn update_group<F>(&self, id: &str, update: F) -> Result<ObjectGroup, PipelineError>
    where
        F: FnOnce(&mut ObjectGroup),
    {
        let mut shared = self.lock();
        let index = shared
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| PipelineError::UnknownGroup(id.to_string()))?;

        let mut groups = (*shared.groups).clone();
        update(&mut groups[index]);
        let updated = groups[index].clone();
        shared.groups = Arc::new(groups);

        log::info!(
            "Group {} {}",
            id,
            if updated.enabled { "enabled" } else { "disabled" }
        );
        Ok(updated)
    }

    /// Fetch a round of groups into the cache. Returns `None` if another
    /// round is already running.
    pub async fn fetch(&self, scope: FetchScope) -> Option<FetchSummary> {
        let Some(_guard) = FlagGuard::acquire(&self.fetching) else {
            log::debug!("Fetch round already running, dropping request");
            return None;
        };

        let targets: Vec<ObjectGroup> = {
            let shared = self.lock();
            shared
                .groups
                .iter()
                .filter(|g| g.enabled)
                .filter(|g| scope == FetchScope::Enabled || !shared.cache.contains(&g.id))
                .cloned()
                .collect()
        };
        if targets.is_empty() {
            return Some(FetchSummary::default());
        }

        self.lock().loading = true;
        let round = fetch_groups(&self.source, &targets).await;

        let summary = FetchSummary {
            fetched_groups: round.updates.iter().map(|(id, _)| id.clone()).collect(),
            failed_groups: round.failed.clone(),
            element_sets: round.fetched_count(),
        };

        {
            let mut shared = self.lock();
            shared.cache = shared.cache.with_updates(round.updates);
            shared.loading = false;
            shared.fetch_error = !summary.failed_groups.is_empty();
        }

        log::info!(
            "Fetch round done: {} groups, {} element sets, {} failed",
            summary.fetched_groups.len(),
            summary.element_sets,
            summary.failed_groups.len()
        );
        Some(summary)
    }

    pub async fn run_pass(&self, trigger: PassTrigger) -> Option<PassSummary> {
        self.run_pass_at(trigger, Utc::now()).await
    }

    /// Resolve and propagate to `at`, then publish. Returns `None` without
    /// doing anything if a pass is already in flight.
    pub async fn run_pass_at(&self, trigger: PassTrigger, at: DateTime<Utc>) -> Option<PassSummary> {
        let Some(_guard) = FlagGuard::acquire(&self.propagating) else {
            log::debug!("Pass in flight, dropping {} trigger", trigger);
            return None;
        };

        let started = Instant::now();
        let (groups, cache) = {
            let mut shared = self.lock();
            shared.pass_started = Some(Utc::now());
            (shared.groups.clone(), shared.cache.clone())
        };

        let resolved = resolve(&groups, &cache);
        let outcome = self
            .engine
            .propagate(&resolved, at, |progress| {
                log::debug!(
                    "Pass ({}) chunk {}/{}: {} of {} objects",
                    trigger,
                    progress.chunk,
                    progress.chunks,
                    progress.processed,
                    progress.total
                );
            })
            .await;

        let summary = PassSummary {
            trigger,
            resolved: resolved.len(),
            published: outcome.positions.len(),
            rejected: outcome.rejected,
            duration_ms: started.elapsed().as_millis(),
            timestamp: at,
        };

        {
            let mut shared = self.lock();
            shared.published = Arc::new(PublishedSet {
                positions: outcome.positions,
                timestamp: Some(at),
                completed_at: Some(Utc::now()),
            });
            shared.pass_started = None;
        }

        log::info!(
            "Pass ({}) published {} of {} objects in {} ms",
            trigger,
            summary.published,
            summary.resolved,
            summary.duration_ms
        );
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::catalog::testing::{feed_body, fixture_epoch, group, StaticSource};
    use crate::catalog::GroupCategory;

    const STATIONS: [u32; 5] = [25544, 48274, 49044, 53239, 54216];
    const ACTIVE: [u32; 8] = [5, 11, 25544, 43013, 44713, 44714, 48274, 60001];

    fn pipeline(chunk_size: usize) -> Pipeline<StaticSource> {
        let source = StaticSource::default()
            .with_feed("stations", feed_body(&STATIONS, "STATION"))
            .with_feed("active", feed_body(&ACTIVE, "ACTIVE"));
        let groups = vec![
            group("active", GroupCategory::GenericActive, true),
            group("stations", GroupCategory::Station, true),
        ];
        Pipeline::new(source, BatchPropagator::new(Sgp4Model, chunk_size), groups)
    }

    fn owners(published: &PublishedSet, catalog_id: u32) -> Vec<String> {
        published
            .positions
            .iter()
            .filter(|p| p.catalog_id == catalog_id)
            .map(|p| p.group.clone())
            .collect()
    }

    fn assert_unique(published: &PublishedSet) {
        let ids: HashSet<u32> = published.positions.iter().map(|p| p.catalog_id).collect();
        assert_eq!(ids.len(), published.positions.len());
    }

    #[tokio::test]
    async fn overlapping_groups_publish_each_object_once() {
        let pipeline = pipeline(4);
        pipeline.fetch(FetchScope::Enabled).await.unwrap();

        let summary = pipeline
            .run_pass_at(PassTrigger::Mount, fixture_epoch())
            .await
            .unwrap();
        assert_eq!(summary.resolved, 11);
        assert_eq!(summary.published, 11);

        let published = pipeline.published();
        assert_unique(&published);
        assert_eq!(owners(&published, 25544), vec!["stations"]);
        assert_eq!(owners(&published, 48274), vec!["stations"]);
        assert_eq!(owners(&published, 44713), vec!["active"]);
        assert_eq!(published.timestamp, Some(fixture_epoch()));
    }

    #[tokio::test]
    async fn trigger_during_pass_is_dropped() {
        let pipeline = pipeline(1);
        pipeline.fetch(FetchScope::Enabled).await.unwrap();

        let (first, second) = tokio::join!(
            pipeline.run_pass_at(PassTrigger::Manual, fixture_epoch()),
            pipeline.run_pass_at(PassTrigger::GroupToggled, fixture_epoch()),
        );

        assert!(first.is_some() != second.is_some());
        let summary = first.or(second).unwrap();
        assert_eq!(summary.published, 11);
        assert_eq!(pipeline.published().positions.len(), 11);
        assert!(matches!(pipeline.status().mode, PipelineMode::Idle));
    }

    #[tokio::test]
    async fn pass_is_refused_while_guard_is_held() {
        let pipeline = pipeline(8);
        pipeline.fetch(FetchScope::Enabled).await.unwrap();

        let held = FlagGuard::acquire(&pipeline.propagating).unwrap();
        assert!(pipeline
            .run_pass_at(PassTrigger::Timer, fixture_epoch())
            .await
            .is_none());
        assert!(pipeline.published().positions.is_empty());

        drop(held);
        assert!(pipeline
            .run_pass_at(PassTrigger::Timer, fixture_epoch())
            .await
            .is_some());
    }

    #[tokio::test]
    async fn concurrent_fetch_is_dropped() {
        let pipeline = pipeline(8);
        let held = FlagGuard::acquire(&pipeline.fetching).unwrap();
        assert!(pipeline.fetch(FetchScope::Enabled).await.is_none());
        drop(held);
        assert!(pipeline.fetch(FetchScope::Enabled).await.is_some());
    }

    #[tokio::test]
    async fn disabling_everything_publishes_an_empty_set() {
        let pipeline = pipeline(8);
        pipeline.fetch(FetchScope::Enabled).await.unwrap();
        pipeline.run_pass_at(PassTrigger::Mount, fixture_epoch()).await.unwrap();
        assert_eq!(pipeline.published().positions.len(), 11);

        pipeline.set_group_enabled("stations", false).unwrap();
        pipeline.set_group_enabled("active", false).unwrap();
        let summary = pipeline
            .run_pass_at(PassTrigger::GroupToggled, fixture_epoch())
            .await
            .unwrap();

        assert_eq!(summary.published, 0);
        assert!(pipeline.published().positions.is_empty());
        assert!(pipeline.published().completed_at.is_some());
        assert_eq!(pipeline.enabled_object_count(), 0);
        assert_eq!(pipeline.cache().element_count(), 13);
    }

    #[tokio::test]
    async fn toggling_keeps_cached_data() {
        let pipeline = pipeline(8);
        pipeline.fetch(FetchScope::Enabled).await.unwrap();
        assert_eq!(pipeline.source().fetch_count(), 2);

        let stations = pipeline.toggle_group("stations").unwrap();
        assert!(!stations.enabled);
        pipeline.fetch(FetchScope::Missing).await.unwrap();
        pipeline.run_pass_at(PassTrigger::GroupToggled, fixture_epoch()).await.unwrap();
        assert_eq!(owners(&pipeline.published(), 25544), vec!["active"]);
        assert!(owners(&pipeline.published(), 49044).is_empty());

        assert!(pipeline.toggle_group("stations").unwrap().enabled);
        pipeline.fetch(FetchScope::Missing).await.unwrap();
        pipeline.run_pass_at(PassTrigger::GroupToggled, fixture_epoch()).await.unwrap();
        assert_eq!(owners(&pipeline.published(), 25544), vec!["stations"]);
        assert_eq!(pipeline.source().fetch_count(), 2);
    }

    #[tokio::test]
    async fn failed_source_leaves_other_groups_alone() {
        let pipeline = pipeline(8);
        pipeline.fetch(FetchScope::Enabled).await.unwrap();

        pipeline.source().set_feed("stations", None);
        pipeline
            .source()
            .set_feed("active", Some(feed_body(&[25544, 5, 70000], "ACTIVE")));
        let summary = pipeline.fetch(FetchScope::Enabled).await.unwrap();
        assert_eq!(summary.failed_groups, vec!["stations"]);
        assert!(pipeline.status().fetch_error);

        pipeline.run_pass_at(PassTrigger::CacheUpdated, fixture_epoch()).await.unwrap();
        let published = pipeline.published();
        assert_unique(&published);
        assert_eq!(published.positions.len(), 5 + 2);
        assert_eq!(owners(&published, 25544), vec!["stations"]);
        assert_eq!(owners(&published, 70000), vec!["active"]);
    }

    #[tokio::test]
    async fn newly_enabled_group_is_fetched_once() {
        let source = StaticSource::default()
            .with_feed("stations", feed_body(&STATIONS, "STATION"))
            .with_feed("debris", feed_body(&[30001, 30002], "DEBRIS"));
        let groups = vec![
            group("stations", GroupCategory::Station, true),
            group("debris", GroupCategory::Debris, false),
        ];
        let pipeline = Pipeline::new(source, BatchPropagator::new(Sgp4Model, 8), groups);

        pipeline.fetch(FetchScope::Enabled).await.unwrap();
        assert_eq!(pipeline.status().loaded_groups, vec!["stations"]);

        pipeline.set_group_enabled("debris", true).unwrap();
        let summary = pipeline.fetch(FetchScope::Missing).await.unwrap();
        assert_eq!(summary.fetched_groups, vec!["debris"]);
        assert_eq!(pipeline.enabled_object_count(), 7);

        let summary = pipeline.fetch(FetchScope::Missing).await.unwrap();
        assert!(summary.fetched_groups.is_empty());
        assert_eq!(pipeline.source().fetch_count(), 2);
    }

    #[test]
    fn unknown_group_cannot_be_toggled() {
        let pipeline = pipeline(8);
        assert!(matches!(
            pipeline.toggle_group("weather"),
            Err(PipelineError::UnknownGroup(id)) if id == "weather"
        ));
    }
}
