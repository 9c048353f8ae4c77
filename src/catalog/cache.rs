use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::element_set::ElementSet;
use crate::catalog::group::ObjectGroup;
use crate::catalog::source::CatalogSource;

/// Most recent element sets per group id.
///
/// A snapshot is never modified; updates produce a new cache that shares the
/// untouched groups' collections with the old one.
#[derive(Debug, Clone, Default)]
pub struct CatalogCache {
    groups: Arc<HashMap<String, Arc<Vec<ElementSet>>>>,
}

impl CatalogCache {
    pub fn get(&self, group_id: &str) -> &[ElementSet] {
        self.groups
            .get(group_id)
            .map(|sets| sets.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.groups.contains_key(group_id)
    }

    /// Total element sets across every cached group.
    pub fn element_count(&self) -> usize {
        self.groups.values().map(|sets| sets.len()).sum()
    }

    pub fn loaded_groups(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.groups.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn with_updates(&self, updates: Vec<(String, Vec<ElementSet>)>) -> CatalogCache {
        if updates.is_empty() {
            return self.clone();
        }

        let mut groups = (*self.groups).clone();
        for (group_id, sets) in updates {
            groups.insert(group_id, Arc::new(sets));
        }

        CatalogCache {
            groups: Arc::new(groups),
        }
    }
}

/// Result of fetching a set of groups. Failed groups have no update, so
/// applying the round keeps whatever they had before.
#[derive(Debug, Default)]
pub struct FetchRound {
    pub updates: Vec<(String, Vec<ElementSet>)>,
    pub failed: Vec<String>,
}

impl FetchRound {
    pub fn fetched_count(&self) -> usize {
        self.updates.iter().map(|(_, sets)| sets.len()).sum()
    }
}

pub async fn fetch_groups<S: CatalogSource>(source: &S, groups: &[ObjectGroup]) -> FetchRound {
    let mut round = FetchRound::default();

    for group in groups {
        match source.fetch(group).await {
            Ok(sets) => {
                log::info!("Fetched {} element sets for group {}", sets.len(), group.id);
                round.updates.push((group.id.clone(), sets));
            }
            Err(e) => {
                log::warn!("Failed to fetch group {}: {}", group.id, e);
                round.failed.push(group.id.clone());
            }
        }
    }

    round
}
