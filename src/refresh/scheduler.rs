use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::catalog::CatalogSource;
use crate::propagate::AnalyticalModel;
use crate::refresh::period::refresh_period;
use crate::refresh::pipeline::{FetchScope, PassTrigger, Pipeline};

const TRIGGER_QUEUE: usize = 16;

/// External events that feed the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Trigger {
    /// A group was enabled or disabled.
    GroupToggled,
    /// Re-fetch every enabled group, then propagate.
    Refresh,
}

#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<Trigger>,
}

impl SchedulerHandle {
    /// Queue a trigger. Returns false if the scheduler is gone or backed up.
    pub fn trigger(&self, trigger: Trigger) -> bool {
        match self.tx.try_send(trigger) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Dropping {} trigger: {}", trigger, e);
                false
            }
        }
    }
}

#[derive(Debug)]
pub struct SchedulerTask {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl SchedulerTask {
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.join.await;
    }
}

/// Start the refresh loop: fetch and propagate once, then keep passes coming
/// at a period scaled to the catalog size and re-fetch every `fetch_interval`.
pub fn spawn<S, M>(
    pipeline: Arc<Pipeline<S, M>>,
    fetch_interval: Duration,
) -> (SchedulerHandle, SchedulerTask)
where
    S: CatalogSource,
    M: AnalyticalModel + 'static,
{
    let (tx, rx) = mpsc::channel(TRIGGER_QUEUE);
    let (stop_tx, stop_rx) = oneshot::channel();
    let join = tokio::spawn(run_loop(pipeline, fetch_interval, rx, stop_rx));

    (SchedulerHandle { tx }, SchedulerTask { stop_tx, join })
}

async fn run_loop<S, M>(
    pipeline: Arc<Pipeline<S, M>>,
    fetch_interval: Duration,
    mut rx: mpsc::Receiver<Trigger>,
    mut stop_rx: oneshot::Receiver<()>,
) where
    S: CatalogSource,
    M: AnalyticalModel + 'static,
{
    spawn_fetch_then_pass(&pipeline, FetchScope::Enabled, PassTrigger::Mount);

    let mut next_fetch = Instant::now() + fetch_interval;
    let mut next_tick = Instant::now() + refresh_period(pipeline.enabled_object_count());

    loop {
        tokio::select! {
            _ = sleep_until(next_tick) => {
                let now = Instant::now();
                if now >= next_fetch {
                    next_fetch = now + fetch_interval;
                    spawn_fetch_then_pass(&pipeline, FetchScope::Enabled, PassTrigger::CacheUpdated);
                } else {
                    // Picks up groups whose toggle fetch was dropped.
                    spawn_fetch_then_pass(&pipeline, FetchScope::Missing, PassTrigger::Timer);
                }
                let period = refresh_period(pipeline.enabled_object_count());
                log::trace!("Next pass in {:?}", period);
                next_tick = now + period;
            }
            trigger = rx.recv() => match trigger {
                Some(Trigger::GroupToggled) => {
                    spawn_fetch_then_pass(&pipeline, FetchScope::Missing, PassTrigger::GroupToggled);
                }
                Some(Trigger::Refresh) => {
                    next_fetch = Instant::now() + fetch_interval;
                    spawn_fetch_then_pass(&pipeline, FetchScope::Enabled, PassTrigger::Manual);
                }
                None => break,
            },
            _ = &mut stop_rx => break,
        }
    }

    log::info!("Refresh scheduler stopped");
}

fn spawn_fetch_then_pass<S, M>(
    pipeline: &Arc<Pipeline<S, M>>,
    scope: FetchScope,
    trigger: PassTrigger,
) where
    S: CatalogSource,
    M: AnalyticalModel + 'static,
{
    let pipeline = pipeline.clone();
    tokio::spawn(async move {
        pipeline.fetch(scope).await;
        pipeline.run_pass(trigger).await;
    });
}
