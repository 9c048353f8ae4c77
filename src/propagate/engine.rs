use chrono::{DateTime, Utc};

use crate::fusion::ResolvedObject;
use crate::propagate::adapter::{AnalyticalModel, PropagatorAdapter, Sgp4Model};
use crate::propagate::types::PropagatedPosition;

pub const DEFAULT_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    /// 1-based index of the chunk just finished.
    pub chunk: usize,
    pub chunks: usize,
    pub processed: usize,
    pub total: usize,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub positions: Vec<PropagatedPosition>,
    pub rejected: usize,
}

/// Propagates resolved objects in fixed-size chunks, yielding to the runtime
/// between chunks.
pub struct BatchPropagator<M = Sgp4Model> {
    adapter: PropagatorAdapter<M>,
    chunk_size: usize,
}

impl<M: AnalyticalModel> BatchPropagator<M> {
    pub fn new(model: M, chunk_size: usize) -> Self {
        Self {
            adapter: PropagatorAdapter::new(model),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Propagate every object to `at`, calling `on_chunk` after each chunk.
    pub async fn propagate<F>(
        &self,
        objects: &[ResolvedObject<'_>],
        at: DateTime<Utc>,
        mut on_chunk: F,
    ) -> BatchOutcome
    where
        F: FnMut(ChunkProgress),
    {
        let total = objects.len();
        let chunks = total.div_ceil(self.chunk_size);
        let mut outcome = BatchOutcome {
            positions: Vec::with_capacity(total),
            rejected: 0,
        };
        let mut processed = 0;

        for (index, chunk) in objects.chunks(self.chunk_size).enumerate() {
            if index > 0 {
                tokio::task::yield_now().await;
            }

            for object in chunk {
                match self.adapter.propagate_one(object.element_set, at) {
                    Ok(state) => outcome
                        .positions
                        .push(PropagatedPosition::new(object, state, at)),
                    Err(e) => {
                        log::debug!(
                            "Omitting NORAD {} ({}): {}",
                            object.element_set.catalog_id,
                            object.group.id,
                            e
                        );
                        outcome.rejected += 1;
                    }
                }
            }

            processed += chunk.len();
            on_chunk(ChunkProgress {
                chunk: index + 1,
                chunks,
                processed,
                total,
            });
        }

        outcome
    }
}
