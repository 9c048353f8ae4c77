mod adapter;
mod engine;
mod frames;
mod types;

pub use adapter::{AnalyticalModel, RawState, Rejection, Sgp4Model};
pub use engine::{BatchPropagator, DEFAULT_CHUNK_SIZE};
pub use types::PropagatedPosition;
