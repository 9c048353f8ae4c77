mod period;
mod pipeline;
mod scheduler;

pub use pipeline::{
    FetchScope, PassTrigger, Pipeline, PipelineError, PipelineMode, PipelineStatus, PublishedSet,
};
pub use scheduler::{spawn, SchedulerHandle, Trigger};
