#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod aggregator;
mod error;
pub mod executor;
pub mod generator;
mod handle;
pub(crate) mod pacer;

pub use aggregator::aggregate;
pub use error::EngineError;
pub use executor::{Executor, HttpExecutor};
pub use generator::{LoadGenerator, Run};
pub use handle::RunHandle;
pub use steadyload_core::{
    unix_timestamp, EngineConfig, FailureReason, Outcome, RunPlan, RunReport, RunRequest,
    RunState, RunStatus, ValidationError,
};

pub mod prelude {
    pub use crate::executor::{Executor, HttpExecutor};
    pub use crate::generator::LoadGenerator;
    pub use crate::EngineError;
    pub use steadyload_core::{EngineConfig, Outcome, RunReport, RunRequest};
}
