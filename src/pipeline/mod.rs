//! Step pipelines.
//!
//! A run is a vector of step descriptors built by [`release_plan`],
//! [`finish_plan`] or [`rollback_plan`] and executed by [`run_pipeline`]
//! against a [`StepHandler`].

mod executor;
mod steps;

pub use executor::{StepFailure, StepHandler, run_pipeline};
pub use steps::{
    HookStage, PlanContext, ReleaseStep, RollbackStep, finish_plan, release_plan, rollback_plan,
};
