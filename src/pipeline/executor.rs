//! Sequential, fail-fast step execution.

use crate::error::ReleaseError;
use std::fmt;
use std::future::Future;

/// Executes one kind of step descriptor
pub trait StepHandler<S> {
    /// Run a single step to completion
    fn run_step(&mut self, step: &S) -> impl Future<Output = crate::error::Result<()>>;
}

/// A pipeline stopped at a failing step
#[derive(Debug)]
pub struct StepFailure<S> {
    /// Step that failed
    pub step: S,
    /// Steps that completed before it, in order
    pub completed: Vec<S>,
    /// Error returned by the step, unchanged
    pub error: ReleaseError,
}

impl<S: fmt::Display> fmt::Display for StepFailure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' failed: {}", self.step, self.error)
    }
}

/// Run `steps` in order, stopping at the first failure.
///
/// Each step is awaited before the next one starts. On success the completed
/// steps are returned, which is all of them.
pub async fn run_pipeline<S, H>(steps: &[S], handler: &mut H) -> Result<Vec<S>, StepFailure<S>>
where
    S: Clone + fmt::Display,
    H: StepHandler<S>,
{
    let mut completed = Vec::with_capacity(steps.len());
    for step in steps {
        log::debug!("Starting step: {}", step);
        match handler.run_step(step).await {
            Ok(()) => {
                log::debug!("Finished step: {}", step);
                completed.push(step.clone());
            }
            Err(error) => {
                log::debug!("Step '{}' failed: {}", step, error);
                return Err(StepFailure {
                    step: step.clone(),
                    completed,
                    error,
                });
            }
        }
    }
    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    struct Recorder {
        ran: Vec<u32>,
        fail_on: Option<u32>,
    }

    impl StepHandler<u32> for Recorder {
        async fn run_step(&mut self, step: &u32) -> Result<()> {
            self.ran.push(*step);
            if self.fail_on == Some(*step) {
                return Err(anyhow::anyhow!("boom at {}", step).into());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_runs_all_steps_in_order() {
        let mut handler = Recorder {
            ran: Vec::new(),
            fail_on: None,
        };
        let completed = run_pipeline(&[1, 2, 3], &mut handler).await.unwrap();
        assert_eq!(completed, vec![1, 2, 3]);
        assert_eq!(handler.ran, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let mut handler = Recorder {
            ran: Vec::new(),
            fail_on: Some(2),
        };
        let failure = run_pipeline(&[1, 2, 3], &mut handler).await.unwrap_err();
        assert_eq!(failure.step, 2);
        assert_eq!(failure.completed, vec![1]);
        assert_eq!(failure.error.to_string(), "boom at 2");
        assert_eq!(handler.ran, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_pipeline_succeeds() {
        let mut handler = Recorder {
            ran: Vec::new(),
            fail_on: None,
        };
        let completed = run_pipeline::<u32, _>(&[], &mut handler).await.unwrap();
        assert!(completed.is_empty());
    }
}
