use crate::EngineError;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::Duration;
use steadyload_core::{RunPlan, RunRequest, RunState, RunStatus};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Shared state for a single run.
///
/// Created when a run claims the [`LoadGenerator`](crate::LoadGenerator) slot. Each handle owns
/// its own cancellation token, so cancelling one run can never leak into the next.
#[derive(Debug)]
pub struct RunHandle {
    id: Uuid,
    request: RunRequest,
    plan: RunPlan,
    state: AtomicU8,
    cancel: CancellationToken,
    dispatched: AtomicU64,
    completed: AtomicU64,
    created: Instant,
}

impl RunHandle {
    pub(crate) fn new(request: RunRequest, plan: RunPlan) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            plan,
            state: AtomicU8::new(RunState::Idle as u8),
            cancel: CancellationToken::new(),
            dispatched: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            created: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn request(&self) -> &RunRequest {
        &self.request
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    pub fn state(&self) -> RunState {
        RunState::from(self.state.load(Ordering::Acquire))
    }

    /// Stops further dispatches. Requests already dispatched still complete.
    ///
    /// Repeated calls are no-ops while the run has not completed.
    pub fn cancel(&self) -> Result<(), EngineError> {
        if self.state() == RunState::Completed {
            return Err(EngineError::NoRunActive);
        }
        self.cancel.cancel();
        Ok(())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.created.elapsed()
    }

    pub fn status(&self) -> RunStatus {
        RunStatus {
            id: self.id.to_string(),
            url: self.request.target_url.clone(),
            qps: self.request.rate_per_second,
            duration: self.request.duration_seconds,
            state: self.state(),
            planned: self.plan.total_requests(),
            dispatched: self.dispatched(),
            completed: self.completed(),
            cancelled: self.is_cancelled(),
            elapsed_seconds: self.elapsed().as_secs_f64(),
        }
    }

    pub(crate) fn set_state(&self, state: RunState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completion(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> RunHandle {
        let request = RunRequest::new("http://localhost", 5, 2);
        let plan = request.plan().unwrap();
        RunHandle::new(request, plan)
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent_until_completed() {
        let handle = handle();
        handle.set_state(RunState::Active);
        assert!(handle.cancel().is_ok());
        assert!(handle.cancel().is_ok());
        assert!(handle.is_cancelled());

        handle.set_state(RunState::Completed);
        assert!(matches!(handle.cancel(), Err(EngineError::NoRunActive)));
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let handle = handle();
        handle.set_state(RunState::Draining);
        handle.record_dispatch();
        handle.record_dispatch();
        handle.record_completion();

        let status = handle.status();
        assert_eq!(status.id, handle.id().to_string());
        assert_eq!(status.state, RunState::Draining);
        assert_eq!(status.planned, 10);
        assert_eq!(status.dispatched, 2);
        assert_eq!(status.completed, 1);
        assert!(!status.cancelled);
    }
}
