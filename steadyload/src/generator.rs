//! Run lifecycle and dispatch
use crate::aggregator::aggregate;
use crate::executor::Executor;
use crate::handle::RunHandle;
use crate::pacer::{Pacer, Tick};
use crate::EngineError;
use metrics_util::AtomicBucket;
use std::sync::{Arc, Mutex};
use steadyload_core::{
    unix_timestamp, EngineConfig, FailureReason, Outcome, RunReport, RunRequest, RunState,
};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

type RunSlot = Arc<Mutex<Option<Arc<RunHandle>>>>;

/// Fixed-rate load generator.
///
/// Owns a single run slot: at most one run is active per generator. Independent generators share
/// nothing.
pub struct LoadGenerator<E> {
    executor: Arc<E>,
    config: EngineConfig,
    slot: RunSlot,
}

impl<E> LoadGenerator<E>
where
    E: Executor + 'static,
{
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, EngineConfig::default())
    }

    pub fn with_config(executor: E, config: EngineConfig) -> Self {
        Self {
            executor: Arc::new(executor),
            config,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validates the request and claims the run slot.
    ///
    /// Nothing is dispatched until [`Run::execute`] is awaited. Dropping the returned [`Run`]
    /// releases the slot.
    pub fn begin(&self, request: RunRequest) -> Result<Run<E>, EngineError> {
        let plan = request.plan()?;

        let mut slot = self.slot.lock()?;
        if let Some(active) = slot.as_ref() {
            warn!("Rejecting run for {}; run {} is in progress.", request.target_url, active.id());
            return Err(EngineError::RunInProgress(active.id()));
        }

        let handle = Arc::new(RunHandle::new(request, plan));
        *slot = Some(handle.clone());

        Ok(Run {
            in_flight_limit: self.config.in_flight_limit(&plan),
            executor: self.executor.clone(),
            release: SlotRelease {
                slot: self.slot.clone(),
                id: handle.id(),
            },
            handle,
        })
    }

    /// Runs a load test to completion.
    pub async fn start_run(&self, request: RunRequest) -> Result<RunReport, EngineError> {
        Ok(self.begin(request)?.execute().await)
    }

    /// Stops the active run from dispatching further requests.
    pub fn cancel_run(&self) -> Result<(), EngineError> {
        let handle = self.active_run()?.ok_or(EngineError::NoRunActive)?;
        info!("Cancelling run {}.", handle.id());
        handle.cancel()
    }

    pub fn active_run(&self) -> Result<Option<Arc<RunHandle>>, EngineError> {
        Ok(self.slot.lock()?.clone())
    }
}

/// A run holding the slot of its [`LoadGenerator`].
pub struct Run<E> {
    handle: Arc<RunHandle>,
    executor: Arc<E>,
    in_flight_limit: usize,
    release: SlotRelease,
}

impl<E> Run<E>
where
    E: Executor + 'static,
{
    pub fn handle(&self) -> Arc<RunHandle> {
        self.handle.clone()
    }

    /// Paces, dispatches, drains, and aggregates.
    ///
    /// Each tick spawns its own request task, so slow responses never hold up the pacing loop.
    /// Every dispatched request contributes exactly one outcome to the report.
    #[instrument(name = "run", skip_all, fields(id = %self.handle.id(), url = %self.handle.request().target_url))]
    pub async fn execute(self) -> RunReport {
        let Run {
            handle,
            executor,
            in_flight_limit,
            release,
        } = self;
        let plan = *handle.plan();
        info!(
            "Running {} req/s for {:?}, at most {} in flight.",
            plan.rate,
            plan.duration(),
            in_flight_limit
        );

        let target: Arc<str> = Arc::from(handle.request().target_url.as_str());
        let outcomes = Arc::new(AtomicBucket::new());
        let permits = Arc::new(Semaphore::new(in_flight_limit));

        handle.set_state(RunState::Active);
        let mut pacer = Pacer::new(&plan);
        // NOTE: This loop is time-sensitive. Nothing here may wait on request completion.
        while let Some(tick) = pacer.tick(handle.cancellation()).await {
            let Some(permit) = acquire(&permits, &handle).await else {
                break;
            };
            tokio::spawn(
                send(
                    executor.clone(),
                    target.clone(),
                    tick,
                    outcomes.clone(),
                    handle.clone(),
                    permit,
                )
                .in_current_span(),
            );
            handle.record_dispatch();
        }

        if handle.is_cancelled() {
            info!("Run cancelled at {pacer}. Draining.");
        } else {
            debug!("Pacing complete at {pacer}. Draining.");
        }
        handle.set_state(RunState::Draining);

        // Every request task holds a permit until its outcome is recorded.
        let all = u32::try_from(in_flight_limit).unwrap_or(u32::MAX);
        if let Err(err) = permits.acquire_many(all).await {
            error!("Unable to drain in-flight requests: {err}");
        }

        let mut outcomes = outcomes.data();
        let lost = handle.dispatched().saturating_sub(outcomes.len() as u64);
        if lost > 0 {
            error!("{lost} dispatched requests produced no outcome; counting them as failures.");
            outcomes.extend((0..lost).map(|_| Outcome::failure(FailureReason::Aborted)));
        }

        let report = aggregate(
            handle.request(),
            &outcomes,
            handle.elapsed(),
            unix_timestamp(),
        );
        handle.set_state(RunState::Completed);
        drop(release);

        info!("Run complete: {report}");
        report
    }
}

/// Takes an in-flight slot, waiting only when the configured cap is reached.
async fn acquire(permits: &Arc<Semaphore>, handle: &RunHandle) -> Option<OwnedSemaphorePermit> {
    if let Ok(permit) = permits.clone().try_acquire_owned() {
        return Some(permit);
    }

    warn!("In-flight limit reached; dispatch is falling behind schedule.");
    tokio::select! {
        biased;
        _ = handle.cancellation().cancelled() => None,
        permit = permits.clone().acquire_owned() => permit.ok(),
    }
}

async fn send<E>(
    executor: Arc<E>,
    target: Arc<str>,
    tick: Tick,
    outcomes: Arc<AtomicBucket<Outcome>>,
    handle: Arc<RunHandle>,
    _permit: OwnedSemaphorePermit,
) where
    E: Executor,
{
    trace!(seq = tick.seq, "Sending, {:?} behind schedule.", tick.at.elapsed());
    let outcome = executor.execute(&target).await;

    if let Outcome::Failure { reason } = &outcome {
        debug!(seq = tick.seq, "Request failed: {reason}");
    }
    #[cfg(feature = "metrics")]
    record_metrics(&outcome);

    outcomes.push(outcome);
    handle.record_completion();
}

#[cfg(feature = "metrics")]
fn record_metrics(outcome: &Outcome) {
    match outcome {
        Outcome::Success { latency, .. } => {
            metrics::counter!("steadyload_request_success").increment(1);
            metrics::histogram!("steadyload_request_latency").record(latency.as_secs_f64());
        }
        Outcome::Failure { .. } => {
            metrics::counter!("steadyload_request_error").increment(1);
        }
    }
}

/// Frees the run slot when the run finishes or is dropped.
struct SlotRelease {
    slot: RunSlot,
    id: Uuid,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        match self.slot.lock() {
            Ok(mut slot) => {
                if slot.as_ref().is_some_and(|handle| handle.id() == self.id) {
                    *slot = None;
                }
            }
            Err(_) => error!("Run slot mutex is poisoned; run {} not released.", self.id),
        }
    }
}
