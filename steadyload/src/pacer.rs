use std::fmt;
use std::time::Duration;
use steadyload_core::RunPlan;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Permission to dispatch one request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tick {
    pub seq: u64,
    /// When the tick was scheduled to fire.
    pub at: Instant,
}

/// Releases `rate × duration` ticks spaced `1/rate` apart.
///
/// Ticks sit on a fixed grid anchored at the first tick, so time spent by the caller between
/// ticks is absorbed by a shorter wait, and a tick that is already late fires immediately.
pub(crate) struct Pacer {
    interval: Interval,
    period: Duration,
    planned: u64,
    emitted: u64,
}

impl Pacer {
    pub fn new(plan: &RunPlan) -> Self {
        let period = plan.interval();
        let mut interval = interval(period);
        // NOTE: Burst keeps the long-run rate on target when the timer is coarser than the period.
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        Self {
            interval,
            period,
            planned: plan.total_requests(),
            emitted: 0,
        }
    }

    /// Waits for the next tick. Returns `None` once the plan is exhausted or `cancel` fires.
    pub async fn tick(&mut self, cancel: &CancellationToken) -> Option<Tick> {
        if self.emitted >= self.planned || cancel.is_cancelled() {
            return None;
        }

        let at = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Pacer cancelled after {} of {} ticks.", self.emitted, self.planned);
                return None;
            }
            at = self.interval.tick() => at,
        };

        let seq = self.emitted;
        self.emitted += 1;
        Some(Tick { seq, at })
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn planned(&self) -> u64 {
        self.planned
    }
}

impl fmt::Display for Pacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "{}/{} ticks every {}",
            self.emitted(),
            self.planned(),
            humantime::format_duration(self.period)
        )
    }
}
