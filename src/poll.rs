//! Poll driver - repeated reads on a fixed cadence.
//!
//! Each tick reads the area, decodes it and hands a [`Sample`] to the
//! caller's sink. The loop ends when the plan's count is reached, when any
//! step fails, or when the [`CancelFlag`] is raised. Cancellation is
//! cooperative: it is observed before a read and interrupts the sleep, but
//! never aborts a read in flight.

use crate::codec;
use crate::engine;
use crate::error::{PollError, PollResult};
use crate::transport::Session;
use crate::types::{AreaDescriptor, FormatSpec, Sample};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info};

/// Cadence and length of a poll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPlan {
    interval: Duration,
    count: u64,
}

impl PollPlan {
    /// Create a plan. `count == 0` polls until cancelled or failed.
    pub fn new(interval: Duration, count: u64) -> PollResult<Self> {
        if interval.is_zero() {
            return Err(PollError::InvalidPlan(
                "interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self { interval, count })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether the run never stops on its own.
    pub fn is_unbounded(&self) -> bool {
        self.count == 0
    }

    fn is_complete(&self, emitted: u64) -> bool {
        !self.is_unbounded() && emitted >= self.count
    }
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cloneable cooperative cancellation token.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    state: Arc<CancelState>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and wake anyone waiting on [`CancelFlag::cancelled`].
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once the flag is raised.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// How a poll run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The plan's count was reached.
    Completed(u64),
    /// The cancel flag was raised; carries the number of samples emitted.
    Cancelled(u64),
}

impl PollOutcome {
    /// Number of samples emitted.
    pub fn samples(self) -> u64 {
        match self {
            Self::Completed(n) | Self::Cancelled(n) => n,
        }
    }
}

/// Run the poll loop until the plan completes, a step fails, or `cancel`
/// is raised.
///
/// Samples passed to `sink` before a failure stay emitted; the failure is
/// returned as-is.
pub async fn run_poll<F>(
    session: &mut (dyn Session + '_),
    area: &AreaDescriptor,
    format: FormatSpec,
    plan: &PollPlan,
    cancel: &CancelFlag,
    mut sink: F,
) -> PollResult<PollOutcome>
where
    F: FnMut(&Sample) -> io::Result<()>,
{
    let mut emitted = 0u64;
    debug!(%area, %format, interval = ?plan.interval(), count = plan.count(), "poll started");

    loop {
        if cancel.is_cancelled() {
            info!(samples = emitted, "poll cancelled");
            return Ok(PollOutcome::Cancelled(emitted));
        }

        let bytes = engine::read_area(&mut *session, area).await?;
        let value = codec::decode(&bytes, format)?;
        sink(&Sample::new(emitted + 1, area, format, value))?;
        emitted += 1;

        if plan.is_complete(emitted) {
            debug!(samples = emitted, "poll completed");
            return Ok(PollOutcome::Completed(emitted));
        }

        tokio::select! {
            _ = tokio::time::sleep(plan.interval()) => {}
            _ = cancel.cancelled() => {}
        }
    }
}
