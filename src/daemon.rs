//! Fixed-interval poll loop
//!
//! The daemon runs one cycle, sleeps for the configured interval and repeats
//! until its stop signal flips. A failing cycle is logged and the loop carries
//! on; the interval is constant whatever the recent failures.

use tokio::sync::watch;
use tokio::time::Duration;

use crate::error::{BridgeError, Result};
use crate::logging::get_logger;

/// One unit of work repeated by the [`Daemon`]
#[async_trait::async_trait]
pub trait PollCycle: Send {
    async fn run_cycle(&mut self) -> Result<()>;
}

/// Counters reported when the loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaemonStats {
    pub cycles: u64,
    pub failures: u64,
}

/// Handle that stops a running [`Daemon`]
#[derive(Debug, Clone)]
pub struct StopHandle(watch::Sender<bool>);

impl StopHandle {
    /// Ask the loop to stop after the cycle in progress
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

/// Create a linked stop handle and the receiver [`Daemon::run`] watches
///
/// Dropping every handle also stops the loop.
pub fn stop_signal() -> (StopHandle, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(false);
    (StopHandle(tx), rx)
}

pub struct Daemon {
    interval: Duration,
    logger: crate::logging::StructuredLogger,
}

impl Daemon {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            logger: get_logger("daemon"),
        }
    }

    /// Run cycles until stopped; never returns early because a cycle failed
    pub async fn run<C: PollCycle>(
        &self,
        cycle: &mut C,
        mut stop: watch::Receiver<bool>,
    ) -> DaemonStats {
        self.logger.info(&format!(
            "Starting poll loop, interval {}s",
            self.interval.as_secs()
        ));
        let mut stats = DaemonStats::default();

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            stats.cycles = stats.cycles.saturating_add(1);
            if let Err(e) = cycle.run_cycle().await {
                stats.failures = stats.failures.saturating_add(1);
                self.report_failure(stats.cycles, &e);
            }

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        self.logger.info(&format!(
            "Poll loop stopped after {} cycles ({} failed)",
            stats.cycles, stats.failures
        ));
        stats
    }

    fn report_failure(&self, cycle: u64, e: &BridgeError) {
        let mut message = format!("poll error in cycle {cycle} ({}): {e}", e.kind());
        if let Some(hint) = failure_hint(e) {
            message.push_str("; ");
            message.push_str(hint);
        }
        self.logger.error(&message);
    }
}

/// Operator hint appended to a failed cycle's log line
fn failure_hint(e: &BridgeError) -> Option<&'static str> {
    if e.is_auth() {
        Some("check SOLTARO_USERNAME and SOLTARO_PASSWORD")
    } else if e.is_upstream() {
        Some("Qendercore returned no usable data, retrying next cycle")
    } else {
        None
    }
}
