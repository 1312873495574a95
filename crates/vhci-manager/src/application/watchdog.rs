//! Liveness watchdog.
//!
//! While a device is attached a background task wakes every
//! [`WATCHDOG_PERIOD`].  The tick callback decides what to do (ping the
//! agent, or end the session when the transport is gone) and whether the
//! watchdog keeps running.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Time between two liveness checks.  The first check happens one full
/// period after the watchdog starts.
pub const WATCHDOG_PERIOD: Duration = Duration::from_millis(5000);

/// What the watchdog does after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

/// Handle to a running watchdog task.  Dropping it aborts the task.
#[derive(Debug)]
pub struct Watchdog {
    task: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Spawns the watchdog.  `on_tick` runs once per period until it returns
    /// [`TickOutcome::Stop`] or the watchdog is cancelled.
    pub fn start<F, Fut>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickOutcome> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if on_tick().await == TickOutcome::Stop {
                    break;
                }
            }
        });
        Self { task: Some(task) }
    }

    /// Aborts the task and returns its join handle so the caller can wait for
    /// it to finish once it no longer holds any lock the task may need.
    pub fn cancel(mut self) -> Option<JoinHandle<()>> {
        let task = self.task.take()?;
        task.abort();
        Some(task)
    }

    /// Lets the task run to completion on its own.  Used when the watchdog
    /// ends the session from inside its own tick.
    pub fn release(mut self) {
        self.task.take();
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
