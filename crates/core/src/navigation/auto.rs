//! Auto-advance timer handle.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::debug;

use super::Signal;

/// A running auto-advance timer.
///
/// Each timer carries the generation it was armed with; ticks from an older
/// generation are ignored by the controller, so a tick that was already
/// queued when the timer was cancelled never moves the index. Dropping the
/// handle cancels the task.
#[derive(Debug)]
pub struct AutoAdvance {
    generation: u64,
    task: JoinHandle<()>,
}

impl AutoAdvance {
    /// Spawn a timer sending [`Signal::AutoTick`] every `period`, first
    /// firing one full period from now. Must be called inside a tokio runtime.
    pub fn spawn(generation: u64, period: Duration, signals: mpsc::UnboundedSender<Signal>) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if signals.send(Signal::AutoTick { generation }).is_err() {
                    debug!(generation, "Signal channel closed; auto-advance timer exiting");
                    break;
                }
            }
        });
        Self { generation, task }
    }

    /// Generation this timer was armed with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the timer. Calling this more than once is harmless.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for AutoAdvance {
    fn drop(&mut self) {
        self.task.abort();
    }
}
