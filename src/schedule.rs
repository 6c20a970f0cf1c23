//! Cancellable fixed-period callbacks on the tokio runtime

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Whether a repeating callback wants another tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Break,
}

/// Handle to a recurring task. Cancelling is idempotent and also happens on drop.
#[derive(Debug)]
pub struct ScheduledTask {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Run `tick` every `period`. The first call happens one full period after
    /// spawning; a tick that overruns delays the next one instead of bursting.
    pub fn every<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickFlow> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tick().await == TickFlow::Break {
                    debug!("⏹️ {} schedule finished", name);
                    break;
                }
            }
        });

        debug!("⏱️ {} schedule started ({:?})", name, period);
        Self {
            name,
            handle: Some(handle),
        }
    }

    /// True while the schedule has not been cancelled or run to completion
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Stop the schedule. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("⏹️ {} schedule cancelled", self.name);
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ticks_at_fixed_period() {
        tokio::time::pause();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let _task = ScheduledTask::every("test", Duration::from_millis(100), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                TickFlow::Continue
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        tokio::time::pause();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let mut task = ScheduledTask::every("test", Duration::from_millis(100), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                TickFlow::Continue
            }
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        task.cancel();
        task.cancel();
        assert!(!task.is_active());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_break_ends_schedule() {
        tokio::time::pause();
        let task = ScheduledTask::every("test", Duration::from_millis(100), || async { TickFlow::Break });
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!task.is_active());
    }
}
