use crate::controller::PollingController;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Periodic poll task owned by the controller. Dropping it aborts the task.
#[derive(Debug)]
pub struct PollSchedule {
    handle: JoinHandle<()>,
}

impl PollSchedule {
    /// Starts ticking one `period` from now; the caller performs the immediate poll.
    pub fn start(controller: Weak<PollingController>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(controller) = controller.upgrade() else {
                    debug!("controller dropped, stopping poll schedule");
                    break;
                };
                debug!("scheduled poll");
                // Outcome is already recorded in the controller's request state.
                let _ = controller.poll().await;
            }
        });

        info!(period_secs = period.as_secs(), "poll schedule started");
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for PollSchedule {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("poll schedule cancelled");
    }
}
