use crate::backend::{normalize_address, StatsSource};
use crate::clock::{format_timestamp, Clock};
use crate::errors::PollError;
use crate::models::{CheckResponse, HistoryEntry, RequestState, StatsSnapshot, TrackerView};
use crate::notifier::{Notifier, Permission};
use crate::scheduler::PollSchedule;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Account Update";

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub poll_interval: Duration,
    pub notification_title: String,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            notification_title: DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Updated { changed: bool },
    /// Another poll was already in flight; nothing was requested.
    Skipped,
    /// The backend was reconfigured while this poll ran; its result was discarded.
    Superseded,
}

#[derive(Debug)]
struct ControllerState {
    backend_url: Option<String>,
    setup_visible: bool,
    request: RequestState,
    stats: StatsSnapshot,
    history: VecDeque<HistoryEntry>,
    schedule: Option<PollSchedule>,
    /// Bumped by every `configure`; results from older generations are dropped.
    generation: u64,
    in_flight: Option<u64>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            backend_url: None,
            setup_visible: true,
            request: RequestState::Idle,
            stats: StatsSnapshot::placeholder(),
            history: VecDeque::new(),
            schedule: None,
            generation: 0,
            in_flight: None,
        }
    }
}

/// Polls the stats backend, keeps the change history and raises notifications.
///
/// Timer ticks and manual refreshes both go through [`PollingController::poll`];
/// at most one request per configuration is in flight at a time.
pub struct PollingController {
    source: Arc<dyn StatsSource>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    settings: ControllerSettings,
    state: Mutex<ControllerState>,
    permission_requested: AtomicBool,
}

impl PollingController {
    pub fn new(
        source: Arc<dyn StatsSource>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        settings: ControllerSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            source,
            notifier,
            clock,
            settings,
            state: Mutex::new(ControllerState::default()),
            permission_requested: AtomicBool::new(false),
        })
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Asks for notification permission once, if the host has not decided yet.
    pub async fn start(&self) {
        if self.permission_requested.swap(true, Ordering::AcqRel) {
            return;
        }
        if self.notifier.permission() == Permission::Default {
            let permission = self.notifier.request_permission().await;
            debug!(?permission, "notification permission requested");
        }
    }

    /// Stores the backend address, hides setup, polls immediately and arms the schedule.
    pub async fn configure(self: &Arc<Self>, address: &str) -> Result<PollOutcome, PollError> {
        let address = normalize_address(address);
        if address.is_empty() {
            return Err(PollError::ConfigurationMissing);
        }

        let previous = {
            let mut state = self.lock_state();
            state.backend_url = Some(address.to_string());
            state.setup_visible = false;
            state.generation = state.generation.wrapping_add(1);
            state.schedule.take()
        };
        drop(previous);
        info!(backend = %address, "backend configured");

        let outcome = self.poll().await;

        let mut state = self.lock_state();
        if !state.setup_visible && state.schedule.is_none() {
            state.schedule = Some(PollSchedule::start(
                Arc::downgrade(self),
                self.settings.poll_interval,
            ));
        }

        outcome
    }

    /// Returns to the setup step and suspends the periodic schedule.
    pub fn show_setup(&self) {
        let schedule = {
            let mut state = self.lock_state();
            state.setup_visible = true;
            state.schedule.take()
        };
        if schedule.is_some() {
            info!("setup reopened, poll schedule suspended");
        }
    }

    /// Cancels the periodic schedule.
    pub fn shutdown(&self) {
        let schedule = self.lock_state().schedule.take();
        drop(schedule);
    }

    pub fn is_scheduled(&self) -> bool {
        self.lock_state()
            .schedule
            .as_ref()
            .is_some_and(PollSchedule::is_running)
    }

    pub fn view(&self) -> TrackerView {
        let state = self.lock_state();
        TrackerView {
            backend_url: state.backend_url.clone(),
            setup_visible: state.setup_visible,
            request: state.request.clone(),
            stats: state.stats.clone(),
            history: state.history.iter().cloned().collect(),
            poll_interval_secs: self.settings.poll_interval.as_secs(),
        }
    }

    pub async fn poll(&self) -> Result<PollOutcome, PollError> {
        let (address, generation) = {
            let mut state = self.lock_state();
            let Some(address) = state.backend_url.clone() else {
                state.request = RequestState::Errored {
                    message: PollError::ConfigurationMissing.user_message().to_string(),
                };
                warn!("poll requested before a backend address was configured");
                return Err(PollError::ConfigurationMissing);
            };
            if state.in_flight == Some(state.generation) {
                debug!("poll already in flight, skipping");
                return Ok(PollOutcome::Skipped);
            }
            state.in_flight = Some(state.generation);
            state.request = RequestState::Loading;
            (address, state.generation)
        };
        let _in_flight = InFlight {
            controller: self,
            generation,
        };

        match self.source.check(&address).await {
            Ok(response) => Ok(self.apply(response, generation).await),
            Err(err) => {
                let mut state = self.lock_state();
                if state.generation != generation {
                    debug!(backend = %address, error = %err, "discarding failure from previous backend");
                    return Ok(PollOutcome::Superseded);
                }
                error!(backend = %address, error = %err, "poll failed");
                state.request = RequestState::Errored {
                    message: err.user_message().to_string(),
                };
                Err(err)
            }
        }
    }

    async fn apply(&self, response: CheckResponse, generation: u64) -> PollOutcome {
        let CheckResponse {
            changed,
            ai_summary,
            stats,
        } = response;

        {
            let mut state = self.lock_state();
            if state.generation != generation {
                debug!("discarding stats from previous backend");
                return PollOutcome::Superseded;
            }
            if changed {
                state.history.push_front(HistoryEntry {
                    timestamp: format_timestamp(self.clock.now()),
                    summary: ai_summary.clone(),
                });
            }
            state.stats = stats;
            state.request = RequestState::Idle;
        }

        if changed {
            info!(summary = %ai_summary, "change detected");
            if self.notifier.permission() == Permission::Granted {
                self.notifier
                    .notify(&self.settings.notification_title, &ai_summary)
                    .await;
            }
        } else {
            debug!("no changes reported");
        }

        PollOutcome::Updated { changed }
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight flag and any leftover loading state on every exit path,
/// including when the poll future is dropped mid-request.
struct InFlight<'a> {
    controller: &'a PollingController,
    generation: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.controller.lock_state();
        // A newer configuration owns the slot once it has started its own poll.
        if state.in_flight != Some(self.generation) {
            return;
        }
        state.in_flight = None;
        if state.request.is_loading() {
            state.request = RequestState::Idle;
        }
    }
}
