pub mod app;
pub mod backend;
pub mod clock;
pub mod config;
pub mod controller;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod scheduler;
pub mod state;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use controller::{ControllerSettings, PollOutcome, PollingController};
pub use state::AppState;
