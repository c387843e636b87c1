use crate::controller::PollingController;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<PollingController>,
}

impl AppState {
    pub fn new(controller: Arc<PollingController>) -> Self {
        Self { controller }
    }
}
