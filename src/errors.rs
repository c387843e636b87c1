use axum::http::StatusCode;
use thiserror::Error;

pub const MISSING_CONFIGURATION_MESSAGE: &str = "Please enter your backend URL first";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch data. Is backend running?";

/// Failure of a single poll. None of these are fatal to the controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("no backend address configured")]
    ConfigurationMissing,

    #[error("backend returned HTTP status {status}")]
    Backend { status: u16 },

    #[error("network error: {0}")]
    Network(String),
}

impl PollError {
    pub fn user_message(&self) -> &'static str {
        match self {
            PollError::ConfigurationMissing => MISSING_CONFIGURATION_MESSAGE,
            PollError::Backend { .. } | PollError::Network(_) => FETCH_FAILED_MESSAGE,
        }
    }
}

impl From<reqwest::Error> for PollError {
    fn from(err: reqwest::Error) -> Self {
        PollError::Network(err.to_string())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<PollError> for AppError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::ConfigurationMissing => Self::bad_request(err.user_message()),
            other => Self {
                status: StatusCode::BAD_GATEWAY,
                message: other.to_string(),
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_status_failures_share_one_message() {
        assert_eq!(
            PollError::Backend { status: 503 }.user_message(),
            PollError::Network("timed out".into()).user_message()
        );
        assert_eq!(
            PollError::ConfigurationMissing.user_message(),
            MISSING_CONFIGURATION_MESSAGE
        );
    }

    #[test]
    fn missing_configuration_maps_to_bad_request() {
        let err = AppError::from(PollError::ConfigurationMissing);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
