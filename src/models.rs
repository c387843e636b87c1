use serde::{Deserialize, Serialize};
use std::fmt;

/// A stat counter as reported by the backend. Usually a number, but the
/// backend substitutes text such as `"Error"` when it cannot scrape the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Count {
    Number(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Count::Number(value) => write!(f, "{value}"),
            Count::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.0}")
            }
            Count::Float(value) => write!(f, "{value}"),
            Count::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    Number(i64),
    Text(String),
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Number(value) => write!(f, "{value}"),
            PostId::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: PostId,
    pub image_url: String,
    pub likes: serde_json::Number,
    pub comments: serde_json::Number,
    #[serde(default)]
    pub caption: Option<String>,
    pub timestamp: String,
}

/// Full stats payload from one successful check. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub posts: Count,
    pub followers: Count,
    pub following: Count,
    pub last_checked: String,
    #[serde(default)]
    pub recent_posts: Vec<PostRecord>,
}

pub const LOADING_PLACEHOLDER: &str = "Loading...";

impl StatsSnapshot {
    pub fn placeholder() -> Self {
        Self {
            posts: Count::Text(LOADING_PLACEHOLDER.to_string()),
            followers: Count::Text(LOADING_PLACEHOLDER.to_string()),
            following: Count::Text(LOADING_PLACEHOLDER.to_string()),
            last_checked: "Never".to_string(),
            recent_posts: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(&self.posts, Count::Text(text) if text == LOADING_PLACEHOLDER)
    }
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Body returned by `GET {backend}/check`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub changed: bool,
    pub ai_summary: String,
    pub stats: StatsSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub summary: String,
}

impl HistoryEntry {
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.timestamp, self.summary)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Errored {
        message: String,
    },
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RequestState::Errored { message } => Some(message),
            _ => None,
        }
    }
}

/// Read-only copy of the tracker state handed to the dashboard and JSON API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerView {
    pub backend_url: Option<String>,
    pub setup_visible: bool,
    pub request: RequestState,
    pub stats: StatsSnapshot,
    pub history: Vec<HistoryEntry>,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct ConfigureRequest {
    pub backend_url: String,
}
