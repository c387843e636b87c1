use crate::errors::PollError;
use crate::models::CheckResponse;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Remote service that reports account stats and whether they changed.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn check(&self, address: &str) -> Result<CheckResponse, PollError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
}

impl HttpBackend {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl StatsSource for HttpBackend {
    async fn check(&self, address: &str) -> Result<CheckResponse, PollError> {
        let url = check_url(address);
        debug!(%url, "requesting backend check");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Backend {
                status: status.as_u16(),
            });
        }

        let body = response.json::<CheckResponse>().await?;
        Ok(body)
    }
}

pub fn check_url(address: &str) -> String {
    format!("{}/check", normalize_address(address))
}

pub fn normalize_address(address: &str) -> &str {
    address.trim().trim_end_matches('/')
}
