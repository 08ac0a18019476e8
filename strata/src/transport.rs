//! Network access used by the layer to talk to WFS servers.

use async_trait::async_trait;
use log::info;

use crate::error::StrataError;

/// Loads text documents from urls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    async fn fetch_text(&self, url: &str) -> Result<String, StrataError>;
}

/// [`Transport`] implementation backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a new transport with its own connection pool.
    pub fn new() -> Result<Self, StrataError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("strata/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_text(&self, url: &str) -> Result<String, StrataError> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            info!(
                "Failed to load {url}: {status}, {:?}",
                response.text().await
            );
            return Err(StrataError::Transport(format!(
                "server answered with {status}"
            )));
        }

        Ok(response.text().await?)
    }
}
