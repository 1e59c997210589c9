//! HTTP resource
//!
//! `http://api:8080/health` is ready once a GET returns a 2xx status.
//! Redirects are followed; any other status or a transport error counts as
//! not ready.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::context::WaitContext;
use crate::error::{Result, WaitError};

use super::{factory, Resource, ResourceFactory};

/// Upper bound on a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Ready when a GET on `url` succeeds with 2xx.
#[derive(Debug, Clone)]
pub struct HttpResource {
    url: Url,
    client: Client,
}

impl HttpResource {
    /// Build a resource for `url` with its own client.
    pub fn new(url: Url) -> Result<Self> {
        if url.host_str().is_none_or(str::is_empty) {
            return Err(WaitError::InvalidArgument(format!("'{}' has no host", url)));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WaitError::InvalidArgument(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Resource for HttpResource {
    async fn check(&self, _ctx: &WaitContext) -> Result<()> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| WaitError::not_ready(format!("GET {} failed: {}", self.url, e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(WaitError::not_ready(format!(
                "GET {} returned {}",
                self.url, status
            )))
        }
    }
}

/// Serves the `http` and `https` schemes.
pub fn module() -> (Vec<String>, ResourceFactory) {
    (
        vec!["http".to_string(), "https".to_string()],
        factory(|url| Ok(Box::new(HttpResource::new(url.clone())?))),
    )
}
