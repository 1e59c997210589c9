//! TCP resource
//!
//! `tcp://db:5432` is ready once a TCP connection to `db:5432` succeeds.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use url::Url;

use crate::context::WaitContext;
use crate::error::{Result, WaitError};

use super::{factory, Resource, ResourceFactory};

/// Upper bound on a single connection attempt.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Ready when `host:port` accepts a connection.
#[derive(Debug, Clone)]
pub struct TcpResource {
    host: String,
    port: u16,
}

impl TcpResource {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Build from a `tcp://host:port` URL. Host and port are both required.
    pub fn from_url(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| WaitError::InvalidArgument(format!("'{}' has no host", url)))?;
        let port = url
            .port()
            .ok_or_else(|| WaitError::InvalidArgument(format!("'{}' has no port", url)))?;
        // IPv6 hosts come back bracketed from host_str().
        let host = host.trim_start_matches('[').trim_end_matches(']');
        Ok(Self::new(host, port))
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl Resource for TcpResource {
    async fn check(&self, _ctx: &WaitContext) -> Result<()> {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(CONNECT_TIMEOUT, connect).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(WaitError::not_ready(format!(
                "cannot connect to {}: {}",
                self.address(),
                e
            ))),
            Err(_) => Err(WaitError::not_ready(format!(
                "connection to {} timed out after {}s",
                self.address(),
                CONNECT_TIMEOUT.as_secs()
            ))),
        }
    }
}

/// Serves the `tcp` scheme.
pub fn module() -> (Vec<String>, ResourceFactory) {
    (
        vec!["tcp".to_string()],
        factory(|url| Ok(Box::new(TcpResource::from_url(url)?))),
    )
}
