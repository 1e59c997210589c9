//! File resource
//!
//! `file:///var/run/app.pid` is ready once the path exists. A host segment is
//! treated as the first path component, so `file://./config.json` points at a
//! path relative to the working directory.

use std::path::PathBuf;

use async_trait::async_trait;
use url::Url;

use crate::context::WaitContext;
use crate::error::{Result, WaitError};

use super::{factory, Resource, ResourceFactory};

/// Ready when `path` exists.
#[derive(Debug, Clone)]
pub struct FileResource {
    path: PathBuf,
}

impl FileResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Build from a `file://` URL.
    pub fn from_url(url: &Url) -> Result<Self> {
        let has_host = url.host_str().is_some_and(|h| !h.is_empty());
        if !has_host && matches!(url.path(), "" | "/") {
            return Err(WaitError::InvalidArgument(format!(
                "file location '{}' has no path",
                url
            )));
        }

        let path = match url.host_str() {
            Some(host) if !host.is_empty() && host != "localhost" => {
                PathBuf::from(format!("{}{}", host, url.path()))
            }
            _ => url
                .to_file_path()
                .unwrap_or_else(|_| PathBuf::from(url.path())),
        };
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl Resource for FileResource {
    async fn check(&self, _ctx: &WaitContext) -> Result<()> {
        match tokio::fs::try_exists(&self.path).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(WaitError::not_ready(format!(
                "file {} does not exist",
                self.path.display()
            ))),
            Err(e) => Err(WaitError::not_ready(format!(
                "cannot stat {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Serves the `file` scheme.
pub fn module() -> (Vec<String>, ResourceFactory) {
    (
        vec!["file".to_string()],
        factory(|url| Ok(Box::new(FileResource::from_url(url)?))),
    )
}
