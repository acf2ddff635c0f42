//! Resource handles: a discovered URL paired with its local destination.
//!
//! The local file name is the percent-decoded last path segment of the URL.
//! Names that could escape the output directory are rejected, and two URLs
//! decoding to the same name are reported before any transfer starts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use url::Url;

/// Errors produced while deriving destinations for discovered URLs.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The URL has no usable last path segment.
    #[error("cannot derive a local file name from {url}")]
    InvalidFileName {
        /// The offending URL.
        url: String,
    },

    /// Two distinct URLs decode to the same local file name.
    #[error("file name collision on {file_name}: {first} and {second}")]
    Collision {
        /// The shared local name.
        file_name: String,
        /// URL that claimed the name first.
        first: String,
        /// URL that collided with it.
        second: String,
    },
}

/// One remote resource and the file it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    url: Url,
    file_name: String,
    destination: PathBuf,
}

impl ResourceHandle {
    /// Derives the handle for `url` under `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidFileName`] when the decoded last segment is
    /// empty or not a plain file name.
    pub fn new(url: Url, output_dir: &Path) -> Result<Self, PlanError> {
        let file_name = local_file_name(&url).ok_or_else(|| PlanError::InvalidFileName {
            url: url.to_string(),
        })?;
        let destination = output_dir.join(&file_name);
        Ok(Self {
            url,
            file_name,
            destination,
        })
    }

    /// Derives handles for every URL, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Collision`] if two URLs share a local name, or
    /// [`PlanError::InvalidFileName`] for an unusable URL.
    pub fn plan(urls: &[Url], output_dir: &Path) -> Result<Vec<Self>, PlanError> {
        let mut claimed: HashMap<String, String> = HashMap::with_capacity(urls.len());
        let mut handles = Vec::with_capacity(urls.len());

        for url in urls {
            let handle = Self::new(url.clone(), output_dir)?;
            if let Some(first) = claimed.get(&handle.file_name) {
                return Err(PlanError::Collision {
                    file_name: handle.file_name,
                    first: first.clone(),
                    second: url.to_string(),
                });
            }
            claimed.insert(handle.file_name.clone(), url.to_string());
            handles.push(handle);
        }

        debug!(count = handles.len(), dir = %output_dir.display(), "planned destinations");
        Ok(handles)
    }

    /// Remote address.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Decoded local file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Full destination path.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// Percent-decoded last path segment of `url`, if it is a safe file name.
///
/// Returns `None` for empty segments, `.`/`..`, names containing path
/// separators or NUL after decoding, and segments that are not valid UTF-8.
#[must_use]
pub fn local_file_name(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(last).ok()?;
    let name = decoded.as_ref();
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return None;
    }
    Some(name.to_string())
}
