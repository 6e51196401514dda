use std::fmt::Debug;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Read access to the blob storage holding submissions and attachments.
pub trait ObjectStore: Debug + Send + Sync {
    fn read(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object {key} not found")]
    NotFound { key: String },
    #[error("object {key} unavailable: {reason}")]
    Unavailable { key: String, reason: String },
}

impl ObjectStoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Objects laid out as plain files beneath a root directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let confined = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        confined.then(|| self.root.join(relative))
    }
}

impl ObjectStore for LocalObjectStore {
    fn read(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let path = self.resolve(key).ok_or_else(|| ObjectStoreError::NotFound {
            key: key.to_string(),
        })?;

        std::fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ObjectStoreError::NotFound {
                key: key.to_string(),
            },
            _ => ObjectStoreError::Unavailable {
                key: key.to_string(),
                reason: err.to_string(),
            },
        })
    }
}

/// Google Cloud Storage access through the `gsutil` command-line tool.
#[derive(Debug, Clone)]
pub struct GsutilObjectStore {
    bucket: String,
    binary: PathBuf,
}

impl GsutilObjectStore {
    pub fn new(bucket: impl Into<String>, binary: impl Into<PathBuf>) -> Self {
        Self {
            bucket: bucket.into(),
            binary: binary.into(),
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        format!(
            "gs://{}/{}",
            self.bucket.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}

impl ObjectStore for GsutilObjectStore {
    fn read(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let url = self.object_url(key);
        debug!(%url, "reading object via gsutil");

        let output = Command::new(&self.binary)
            .arg("cat")
            .arg(&url)
            .output()
            .map_err(|err| ObjectStoreError::Unavailable {
                key: key.to_string(),
                reason: format!("failed to run {}: {err}", self.binary.display()),
            })?;

        if output.status.success() {
            return Ok(output.stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if reports_missing_object(&stderr) {
            Err(ObjectStoreError::NotFound {
                key: key.to_string(),
            })
        } else {
            Err(ObjectStoreError::Unavailable {
                key: key.to_string(),
                reason: stderr.trim().to_string(),
            })
        }
    }
}

fn reports_missing_object(stderr: &str) -> bool {
    let lowered = stderr.to_ascii_lowercase();
    ["no urls matched", "not found", "404"]
        .iter()
        .any(|marker| lowered.contains(marker))
}
