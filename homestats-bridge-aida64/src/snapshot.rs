//! Acquisition of the raw sensor dump.
//!
//! AIDA64 exposes its sensor values as a fixed-size, NUL-padded text region.
//! Sources hand that text to the parser with the padding removed.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while acquiring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Sensor snapshot unavailable at '{path}': {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sensor snapshot is empty (is the monitoring tool running?)")]
    Empty,
}

/// Something that can produce the current raw sensor dump.
pub trait SnapshotSource: Send {
    /// Read the current dump, trimmed of padding.
    fn read_snapshot(&mut self) -> Result<String, SnapshotError>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for Box<S> {
    fn read_snapshot(&mut self) -> Result<String, SnapshotError> {
        (**self).read_snapshot()
    }
}

/// Strip the trailing NUL padding of a fixed-size region and decode the rest.
pub fn trim_padding(region: &[u8]) -> Result<String, SnapshotError> {
    let end = region
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);

    let text = String::from_utf8_lossy(&region[..end]);
    let text = text.trim();

    if text.is_empty() {
        return Err(SnapshotError::Empty);
    }

    Ok(text.to_string())
}

/// Reads the dump from a file, e.g. an exported copy of the shared region.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SnapshotSource for FileSource {
    fn read_snapshot(&mut self) -> Result<String, SnapshotError> {
        let region = std::fs::read(&self.path).map_err(|source| SnapshotError::Unavailable {
            path: self.path.clone(),
            source,
        })?;

        trim_padding(&region)
    }
}

/// Always returns the same dump.
#[derive(Debug, Clone)]
pub struct StaticSource {
    text: String,
}

impl StaticSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl SnapshotSource for StaticSource {
    fn read_snapshot(&mut self) -> Result<String, SnapshotError> {
        trim_padding(self.text.as_bytes())
    }
}

/// Where the bridge reads its dump from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// A file holding the dump.
    File { path: PathBuf },
    /// A dump embedded in the configuration (dry runs).
    Inline { text: String },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::File {
            path: PathBuf::from("AIDA64_SensorValues.xml"),
        }
    }
}

impl SourceConfig {
    /// Instantiate the configured source.
    pub fn build(&self) -> Box<dyn SnapshotSource> {
        match self {
            SourceConfig::File { path } => Box::new(FileSource::new(path.clone())),
            SourceConfig::Inline { text } => Box::new(StaticSource::new(text.clone())),
        }
    }

    /// Short human-readable description for logs and status metadata.
    pub fn describe(&self) -> String {
        match self {
            SourceConfig::File { path } => format!("file:{}", path.display()),
            SourceConfig::Inline { .. } => "inline".to_string(),
        }
    }
}
