//! Error types for template discovery and deployment.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur during template operations.
///
/// `ConfigLayer`, `Render`, `Read` and `Write` describe a single layer or content file
/// and are logged while the deployment carries on without it. `DescriptorParse`
/// is skipped the same way when listing, but is fatal for the template being
/// deployed, as are `TemplateNotFound` and `WalkAbort`.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid template descriptor {path}: {message}")]
    DescriptorParse { path: PathBuf, message: String },

    #[error("Unable to use configuration layer {path}: {message}")]
    ConfigLayer { path: PathBuf, message: String },

    #[error("Template rendering failed for {path}: {message}")]
    Render { path: PathBuf, message: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot traverse template content at {path}: {message}")]
    WalkAbort { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid search pattern: {0}")]
    Glob(#[from] glob::PatternError),
}

impl TemplateError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn render(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Render {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
