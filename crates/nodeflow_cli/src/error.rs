// SPDX-License-Identifier: MIT OR Apache-2.0
//! Driver errors.

use crate::settings::SettingsError;
use nodeflow_convert::{CatalogError, RunError};
use nodeflow_graph::DocumentError;
use std::path::PathBuf;

/// Anything that stops a command
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A file could not be read
    #[error("reading {}: {source}", path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// A file could not be written
    #[error("writing {}: {source}", path.display())]
    Write {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// Scene document error
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// Catalog or slot map override error
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Settings error
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// Run driven out of order
    #[error(transparent)]
    Run(#[from] RunError),
    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Unknown material kind tag
    #[error("unknown material kind '{0}'")]
    UnknownKind(String),
    /// Unknown schema name
    #[error("unknown schema '{0}'")]
    UnknownSchema(String),
    /// Node missing from the scene
    #[error("node '{0}' not found in scene")]
    UnknownNode(String),
}
