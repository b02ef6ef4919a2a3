use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use super::decode::DecodeError;
use super::format::ParseError;

/// Errors raised while declaring or resolving settings.
///
/// Underlying causes are held behind `Arc` so the error can be cloned. A lazy
/// setting that failed keeps its error and hands out a copy on every read.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("`key` cannot be empty.")]
    EmptyKey,

    #[error("`decode` config must be a function if provided.")]
    InvalidDecode,

    #[error("`lazy` config must be a boolean if provided.")]
    InvalidLazy,

    #[error("`path` config must be a string if provided.")]
    InvalidPath,

    #[error("Failed to decode configuration for \"{name}\"")]
    Decode {
        name: String,
        #[source]
        source: Arc<DecodeError>,
    },

    #[error("Could not find configuration file matching \"{name}\"")]
    NotFound { name: String },

    #[error("Failed to load configuration file: {path}")]
    Load {
        path: String,
        #[source]
        source: Option<Arc<ParseError>>,
    },

    #[error("Failed to parse configuration file matching \"{name}\"")]
    Parse {
        name: String,
        path: PathBuf,
        #[source]
        source: Arc<ParseError>,
    },

    #[error("no setting named \"{0}\" was declared")]
    Undeclared(String),

    #[error("setting \"{name}\" was not decoded into {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    #[error("settings manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    #[error("failed to read settings manifest '{path}': {source}")]
    ManifestRead {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },

    #[error("failed to parse settings manifest '{path}': {source}")]
    ManifestParse {
        path: PathBuf,
        source: Arc<toml::de::Error>,
    },

    #[error("`settings` must be a table of declarations")]
    InvalidSettingsTable,

    #[error("declaration for \"{0}\" must be a table")]
    InvalidDeclaration(String),
}
