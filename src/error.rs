use crate::settings::SettingsError;
use thiserror::Error;

/// Top-level error type for the contract-settings library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("runtime environment requires a network name")]
    MissingNetwork,

    #[error("failed to determine the working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}
