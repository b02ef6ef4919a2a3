//! Reading setting declarations from a TOML build manifest.

use std::path::Path;
use std::sync::Arc;

use toml::{Table, Value};

use super::declaration::{normalize_table, NormalizedSetting};
use super::decode::DecoderRegistry;
use super::SettingsError;

/// Reads the `[settings]` table of the manifest at `path` and normalizes it.
///
/// A manifest without a `settings` table declares no settings.
///
/// ```toml
/// [settings.person]
/// decode = "person"
/// lazy = false
///
/// [settings.deployments]
/// path = "./config/deployments.json"
/// ```
pub fn load_manifest(
    path: &Path,
    decoders: &DecoderRegistry,
) -> Result<Vec<NormalizedSetting>, SettingsError> {
    let manifest = read_manifest(path)?;
    match manifest.get("settings") {
        Some(Value::Table(settings)) => normalize_table(settings, decoders),
        Some(_) => Err(SettingsError::InvalidSettingsTable),
        None => Ok(Vec::new()),
    }
}

fn read_manifest(path: &Path) -> Result<Table, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).map_err(|e| SettingsError::ManifestParse {
            path: path.to_path_buf(),
            source: Arc::new(e),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SettingsError::ManifestNotFound(path.to_path_buf()))
        }
        Err(e) => Err(SettingsError::ManifestRead {
            path: path.to_path_buf(),
            source: Arc::new(e),
        }),
    }
}
