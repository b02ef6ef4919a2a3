//! Resolution of a single setting: locate, parse, decode.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use super::declaration::NormalizedSetting;
use super::format::ParserRegistry;
use super::search::{load_path, SearchStrategy};
use super::SettingsError;

/// Resolves settings for one network within one project.
#[derive(Debug, Clone)]
pub struct Resolver {
    network: String,
    root: PathBuf,
    working_dir: PathBuf,
    parsers: Arc<ParserRegistry>,
}

impl Resolver {
    /// `root` bounds the upward search; `working_dir` is where it starts and
    /// what relative explicit paths are joined to.
    pub fn new(
        network: impl Into<String>,
        root: impl AsRef<Path>,
        working_dir: impl AsRef<Path>,
        parsers: Arc<ParserRegistry>,
    ) -> Self {
        Self {
            network: network.into(),
            root: root.as_ref().to_path_buf(),
            working_dir: working_dir.as_ref().to_path_buf(),
            parsers,
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn strategy(&self, name: &str) -> SearchStrategy {
        SearchStrategy::new(name, &self.network, &self.parsers)
    }

    /// Loads the raw value for `setting` without decoding it.
    ///
    /// An explicit path skips the search. An empty path is treated as absent.
    pub fn load(&self, setting: &NormalizedSetting) -> Result<Value, SettingsError> {
        match setting.path().filter(|path| !path.is_empty()) {
            Some(path) => load_path(path, &self.working_dir, &self.parsers),
            None => self
                .strategy(setting.name())
                .search(&self.working_dir, &self.root, &self.parsers)
                .map(|found| found.value),
        }
    }

    /// Loads and decodes `setting`.
    pub fn resolve(&self, setting: &NormalizedSetting) -> Result<Box<dyn Any>, SettingsError> {
        let raw = self.load(setting)?;
        setting
            .decoder()
            .decode(raw)
            .map_err(|e| SettingsError::Decode {
                name: setting.name().to_string(),
                source: Arc::new(e),
            })
    }
}
