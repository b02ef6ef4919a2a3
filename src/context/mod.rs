//! Build configuration and runtime environment for a project.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::settings::{
    load_manifest, normalize, DecoderRegistry, NormalizedSetting, ParserRegistry, Resolver,
    SettingDeclaration, Settings,
};
use crate::Error;

/// Finalized build configuration: the project root and its normalized
/// setting declarations.
///
/// Declarations are validated and defaulted once, when this is built.
///
/// ## Example
///
/// ```no_run
/// use contract_settings::{ProjectConfig, SettingDeclaration};
///
/// let config = ProjectConfig::builder(".")
///     .with_setting(SettingDeclaration::new("person"))
///     .with_setting(
///         SettingDeclaration::new("deployments")
///             .path("./config/deployments.json")
///             .lazy(false),
///     )
///     .build()?;
///
/// assert_eq!(config.settings().len(), 2);
/// # Ok::<(), contract_settings::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    root: PathBuf,
    settings: Vec<NormalizedSetting>,
}

impl ProjectConfig {
    /// Creates a builder for a project rooted at `root`.
    pub fn builder(root: impl AsRef<Path>) -> ProjectConfigBuilder {
        ProjectConfigBuilder {
            root: root.as_ref().to_path_buf(),
            declarations: Vec::new(),
        }
    }

    /// Loads declarations from the `[settings]` table of a TOML manifest.
    ///
    /// The manifest's directory becomes the project root.
    pub fn from_manifest(path: impl AsRef<Path>, decoders: &DecoderRegistry) -> Result<Self, Error> {
        let path = path.as_ref();
        let settings = load_manifest(path, decoders)?;
        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self { root, settings })
    }

    /// Upper bound of the configuration file search.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalized declarations, in declaration order.
    pub fn settings(&self) -> &[NormalizedSetting] {
        &self.settings
    }
}

/// Builder for [`ProjectConfig`].
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ProjectConfigBuilder {
    root: PathBuf,
    declarations: Vec<SettingDeclaration>,
}

impl ProjectConfigBuilder {
    /// Declares a setting. Redeclaring a name replaces the earlier
    /// declaration but keeps its position.
    pub fn with_setting(mut self, declaration: SettingDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// Validates and normalizes the declarations.
    pub fn build(self) -> Result<ProjectConfig, Error> {
        Ok(ProjectConfig {
            root: self.root,
            settings: normalize(self.declarations)?,
        })
    }
}

/// Runtime environment for one network.
///
/// Each environment owns its own settings cache, so building a second
/// environment from the same [`ProjectConfig`] loads everything afresh.
#[derive(Debug)]
pub struct Environment {
    settings: Settings,
}

impl Environment {
    /// Creates a builder for an environment over `config`.
    pub fn builder(config: &ProjectConfig) -> EnvironmentBuilder<'_> {
        EnvironmentBuilder {
            config,
            network: None,
            working_dir: None,
            parsers: None,
        }
    }

    pub fn network(&self) -> &str {
        self.settings.network()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Builder for constructing an [`Environment`].
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct EnvironmentBuilder<'a> {
    config: &'a ProjectConfig,
    network: Option<String>,
    working_dir: Option<PathBuf>,
    parsers: Option<Arc<ParserRegistry>>,
}

impl EnvironmentBuilder<'_> {
    /// Sets the active network name used to pick network-specific files.
    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Sets where the search starts and what relative paths resolve against.
    ///
    /// Defaults to the process's current directory.
    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Replaces the default parser registry.
    pub fn parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = Some(Arc::new(parsers));
        self
    }

    /// Builds the environment, resolving every non-lazy setting.
    ///
    /// Fails on the first eager setting that cannot be resolved.
    pub fn build(self) -> Result<Environment, Error> {
        let network = self.network.ok_or(Error::MissingNetwork)?;
        let working_dir = match self.working_dir {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(Error::WorkingDir)?,
        };
        let parsers = self.parsers.unwrap_or_default();

        debug!(
            network = %network,
            root = %self.config.root().display(),
            settings = self.config.settings().len(),
            "building runtime environment"
        );

        let resolver = Resolver::new(network, self.config.root(), working_dir, parsers);
        let settings = Settings::build(self.config.settings(), resolver)?;

        Ok(Environment { settings })
    }
}
