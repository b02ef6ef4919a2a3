//! File-format parsers, keyed by extension.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in '{path}': {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid YAML in '{path}': {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to run module loader '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("module '{path}' could not be loaded: {message}")]
    Module { path: PathBuf, message: String },

    #[error("no parser registered for extension '{0}'")]
    UnsupportedExtension(String),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Turns the contents of a configuration file into a raw value.
///
/// Hosts can implement this for formats the crate doesn't know about and
/// register them in a [`ParserRegistry`].
pub trait Parser: fmt::Debug + Send + Sync {
    /// Parses `contents`, which were read from `path`.
    fn parse(&self, path: &Path, contents: &str) -> Result<Value, ParseError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TomlParser;

impl Parser for TomlParser {
    fn parse(&self, path: &Path, contents: &str) -> Result<Value, ParseError> {
        toml::from_str(contents).map_err(|e| ParseError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, path: &Path, contents: &str) -> Result<Value, ParseError> {
        serde_json::from_str(contents).map_err(|e| ParseError::Json {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl Parser for YamlParser {
    fn parse(&self, path: &Path, contents: &str) -> Result<Value, ParseError> {
        serde_yaml::from_str(contents).map_err(|e| ParseError::Yaml {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Script that prints the JSON form of a module's exported value.
///
/// Transpiled ES modules (`__esModule`) and ES module namespaces expose
/// their value under `default`, as does an object whose only key is
/// `default`. Plain CommonJS modules export it directly.
const MODULE_SCRIPT: &str = r#"
const mod = require(require("path").resolve(process.argv[1]));
const wrapped =
  mod !== null &&
  typeof mod === "object" &&
  "default" in mod &&
  (mod.__esModule ||
    mod[Symbol.toStringTag] === "Module" ||
    Object.keys(mod).length === 1);
const value = wrapped ? mod.default : mod;
process.stdout.write(JSON.stringify(value === undefined ? null : value));
"#;

/// Loads `.js`/`.cjs` modules by evaluating them with an external runtime.
///
/// The file contents are ignored; the runtime `require`s the path itself.
#[derive(Debug, Clone)]
pub struct ModuleParser {
    program: String,
}

impl ModuleParser {
    /// Uses `node` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("node")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ModuleParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ModuleParser {
    fn parse(&self, path: &Path, _contents: &str) -> Result<Value, ParseError> {
        let output = Command::new(&self.program)
            .arg("-e")
            .arg(MODULE_SCRIPT)
            .arg(path)
            .output()
            .map_err(|e| ParseError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ParseError::Module {
                path: path.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| ParseError::Json {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Ordered mapping from file extension to parser.
///
/// Registration order is search preference order: earlier extensions win
/// when several candidate files exist in the same directory.
#[derive(Debug, Clone)]
pub struct ParserRegistry {
    parsers: Vec<(String, Arc<dyn Parser>)>,
    no_extension: Option<Arc<dyn Parser>>,
}

impl ParserRegistry {
    /// A registry with no parsers at all.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
            no_extension: None,
        }
    }

    /// Registers `parser` for `extension` (without the leading dot).
    ///
    /// An already-registered extension keeps its position; a new one is
    /// appended with the lowest preference.
    #[must_use]
    pub fn with(mut self, extension: impl Into<String>, parser: impl Parser + 'static) -> Self {
        self.register(extension, parser);
        self
    }

    pub fn register(&mut self, extension: impl Into<String>, parser: impl Parser + 'static) {
        let extension = extension.into();
        let parser: Arc<dyn Parser> = Arc::new(parser);
        match self.parsers.iter_mut().find(|(ext, _)| *ext == extension) {
            Some(slot) => slot.1 = parser,
            None => self.parsers.push((extension, parser)),
        }
    }

    /// Sets the parser used for explicit paths that have no extension.
    #[must_use]
    pub fn with_no_extension(mut self, parser: impl Parser + 'static) -> Self {
        self.no_extension = Some(Arc::new(parser));
        self
    }

    /// Registered extensions in preference order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.parsers.iter().map(|(ext, _)| ext.as_str())
    }

    pub fn get(&self, extension: &str) -> Option<&dyn Parser> {
        self.parsers
            .iter()
            .find(|(ext, _)| ext == extension)
            .map(|(_, parser)| parser.as_ref())
    }

    /// Picks the parser for `path` from its extension.
    pub fn for_path(&self, path: &Path) -> Result<&dyn Parser, ParseError> {
        match path.extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy();
                self.get(&ext)
                    .ok_or_else(|| ParseError::UnsupportedExtension(ext.into_owned()))
            }
            None => self
                .no_extension
                .as_deref()
                .ok_or_else(|| ParseError::UnsupportedExtension(String::new())),
        }
    }

    /// Reads and parses the file at `path`.
    ///
    /// Whitespace-only files load as `null` without consulting the parser.
    pub fn load(&self, path: &Path) -> Result<Value, ParseError> {
        let parser = self.for_path(path)?;
        Ok(load_with(parser, path)?.unwrap_or_default())
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::empty()
            .with("toml", TomlParser)
            .with("json", JsonParser)
            .with("yaml", YamlParser)
            .with("yml", YamlParser)
            .with("js", ModuleParser::new())
            .with("cjs", ModuleParser::new())
            .with_no_extension(YamlParser)
    }
}

/// Reads `path` and parses it, or returns `None` if it is whitespace-only.
pub(crate) fn load_with(parser: &dyn Parser, path: &Path) -> Result<Option<Value>, ParseError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ParseError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    if contents.trim().is_empty() {
        trace!(path = %path.display(), "configuration file is empty");
        return Ok(None);
    }

    parser.parse(path, &contents).map(Some)
}
