//! Locating and loading the file behind a setting.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use super::format::{load_with, ParserRegistry};
use super::SettingsError;

/// Candidate file names for one setting, in lookup order.
///
/// For setting `N` on network `W`, every registered extension is tried as
/// `N.W.<ext>` before any `N.<ext>`, so network-specific files always win.
#[derive(Debug, Clone)]
pub struct SearchStrategy {
    name: String,
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone)]
struct Candidate {
    file_name: String,
    extension: String,
}

/// A configuration file found by a search.
#[derive(Debug, Clone)]
pub struct Found {
    pub path: PathBuf,
    pub value: Value,
}

impl SearchStrategy {
    pub fn new(name: &str, network: &str, parsers: &ParserRegistry) -> Self {
        let stems = [format!("{name}.{network}"), name.to_string()];
        let candidates = stems
            .iter()
            .flat_map(|stem| {
                parsers.extensions().map(move |ext| Candidate {
                    file_name: format!("{stem}.{ext}"),
                    extension: ext.to_string(),
                })
            })
            .collect();

        Self {
            name: name.to_string(),
            candidates,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.file_name.as_str())
    }

    /// Walks from `start` up to and including `stop`, trying every candidate
    /// in each directory and returning the first non-empty file that exists.
    /// Whitespace-only files are passed over.
    ///
    /// The walk never goes above `stop`. If `start` is not inside `stop` it
    /// ends at the filesystem root.
    pub fn search(
        &self,
        start: &Path,
        stop: &Path,
        parsers: &ParserRegistry,
    ) -> Result<Found, SettingsError> {
        let start = canonical(start);
        let stop = canonical(stop);

        for dir in bounded_ancestors(&start, &stop) {
            for candidate in &self.candidates {
                let Some(parser) = parsers.get(&candidate.extension) else {
                    continue;
                };
                let path = dir.join(&candidate.file_name);
                if !path.is_file() {
                    trace!(path = %path.display(), "no configuration file");
                    continue;
                }

                let loaded = load_with(parser, &path).map_err(|e| SettingsError::Parse {
                    name: self.name.clone(),
                    path: path.clone(),
                    source: Arc::new(e),
                })?;
                let Some(value) = loaded else {
                    trace!(path = %path.display(), "skipping empty configuration file");
                    continue;
                };

                debug!(setting = %self.name, path = %path.display(), "found configuration file");
                return Ok(Found { path, value });
            }
        }

        Err(SettingsError::NotFound {
            name: self.name.clone(),
        })
    }
}

/// Loads an explicitly declared path, relative to `working_dir` unless
/// absolute, with the parser matching its extension.
///
/// A path that does not exist fails without a cause; any other failure
/// carries the underlying error.
pub fn load_path(
    path: &str,
    working_dir: &Path,
    parsers: &ParserRegistry,
) -> Result<Value, SettingsError> {
    let resolved = working_dir.join(path);
    debug!(path = %resolved.display(), "loading configuration file");

    if matches!(std::fs::metadata(&resolved), Err(e) if e.kind() == ErrorKind::NotFound) {
        return Err(SettingsError::Load {
            path: path.to_string(),
            source: None,
        });
    }

    parsers.load(&resolved).map_err(|e| SettingsError::Load {
        path: path.to_string(),
        source: Some(Arc::new(e)),
    })
}

fn bounded_ancestors<'a>(start: &'a Path, stop: &'a Path) -> impl Iterator<Item = &'a Path> {
    let mut done = false;
    start.ancestors().take_while(move |dir| {
        if done {
            return false;
        }
        done = *dir == stop;
        true
    })
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::process::Command;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    fn node_available() -> bool {
        Command::new("node")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn search_in(root: &Path, name: &str) -> Result<Found, SettingsError> {
        let parsers = ParserRegistry::default();
        SearchStrategy::new(name, "localhost", &parsers).search(root, root, &parsers)
    }

    #[test]
    fn test_candidate_order() {
        let strategy = SearchStrategy::new("N", "W", &ParserRegistry::default());
        let candidates: Vec<_> = strategy.candidates().collect();

        assert_eq!(
            candidates,
            [
                "N.W.toml", "N.W.json", "N.W.yaml", "N.W.yml", "N.W.js", "N.W.cjs", "N.toml",
                "N.json", "N.yaml", "N.yml", "N.js", "N.cjs",
            ]
        );
    }

    #[test]
    fn test_network_variant_wins() {
        let root = TempDir::new().unwrap();
        write(root.path(), "foo.toml", "source = \"plain\"");
        write(root.path(), "foo.sepolia.toml", "source = \"network\"");
        let parsers = ParserRegistry::default();

        let found = SearchStrategy::new("foo", "sepolia", &parsers)
            .search(root.path(), root.path(), &parsers)
            .unwrap();

        assert!(found.path.ends_with("foo.sepolia.toml"));
        assert_eq!(found.value, json!({ "source": "network" }));
    }

    #[test]
    fn test_network_json_beats_plain_toml() {
        let root = TempDir::new().unwrap();
        write(root.path(), "foo.toml", "source = \"plain\"");
        write(root.path(), "foo.sepolia.json", r#"{"source":"network"}"#);
        let parsers = ParserRegistry::default();

        let found = SearchStrategy::new("foo", "sepolia", &parsers)
            .search(root.path(), root.path(), &parsers)
            .unwrap();

        assert_eq!(found.value, json!({ "source": "network" }));
    }

    #[test]
    fn test_falls_back_to_plain_json() {
        let root = TempDir::new().unwrap();
        write(root.path(), "foo.json", r#"{"source":"json"}"#);
        let parsers = ParserRegistry::default();

        for network in ["localhost", "mainnet"] {
            let found = SearchStrategy::new("foo", network, &parsers)
                .search(root.path(), root.path(), &parsers)
                .unwrap();
            assert!(found.path.ends_with("foo.json"));
        }
    }

    #[test]
    fn test_searches_upward_to_root() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("packages").join("app");
        fs::create_dir_all(&nested).unwrap();
        write(root.path(), "foo.yaml", "level: root");
        let parsers = ParserRegistry::default();

        let found = SearchStrategy::new("foo", "localhost", &parsers)
            .search(&nested, root.path(), &parsers)
            .unwrap();

        assert_eq!(found.value, json!({ "level": "root" }));
    }

    #[test]
    fn test_nearest_directory_wins() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("app");
        fs::create_dir_all(&nested).unwrap();
        write(root.path(), "foo.sepolia.toml", "level = \"root\"");
        write(&nested, "foo.yml", "level: nested");
        let parsers = ParserRegistry::default();

        let found = SearchStrategy::new("foo", "sepolia", &parsers)
            .search(&nested, root.path(), &parsers)
            .unwrap();

        assert_eq!(found.value, json!({ "level": "nested" }));
    }

    #[test]
    fn test_does_not_cross_boundary() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("project");
        fs::create_dir_all(&root).unwrap();
        write(outer.path(), "foo.json", "{}");
        let parsers = ParserRegistry::default();

        let err = SearchStrategy::new("foo", "localhost", &parsers)
            .search(&root, &root, &parsers)
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Could not find configuration file matching \"foo\""
        );
    }

    #[test]
    fn test_parse_error_names_setting() {
        let root = TempDir::new().unwrap();
        write(root.path(), "person.toml", "firstName = ");
        let parsers = ParserRegistry::default();

        let err = SearchStrategy::new("person", "localhost", &parsers)
            .search(root.path(), root.path(), &parsers)
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to parse configuration file matching \"person\""
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_load_relative_path() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("config")).unwrap();
        write(&root.path().join("config"), "person.json", r#"{"firstName":"blaine"}"#);

        let value = load_path("./config/person.json", root.path(), &ParserRegistry::default())
            .unwrap();
        assert_eq!(value, json!({ "firstName": "blaine" }));
    }

    #[test]
    fn test_load_absolute_path() {
        let root = TempDir::new().unwrap();
        write(root.path(), "person.yml", "firstName: blaine");
        let absolute = root.path().join("person.yml");
        let elsewhere = TempDir::new().unwrap();

        let value = load_path(
            absolute.to_str().unwrap(),
            elsewhere.path(),
            &ParserRegistry::default(),
        )
        .unwrap();
        assert_eq!(value, json!({ "firstName": "blaine" }));
    }

    #[test]
    fn test_load_missing_path() {
        let root = TempDir::new().unwrap();

        let err = load_path("./config/person.json", root.path(), &ParserRegistry::default())
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to load configuration file: ./config/person.json"
        );
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_load_unparseable_path_keeps_cause() {
        let root = TempDir::new().unwrap();
        write(root.path(), "person.json", "{ not json");

        let err = load_path("person.json", root.path(), &ParserRegistry::default()).unwrap_err();

        assert_eq!(err.to_string(), "Failed to load configuration file: person.json");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_empty_candidate_is_skipped() {
        let root = TempDir::new().unwrap();
        write(root.path(), "foo.toml", "");
        write(root.path(), "foo.json", r#"{"a":1}"#);

        let found = search_in(root.path(), "foo").unwrap();

        assert!(found.path.ends_with("foo.json"));
        assert_eq!(found.value, json!({ "a": 1 }));
    }

    #[test]
    fn test_empty_network_variant_falls_through() {
        let root = TempDir::new().unwrap();
        write(root.path(), "foo.localhost.yaml", "  \n");
        write(root.path(), "foo.yml", "source: plain");

        let found = search_in(root.path(), "foo").unwrap();
        assert_eq!(found.value, json!({ "source": "plain" }));
    }

    #[test]
    fn test_only_empty_candidates_is_not_found() {
        let root = TempDir::new().unwrap();
        write(root.path(), "foo.json", "\n");

        let err = search_in(root.path(), "foo").unwrap_err();
        assert!(matches!(err, SettingsError::NotFound { .. }));
    }

    #[test]
    fn test_load_empty_explicit_path_is_null() {
        let root = TempDir::new().unwrap();
        write(root.path(), "foo.json", "");

        let value = load_path("foo.json", root.path(), &ParserRegistry::default()).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_load_directory_path_keeps_cause() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("person.json")).unwrap();

        let err = load_path("person.json", root.path(), &ParserRegistry::default()).unwrap_err();

        assert_eq!(err.to_string(), "Failed to load configuration file: person.json");
        let cause = std::error::Error::source(&err).unwrap();
        assert!(cause.to_string().starts_with("failed to read"), "{cause}");
    }

    #[test]
    fn test_finds_js_module_exports() {
        if !node_available() {
            eprintln!("node not installed, skipping");
            return;
        }
        let root = TempDir::new().unwrap();
        write(root.path(), "foo.js", "module.exports = { a: 1 };");

        let found = search_in(root.path(), "foo").unwrap();
        assert_eq!(found.value, json!({ "a": 1 }));
    }

    #[test]
    fn test_finds_cjs_default_export() {
        if !node_available() {
            eprintln!("node not installed, skipping");
            return;
        }
        let root = TempDir::new().unwrap();
        write(
            root.path(),
            "bar.cjs",
            "exports.__esModule = true; exports.default = 'x';",
        );

        let found = search_in(root.path(), "bar").unwrap();
        assert_eq!(found.value, json!("x"));
    }

    #[test]
    fn test_unwraps_sole_default_key() {
        if !node_available() {
            eprintln!("node not installed, skipping");
            return;
        }
        let root = TempDir::new().unwrap();
        write(root.path(), "baz.cjs", "module.exports = { default: { b: 2 } };");
        write(root.path(), "qux.cjs", "module.exports = { default: 1, other: 2 };");

        assert_eq!(search_in(root.path(), "baz").unwrap().value, json!({ "b": 2 }));
        assert_eq!(
            search_in(root.path(), "qux").unwrap().value,
            json!({ "default": 1, "other": 2 })
        );
    }
}
