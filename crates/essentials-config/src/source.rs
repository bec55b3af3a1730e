//! Environment sources.
//!
//! The resolver reads variables through [`EnvSource`] rather than the process
//! environment directly, so tests can supply a map and `.env` files never
//! have to be written into the process environment.

use crate::ConfigError;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// A read-only view of environment variables.
pub trait EnvSource: Send + Sync {
    /// Returns the value of `key`, or `None` if it is unset.
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<T: EnvSource + ?Sized> EnvSource for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Variables parsed from a dotenv file.
///
/// Parsing uses `dotenvy` and does not modify the process environment.
#[derive(Debug, Clone, Default)]
pub struct DotenvFile {
    path: Option<PathBuf>,
    vars: HashMap<String, String>,
}

impl DotenvFile {
    /// Parses the file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let iter = dotenvy::from_path_iter(path).map_err(|e| ConfigError::dotenv(path, e))?;
        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| ConfigError::dotenv(path, e))?;
            vars.insert(key, value);
        }

        tracing::debug!(path = %path.display(), variables = vars.len(), "Loaded dotenv file");
        Ok(Self {
            path: Some(path.to_path_buf()),
            vars,
        })
    }

    /// Parses dotenv content held in memory.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut vars = HashMap::new();
        for item in dotenvy::from_read_iter(content.as_bytes()) {
            let (key, value) = item.map_err(|e| ConfigError::dotenv("<memory>", e))?;
            vars.insert(key, value);
        }
        Ok(Self { path: None, vars })
    }

    /// Returns the file path, if parsed from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns `true` if the file defined no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EnvSource for DotenvFile {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Several sources consulted in order; the first one defining a key wins.
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn EnvSource>>,
}

impl LayeredSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer with lower priority than the existing ones.
    #[must_use]
    pub fn layer(mut self, source: impl EnvSource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }

    /// Inserts a layer with higher priority than the existing ones.
    #[must_use]
    pub fn prepend(mut self, source: impl EnvSource + 'static) -> Self {
        self.layers.insert(0, Box::new(source));
        self
    }

    /// Returns the number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if there are no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl std::fmt::Debug for LayeredSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredSource")
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl EnvSource for LayeredSource {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_map_sources() {
        let hash = map(&[("PORT", "8080")]);
        assert_eq!(EnvSource::get(&hash, "PORT"), Some("8080".to_string()));
        assert_eq!(EnvSource::get(&hash, "HOST"), None);

        let tree: BTreeMap<String, String> = hash.into_iter().collect();
        assert_eq!(EnvSource::get(&tree, "PORT"), Some("8080".to_string()));
    }

    #[test]
    fn test_process_env_reads_path() {
        // PATH is set in every test environment.
        assert!(ProcessEnv.get("PATH").is_some());
        assert!(ProcessEnv.get("ESSENTIALS_SURELY_UNSET_VARIABLE").is_none());
    }

    #[test]
    fn test_dotenv_parse() {
        let file = DotenvFile::parse("# comment\nPORT=8080\nNAME=\"test app\"\n").unwrap();
        assert_eq!(file.len(), 2);
        assert_eq!(file.get("PORT"), Some("8080".to_string()));
        assert_eq!(file.get("NAME"), Some("test app".to_string()));
        assert!(file.path().is_none());
    }

    #[test]
    fn test_dotenv_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "FEATURES=a,b").unwrap();

        let dotenv = DotenvFile::from_path(file.path()).unwrap();
        assert_eq!(dotenv.get("FEATURES"), Some("a,b".to_string()));
        assert_eq!(dotenv.path(), Some(file.path()));
    }

    #[test]
    fn test_dotenv_missing_file() {
        let result = DotenvFile::from_path("/nonexistent/.env");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_layered_source_priority() {
        let source = LayeredSource::new()
            .layer(map(&[("PORT", "1"), ("HOST", "localhost")]))
            .prepend(map(&[("PORT", "2")]));

        assert_eq!(source.len(), 2);
        assert_eq!(source.get("PORT"), Some("2".to_string()));
        assert_eq!(source.get("HOST"), Some("localhost".to_string()));
        assert_eq!(source.get("OTHER"), None);
    }
}
