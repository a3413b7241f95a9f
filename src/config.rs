//! User configuration: which directories to scan for docsets.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Contents of `config.toml` under the platform config directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories scanned for `.docset` bundles.
    pub docset_dirs: Vec<PathBuf>,
}

impl Config {
    /// Load the default config file, falling back to defaults when it is
    /// missing or malformed. Never fails.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load a specific config file; missing or malformed files degrade to
    /// the default config with a log line.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                debug!("no config file at {}; using defaults", path.display());
                return Self::default();
            }
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring malformed config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// `<config dir>/docshelf/config.toml`, platform depending.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docshelf").join("config.toml"))
    }

    /// Directories to scan: the configured ones, or the default data
    /// directory when nothing is configured.
    pub fn search_roots(&self) -> Vec<PathBuf> {
        if !self.docset_dirs.is_empty() {
            return self.docset_dirs.clone();
        }
        dirs::data_dir()
            .map(|dir| vec![dir.join("docshelf").join("docsets")])
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let config: Config =
            toml::from_str(r#"docset_dirs = ["/opt/docsets", "/srv/more"]"#).unwrap();
        check!(
            config.docset_dirs
                == vec![PathBuf::from("/opt/docsets"), PathBuf::from("/srv/more")]
        );
        check!(config.search_roots() == config.docset_dirs);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("nope.toml"));
        check!(config == Config::default());
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "docset_dirs = 17").unwrap();
        check!(Config::load_from(&path) == Config::default());
    }
}
