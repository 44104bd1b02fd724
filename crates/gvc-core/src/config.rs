//! Tool configuration loaded from TOML.

use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid key extension {0:?}: expected a bare extension such as \"gpg\"")]
    InvalidKeyExtension(String),

    #[error("invalid search path entry {}: {reason}", .entry.display())]
    InvalidSearchPath { entry: PathBuf, reason: String },
}

/// Programs and conventions used by a verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// File extension of exported public keys, without the leading dot.
    pub key_extension: String,
    /// Program used for `rev-list` and `verify-commit`.
    pub git_program: String,
    /// Program used to import keys.
    pub gpg_program: String,
    /// Directories passed to every command as `PATH`. The invoking
    /// process's `PATH` is never used.
    pub search_path: Vec<PathBuf>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            key_extension: "gpg".to_string(),
            git_program: "git".to_string(),
            gpg_program: "gpg".to_string(),
            search_path: ["/usr/local/bin", "/usr/bin", "/bin"]
                .iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

impl ChainConfig {
    /// Parse and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it names an existing file, otherwise defaults.
    ///
    /// Callers must not pass a path inside the repository being verified:
    /// the configuration chooses the programs that do the verifying.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.is_file() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Replace the key extension, validating the new value.
    pub fn with_key_extension(mut self, ext: impl Into<String>) -> Result<Self, ConfigError> {
        self.key_extension = ext.into();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_extension(&self.key_extension)?;
        for entry in &self.search_path {
            if !entry.is_absolute() {
                return Err(ConfigError::InvalidSearchPath {
                    entry: entry.clone(),
                    reason: "must be absolute".to_string(),
                });
            }
            env::join_paths([entry]).map_err(|e| ConfigError::InvalidSearchPath {
                entry: entry.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// The `PATH` value for child processes, or `None` for an empty search path.
    pub fn path_env(&self) -> Option<OsString> {
        if self.search_path.is_empty() {
            return None;
        }
        env::join_paths(&self.search_path).ok()
    }
}

fn validate_extension(ext: &str) -> Result<(), ConfigError> {
    let bad = ext.is_empty()
        || ext.starts_with('.')
        || ext
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '*' | '?' | '[' | ']' | '{' | '}') || c.is_whitespace());
    if bad {
        return Err(ConfigError::InvalidKeyExtension(ext.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ChainConfig::default();
        assert_eq!(config.key_extension, "gpg");
        assert_eq!(config.git_program, "git");
        assert_eq!(config.gpg_program, "gpg");
        assert_eq!(
            config.path_env(),
            Some(OsString::from("/usr/local/bin:/usr/bin:/bin"))
        );
    }

    #[test]
    fn test_empty_search_path_sets_no_path() {
        let config = ChainConfig {
            search_path: vec![],
            ..ChainConfig::default()
        };
        assert_eq!(config.path_env(), None);
    }

    #[test]
    fn test_load_search_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "search_path = [\"/opt/gnupg/bin\", \"/usr/bin\"]\n").unwrap();

        let config = ChainConfig::load(&path).unwrap();
        assert_eq!(config.path_env(), Some(OsString::from("/opt/gnupg/bin:/usr/bin")));
    }

    #[test]
    fn test_relative_search_path_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "search_path = [\"bin\"]\n").unwrap();

        assert!(matches!(
            ChainConfig::load(&path),
            Err(ConfigError::InvalidSearchPath { .. })
        ));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "key_extension = \"pgp\"\n").unwrap();

        let config = ChainConfig::load(&path).unwrap();
        assert_eq!(config.key_extension, "pgp");
        assert_eq!(config.git_program, "git");
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "keys_extension = \"pgp\"\n").unwrap();

        assert!(matches!(
            ChainConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_rejects_bad_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "key_extension = \"*.gpg\"\n").unwrap();

        assert!(matches!(
            ChainConfig::load(&path),
            Err(ConfigError::InvalidKeyExtension(_))
        ));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("config.toml");
        assert_eq!(
            ChainConfig::load_or_default(Some(missing.as_path())).unwrap(),
            ChainConfig::default()
        );
        assert_eq!(
            ChainConfig::load_or_default(None).unwrap(),
            ChainConfig::default()
        );
    }

    #[test]
    fn test_load_or_default_reads_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "key_extension = \"asc\"\n").unwrap();
        assert_eq!(
            ChainConfig::load_or_default(Some(path.as_path())).unwrap().key_extension,
            "asc"
        );
    }

    #[test]
    fn test_with_key_extension() {
        assert!(ChainConfig::default().with_key_extension("pgp").is_ok());
        assert!(ChainConfig::default().with_key_extension("").is_err());
        assert!(ChainConfig::default().with_key_extension(".gpg").is_err());
        assert!(ChainConfig::default().with_key_extension("a/b").is_err());
    }
}
