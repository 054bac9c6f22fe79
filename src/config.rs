use serde::Deserialize;
use std::path::Path;

/// Defaults loaded from an optional `logtee.toml`, overridden by CLI flags.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Byte quota applied when `-o` is not given (e.g. "512k").
    pub limit: Option<String>,
    /// Read granularity for the child's streams, in bytes. Must be > 0.
    /// Only affects syscall granularity, not what ends up in the log.
    pub chunk_size: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            limit: None,
            chunk_size: 8192,
        }
    }
}

/// Errors from loading the config file.
#[derive(Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    Parse {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },
    /// A field value is out of range.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {}", path.display(), source)
            }
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Load config from `path`. A missing file yields built-in defaults;
/// an unreadable or malformed file is an error.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    if config.log.chunk_size == 0 {
        return Err(ConfigError::Invalid(
            "log.chunk_size must be greater than zero".to_string(),
        ));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.log.chunk_size, 8192);
        assert!(config.log.limit.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logtee.toml");
        std::fs::write(&path, "[log]\nlimit = \"512k\"\nchunk_size = 4096\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.log.limit.as_deref(), Some("512k"));
        assert_eq!(config.log.chunk_size, 4096);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logtee.toml");
        std::fs::write(&path, "[log]\nlimit = \"2M\"\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.log.limit.as_deref(), Some("2M"));
        assert_eq!(config.log.chunk_size, 8192);
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logtee.toml");
        std::fs::write(&path, "[log\nlimit = ").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logtee.toml");
        std::fs::write(&path, "[log]\nchunk_size = 0\n").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
