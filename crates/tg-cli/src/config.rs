use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tg_core::GraphOptions;

/// Config file looked up in the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "tg.toml";

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "TG_CONFIG";

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Toml(PathBuf, toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "failed to read {}: {e}", path.display()),
            Self::Toml(path, e) => write!(f, "invalid config {}: {e}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            Self::Toml(_, e) => Some(e),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    graph: GraphOptions,
}

/// Parse the `[graph]` table of a TOML document.
pub fn parse_options(content: &str) -> Result<GraphOptions, toml::de::Error> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(file.graph)
}

fn read_options(path: &Path) -> Result<GraphOptions, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    parse_options(&content).map_err(|e| ConfigError::Toml(path.to_path_buf(), e))
}

/// Load file-level options.
///
/// Lookup order: `explicit`, then `$TG_CONFIG`, then `./tg.toml`. A named
/// file must exist; the working-directory default is optional.
pub fn load_options(explicit: Option<&Path>, cwd: &Path) -> Result<GraphOptions, ConfigError> {
    if let Some(path) = explicit {
        tracing::debug!("loading config from {}", path.display());
        return read_options(path);
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        let path = PathBuf::from(path);
        tracing::debug!("loading config from ${CONFIG_ENV}: {}", path.display());
        return read_options(&path);
    }
    let default = cwd.join(DEFAULT_CONFIG_FILE);
    if default.is_file() {
        tracing::debug!("loading config from {}", default.display());
        return read_options(&default);
    }
    Ok(GraphOptions::default())
}
