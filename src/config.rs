use std::path::{Path, PathBuf};

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2/";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Path to the local cache database (defaults to the XDG data dir).
  pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
    }
  }
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./rdex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/rdex/config.yaml
  ///
  /// rdex runs fine without any config file: every field has a usable
  /// default.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("rdex.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("rdex").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Resolve the cache database path.
  pub fn database_path(&self) -> Result<PathBuf> {
    if let Some(path) = &self.database {
      return Ok(path.clone());
    }
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;
    Ok(data_dir.join("rdex").join("dex.db"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_when_no_file() {
    let config = Config::default();
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    assert!(config.database.is_none());
  }

  #[test]
  fn test_parse_yaml() {
    let config: Config = serde_yaml::from_str(
      "api:\n  base_url: http://localhost:8000/api/v2/\ndatabase: /tmp/dex.db\n",
    )
    .unwrap();
    assert_eq!(config.api.base_url, "http://localhost:8000/api/v2/");
    assert_eq!(config.database.as_deref(), Some(Path::new("/tmp/dex.db")));
  }

  #[test]
  fn test_partial_yaml_fills_defaults() {
    let config: Config = serde_yaml::from_str("database: /tmp/dex.db\n").unwrap();
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
  }
}
