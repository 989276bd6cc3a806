//! Runtime server configuration.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("tally.db") }

fn default_directory_path() -> PathBuf { PathBuf::from("data/learners.json") }

/// Server settings, deserialised from `config.toml` overlaid with `TALLY_*`
/// environment variables (e.g. `TALLY_PORT=9000`).
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  /// SQLite database holding progress records.
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  /// JSON file listing the known learners.
  #[serde(default = "default_directory_path")]
  pub directory_path: PathBuf,
}

impl ServerConfig {
  /// Read `path` (optional) and the environment into a config.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = ::config::Config::builder()
      .add_source(::config::File::from(path).required(false))
      .add_source(::config::Environment::with_prefix("TALLY"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;

    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.directory_path = expand_tilde(&cfg.directory_path);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  match (s.strip_prefix("~/"), std::env::var("HOME")) {
    (Some(rest), Ok(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn missing_file_uses_defaults() {
    let cfg = ServerConfig::load(Path::new("/definitely/not/here.toml")).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store_path, PathBuf::from("tally.db"));
  }

  #[test]
  fn file_values_override_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "port = 9100\nstore_path = \"/var/lib/tally/progress.db\"").unwrap();

    let cfg = ServerConfig::load(file.path()).unwrap();
    assert_eq!(cfg.port, 9100);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/tally/progress.db"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/tally.db")),
      PathBuf::from(home).join("tally.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs.db")), PathBuf::from("/abs.db"));
  }
}
