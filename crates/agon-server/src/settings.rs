//! Runtime server configuration, deserialised from `config.toml` layered
//! with `AGON_*` environment variables.

use std::path::{Path, PathBuf};

use agon_api::auth::Account;
use agon_core::policy::Policy;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub accounts:   Vec<Account>,
  #[serde(default)]
  pub policy:     Policy,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

impl ServerConfig {
  /// Load from an optional TOML file, then environment overrides.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("AGON").separator("__"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_values_and_defaults() {
    let dir = std::env::temp_dir().join(format!("agon-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(
      &path,
      r#"
store_path = "/tmp/agon.sqlite"

[policy]
require_evidence = false

[[accounts]]
email = "ada@example.org"
password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
"#,
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.accounts.len(), 1);
    assert!(!cfg.policy.require_evidence);
    assert!(cfg.policy.factuality_requires_evidence);

    std::fs::remove_dir_all(&dir).unwrap();
  }

  #[test]
  fn tilde_expands_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let expanded = expand_tilde(Path::new("~/agon.sqlite"));
    assert_eq!(expanded, PathBuf::from(home).join("agon.sqlite"));
    assert_eq!(expand_tilde(Path::new("/abs/x")), PathBuf::from("/abs/x"));
  }
}
