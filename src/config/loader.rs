//! Layered configuration loading.
//!
//! Priority, lowest first: defaults, YAML file, environment, CLI flags. The
//! CLI layer lives in [`crate::cli`]; this module handles the first three.

use std::path::Path;

use crate::config::schema::CrawlConfig;
use crate::error::{Result, SteamChainError};

/// Config file picked up from the working directory when present.
pub const CONFIG_FILE_NAME: &str = "steamchain.yaml";

pub const ENV_API_KEY: &str = "STEAM_API_KEY";
pub const ENV_INITIAL_STEAM_ID: &str = "DEFAULT_INITIAL_STEAM_ID";

/// Load the file layer.
///
/// An explicit path must exist. Without one, `<project_root>/steamchain.yaml`
/// is used if present, otherwise defaults.
pub fn load_config(explicit: Option<&Path>, project_root: Option<&Path>) -> Result<CrawlConfig> {
    let path = match (explicit, project_root) {
        (Some(path), _) => {
            if !path.exists() {
                return Err(SteamChainError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        (None, Some(root)) => {
            let candidate = root.join(CONFIG_FILE_NAME);
            if !candidate.exists() {
                return Ok(CrawlConfig::default());
            }
            candidate
        }
        (None, None) => return Ok(CrawlConfig::default()),
    };

    let contents = std::fs::read_to_string(&path)?;
    if contents.trim().is_empty() {
        return Ok(CrawlConfig::default());
    }
    tracing::debug!("Loading config from {}", path.display());
    serde_yaml::from_str(&contents).map_err(|e| {
        SteamChainError::Config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Apply the environment layer using `lookup` to read variables.
pub fn apply_env(config: &mut CrawlConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup(ENV_API_KEY).filter(|k| !k.is_empty()) {
        config.api_key = Some(key);
    }
    if let Some(id) = lookup(ENV_INITIAL_STEAM_ID).filter(|v| !v.is_empty()) {
        config.initial_steam_id = Some(id);
    }
}

/// Apply the process environment, reading a `.env` file first if present.
pub fn apply_process_env(config: &mut CrawlConfig) {
    // A missing .env is normal.
    let _ = dotenv::dotenv();
    apply_env(config, |name| std::env::var(name).ok());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn no_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(None, Some(dir.path())).unwrap();
        assert_eq!(config.max_depth, 6);
    }

    #[test]
    fn project_file_is_picked_up() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "max_depth: 4\nshuffle_friends: true\n").unwrap();
        let config = load_config(None, Some(dir.path())).unwrap();
        assert_eq!(config.max_depth, 4);
        assert!(config.shuffle_friends);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("nope.yaml")), None).unwrap_err();
        assert!(matches!(err, SteamChainError::Config(_)));
    }

    #[test]
    fn invalid_yaml_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "max_depth: [not a number").unwrap();
        assert!(matches!(
            load_config(Some(&path), None),
            Err(SteamChainError::Config(_))
        ));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(load_config(Some(&path), None).unwrap().max_depth, 6);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = CrawlConfig {
            initial_steam_id: Some("from-file".into()),
            ..Default::default()
        };
        let env: HashMap<&str, &str> = [(ENV_API_KEY, "k"), (ENV_INITIAL_STEAM_ID, "from-env")]
            .into_iter()
            .collect();
        apply_env(&mut config, |name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.initial_steam_id.as_deref(), Some("from-env"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = CrawlConfig::default();
        apply_env(&mut config, |_| Some(String::new()));
        assert!(config.api_key.is_none());
        assert!(config.initial_steam_id.is_none());
    }
}
