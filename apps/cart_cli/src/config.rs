use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub database_url: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            database_url: storage::default_database_url(),
            log_filter: "info".into(),
        }
    }
}

/// Keys accepted in `cart.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_url: Option<String>,
    database_url: Option<String>,
    log_filter: Option<String>,
}

/// Defaults, then the config file (if present), then environment overrides.
pub fn load_settings(config_path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if config_path.exists() {
        let raw = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config '{}'", config_path.display()))?;
        apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("invalid config '{}'", config_path.display()))?;
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = read("CART_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = read("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = read("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = read("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = read("RUST_LOG") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        apply_file_overrides(
            &mut settings,
            r#"
            api_url = "http://10.0.2.2:8000/api/"
            log_filter = "debug"
            "#,
        )
        .expect("valid config");

        assert_eq!(settings.api_url, "http://10.0.2.2:8000/api/");
        assert_eq!(settings.log_filter, "debug");
        assert_eq!(settings.database_url, Settings::default().database_url);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let mut settings = Settings::default();
        assert!(apply_file_overrides(&mut settings, "bind_addr = \"0.0.0.0:1\"").is_err());
    }

    #[test]
    fn app_prefixed_env_wins_over_plain_env() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CART_API_URL", "http://plain/api/"),
            ("APP__API_URL", "http://prefixed/api/"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("RUST_LOG", "  "),
        ]);
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.api_url, "http://prefixed/api/");
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("cart_cli_config_that_does_not_exist.toml");
        let settings = load_settings(&path).expect("defaults");
        assert!(!settings.api_url.is_empty());
        assert!(!settings.database_url.is_empty());
    }
}
