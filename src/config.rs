use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const APP_DIRECTORY: &str = "sdp-import";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const DOMAIN_ENV: &str = "SDP_IMPORT_DOMAIN";
pub const TECHNICIAN_KEY_ENV: &str = "SDP_IMPORT_TECHNICIAN_KEY";
pub const LOG_FILE_ENV: &str = "LOG_FILE";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
pub const ERROR_LOG_FILE_ENV: &str = "ERROR_LOG_FILE";

const DEFAULT_LOG_FILE: &str = "app.log";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ERROR_LOG_FILE: &str = "error.log";

/// Settings persisted by `sdp-import config init`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    pub domain: Option<String>,
    pub technician_key: Option<String>,
    pub log_file: Option<String>,
    pub log_level: Option<String>,
    pub error_log_file: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = toml::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to encode config: {err}")))?;
        fs::write(&path, data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIRECTORY))
        .ok_or_else(|| AppError::Configuration("no config directory on this platform".to_string()))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub domain: Option<String>,
    pub technician_key: Option<String>,
    pub log_file: PathBuf,
    pub log_level: String,
    pub error_log_file: PathBuf,
}

impl AppConfig {
    /// Stored config overlaid with the process environment.
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Ok(Self::resolve(stored, |name| env::var(name).ok()))
    }

    pub fn resolve<F>(stored: StoredConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |name: &str, stored: Option<String>| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .or(stored.filter(|value| !value.trim().is_empty()))
        };

        Self {
            domain: pick(DOMAIN_ENV, stored.domain),
            technician_key: pick(TECHNICIAN_KEY_ENV, stored.technician_key),
            log_file: PathBuf::from(
                pick(LOG_FILE_ENV, stored.log_file).unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
            ),
            log_level: pick(LOG_LEVEL_ENV, stored.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
            error_log_file: PathBuf::from(
                pick(ERROR_LOG_FILE_ENV, stored.error_log_file)
                    .unwrap_or_else(|| DEFAULT_ERROR_LOG_FILE.to_string()),
            ),
        }
    }

    /// `https://<domain>` unless the domain already names a scheme.
    pub fn base_url(&self) -> AppResult<String> {
        let domain = self
            .domain
            .as_deref()
            .map(str::trim)
            .filter(|domain| !domain.is_empty())
            .ok_or_else(|| {
                AppError::Configuration(
                    "ServiceDesk domain not configured (use --domain or `sdp-import config init`)"
                        .to_string(),
                )
            })?;
        let domain = domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            Ok(domain.to_string())
        } else {
            Ok(format!("https://{domain}"))
        }
    }

    pub fn technician_key(&self) -> AppResult<&str> {
        self.technician_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::Configuration(
                    "technician key not configured (use --key or `sdp-import config init`)"
                        .to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn resolve_with(stored: StoredConfig, vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::resolve(stored, |name| vars.get(name).cloned())
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = resolve_with(StoredConfig::default(), &[]);
        assert_eq!(config.domain, None);
        assert_eq!(config.log_file, PathBuf::from("app.log"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.error_log_file, PathBuf::from("error.log"));
        assert!(config.base_url().is_err());
        assert!(config.technician_key().is_err());
    }

    #[test]
    fn environment_overrides_stored_values() {
        let stored = StoredConfig {
            domain: Some("stored.example.com".to_string()),
            technician_key: Some("stored-key".to_string()),
            log_level: Some("debug".to_string()),
            ..StoredConfig::default()
        };
        let config = resolve_with(
            stored,
            &[
                (DOMAIN_ENV, "env.example.com:8080"),
                (LOG_LEVEL_ENV, "WARN"),
                (ERROR_LOG_FILE_ENV, "  "),
            ],
        );
        assert_eq!(config.domain.as_deref(), Some("env.example.com:8080"));
        assert_eq!(config.technician_key().unwrap(), "stored-key");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.error_log_file, PathBuf::from("error.log"));
    }

    #[test]
    fn base_url_defaults_to_https() {
        let mut config = resolve_with(
            StoredConfig::default(),
            &[(DOMAIN_ENV, "sdp.example.com:8080/")],
        );
        assert_eq!(config.base_url().unwrap(), "https://sdp.example.com:8080");

        config.domain = Some("http://127.0.0.1:9000".to_string());
        assert_eq!(config.base_url().unwrap(), "http://127.0.0.1:9000");
    }

    #[test]
    fn stored_config_round_trips_through_toml() {
        let stored = StoredConfig {
            domain: Some("sdp.example.com".to_string()),
            technician_key: Some("ABCD-1234".to_string()),
            ..StoredConfig::default()
        };
        let encoded = toml::to_string_pretty(&stored).unwrap();
        assert!(encoded.contains("domain = \"sdp.example.com\""));
        let decoded: StoredConfig = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, stored);
    }
}
