use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{Coordinates, ValidationError, presenter::ErrorDismissal, provider::ProviderId};

/// Environment variable that overrides the stored WeatherAPI.com key.
pub const WEATHERAPI_KEY_ENV: &str = "SKYCAST_WEATHERAPI_KEY";

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Coordinates looked up when none are given, kept as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultLocation {
    pub latitude: String,
    pub longitude: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, "openmeteo" or "weatherapi".
    pub default_provider: Option<String>,

    #[serde(default)]
    pub error_dismissal: ErrorDismissal,

    pub location: Option<DefaultLocation>,

    /// Example TOML:
    /// [providers.weatherapi]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// WeatherAPI key from the environment; never written back to disk.
    #[serde(skip)]
    env_weatherapi_key: Option<String>,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    ///
    /// Falls back to Open-Meteo, which works without credentials.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(s) => ProviderId::try_from(s),
            None => Ok(ProviderId::OpenMeteo),
        }
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    ///
    /// Environment overrides are applied on top.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_from(&Self::config_file_path()?)?;
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        log::debug!("saved config to {}", path.display());
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    fn apply_env(&mut self) {
        self.env_weatherapi_key =
            std::env::var(WEATHERAPI_KEY_ENV).ok().filter(|key| !key.trim().is_empty());
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present. The environment wins over the file.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        if provider_id == ProviderId::WeatherApi {
            if let Some(key) = self.env_weatherapi_key.as_deref() {
                return Some(key);
            }
        }
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.requires_api_key() || self.provider_api_key(provider_id).is_some()
    }

    /// Validate and store the location used when no coordinates are given.
    pub fn set_default_location(
        &mut self,
        latitude: &str,
        longitude: &str,
    ) -> Result<Coordinates, ValidationError> {
        let coords = Coordinates::parse(latitude, longitude)?;
        self.location = Some(DefaultLocation {
            latitude: latitude.trim().to_string(),
            longitude: longitude.trim().to_string(),
        });
        Ok(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn default_provider_falls_back_to_open_meteo() {
        let cfg = Config::default();
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
    }

    #[test]
    fn unknown_default_provider_is_an_error() {
        let cfg = Config { default_provider: Some("darksky".into()), ..Config::default() };
        let err = cfg.default_provider_id().unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "WEATHER_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::WeatherApi);

        let key = cfg.provider_api_key(ProviderId::WeatherApi);
        assert_eq!(key, Some("WEATHER_KEY"));
        assert!(cfg.is_provider_configured(ProviderId::WeatherApi));
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();
        cfg.set_default_provider(ProviderId::OpenMeteo);

        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "WEATHER_KEY".into());

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
        assert!(cfg.is_provider_configured(ProviderId::WeatherApi));
    }

    #[test]
    fn open_meteo_is_always_configured() {
        let cfg = Config::default();
        assert!(cfg.is_provider_configured(ProviderId::OpenMeteo));
        assert!(!cfg.is_provider_configured(ProviderId::WeatherApi));
    }

    #[test]
    fn environment_key_wins_over_file() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "FILE_KEY".into());
        cfg.env_weatherapi_key = Some("ENV_KEY".into());

        assert_eq!(cfg.provider_api_key(ProviderId::WeatherApi), Some("ENV_KEY"));
    }

    #[test]
    fn default_location_is_validated() {
        let mut cfg = Config::default();

        assert_eq!(cfg.set_default_location("95", "0"), Err(ValidationError::LatitudeRange));
        assert!(cfg.location.is_none());

        cfg.set_default_location(" 52.52", "13.41 ").unwrap();
        assert_eq!(
            cfg.location,
            Some(DefaultLocation { latitude: "52.52".into(), longitude: "13.41".into() })
        );
    }

    #[test]
    fn parses_full_file() {
        let cfg: Config = toml::from_str(
            r#"
            default_provider = "weatherapi"
            error_dismissal = "cancel-pending"

            [location]
            latitude = "48.85"
            longitude = "2.35"

            [providers.weatherapi]
            api_key = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::WeatherApi);
        assert_eq!(cfg.error_dismissal, ErrorDismissal::CancelPending);
        assert_eq!(cfg.location.unwrap().longitude, "2.35");
        assert_eq!(cfg.providers["weatherapi"].api_key, "abc");
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.error_dismissal, ErrorDismissal::Independent);
        assert!(cfg.location.is_none());
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn save_and_load_roundtrip_skips_env_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "FILE_KEY".into());
        cfg.env_weatherapi_key = Some("ENV_KEY".into());
        cfg.set_default_location("1.5", "-2.5").unwrap();
        cfg.save_to(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("ENV_KEY"));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.provider_api_key(ProviderId::WeatherApi), Some("FILE_KEY"));
        assert_eq!(loaded.location, cfg.location);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.default_provider.is_none());
    }
}
