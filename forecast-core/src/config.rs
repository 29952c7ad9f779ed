use anyhow::{Context, Result, anyhow};
use chrono::Locale;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";
pub const DEFAULT_LOCALE: &str = "en_US";

pub const ENV_API_KEY: &str = "WEATHERAPI_KEY";
pub const ENV_BASE_URL: &str = "WEATHERAPI_BASE_URL";
pub const ENV_LOCALE: &str = "FORECAST_LOCALE";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// locale = "ru_RU"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// weatherapi.com key.
    pub api_key: Option<String>,

    /// Overrides the API endpoint, mostly useful against a local mock.
    pub base_url: Option<String>,

    /// chrono locale name used for date labels, e.g. "en_US".
    pub locale: Option<String>,

    /// Per-run values from the environment or command line. Never saved.
    #[serde(skip)]
    pub(crate) overrides: Overrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Overrides {
    api_key: Option<String>,
    base_url: Option<String>,
    locale: Option<String>,
}

impl Config {
    /// Load config from disk (or defaults on first run) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load config from `path`, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
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

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "forecast", "forecast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Non-empty values returned by `lookup` win over what the file says,
    /// for this run only: [`Config::save`] still writes the file values.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_API_KEY) {
            self.overrides.api_key = Some(key);
        }
        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.overrides.base_url = Some(url);
        }
        if let Some(locale) = non_empty(ENV_LOCALE) {
            self.overrides.locale = Some(locale);
        }
    }

    /// Use `locale` for this run without touching the stored value.
    pub fn override_locale(&mut self, locale: &str) -> Result<()> {
        parse_locale(locale)?;
        self.overrides.locale = Some(locale.to_string());
        Ok(())
    }

    pub fn api_key(&self) -> Result<&str> {
        let key = self.overrides.api_key.as_deref().or(self.api_key.as_deref());
        key.filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No weatherapi.com API key configured.\n\
                 Hint: run `forecast configure` or set {ENV_API_KEY}."
            )
        })
    }

    pub fn base_url(&self) -> &str {
        self.overrides
            .base_url
            .as_deref()
            .or(self.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    /// The configured date locale, `en_US` when unset.
    pub fn locale(&self) -> Result<Locale> {
        let name = self.overrides.locale.as_deref().or(self.locale.as_deref());
        parse_locale(name.unwrap_or(DEFAULT_LOCALE))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Validates `locale` before storing it.
    pub fn set_locale(&mut self, locale: &str) -> Result<()> {
        parse_locale(locale)?;
        self.locale = Some(locale.to_string());
        Ok(())
    }
}

pub fn parse_locale(name: &str) -> Result<Locale> {
    Locale::try_from(name).map_err(|_| {
        anyhow!("Unknown locale '{name}'. Expected a name such as \"en_US\" or \"ru_RU\".")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn api_key_errors_with_hint_when_not_set() {
        let cfg = Config::default();
        let msg = cfg.api_key().unwrap_err().to_string();

        assert!(msg.contains("No weatherapi.com API key configured"));
        assert!(msg.contains("forecast configure"));
        assert!(msg.contains(ENV_API_KEY));
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = Config::default();

        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert_eq!(cfg.locale().expect("default locale"), Locale::en_US);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config {
            api_key: Some("FILE_KEY".into()),
            locale: Some("en_US".into()),
            ..Default::default()
        };
        let env: HashMap<&str, &str> =
            [(ENV_API_KEY, "ENV_KEY"), (ENV_LOCALE, "ru_RU")].into_iter().collect();

        cfg.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(cfg.api_key().expect("key"), "ENV_KEY");
        assert_eq!(cfg.locale().expect("locale"), Locale::ru_RU);
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        // File values are untouched.
        assert_eq!(cfg.api_key.as_deref(), Some("FILE_KEY"));
        assert_eq!(cfg.locale.as_deref(), Some("en_US"));
    }

    #[test]
    fn env_overrides_are_not_saved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        Config { api_key: Some("FILE_KEY".into()), ..Default::default() }
            .save_to(&path)
            .expect("save");

        let mut cfg = Config::load_from(&path).expect("load");
        cfg.apply_overrides(|name| match name {
            ENV_BASE_URL => Some("http://127.0.0.1:9/mock".to_string()),
            ENV_API_KEY => Some("ENV_KEY".to_string()),
            ENV_LOCALE => Some("ru_RU".to_string()),
            _ => None,
        });
        assert_eq!(cfg.base_url(), "http://127.0.0.1:9/mock");
        cfg.set_locale("en_GB").expect("known locale");
        cfg.save_to(&path).expect("save");

        let reloaded = Config::load_from(&path).expect("reload");
        assert_eq!(reloaded.base_url(), DEFAULT_BASE_URL);
        assert_eq!(reloaded.api_key().expect("key"), "FILE_KEY");
        assert_eq!(reloaded.locale().expect("locale"), Locale::en_GB);

        let contents = fs::read_to_string(&path).expect("read");
        assert!(!contents.contains("mock"));
        assert!(!contents.contains("ENV_KEY"));
    }

    #[test]
    fn override_locale_wins_for_this_run_only() {
        let mut cfg = Config::default();
        cfg.apply_overrides(|name| (name == ENV_LOCALE).then(|| "ru_RU".to_string()));

        assert!(cfg.override_locale("bogus").is_err());
        cfg.override_locale("en_GB").expect("known locale");

        assert_eq!(cfg.locale().expect("locale"), Locale::en_GB);
        assert_eq!(cfg.locale, None);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = Config { api_key: Some("FILE_KEY".into()), ..Default::default() };

        cfg.apply_overrides(|_| Some("   ".to_string()));

        assert_eq!(cfg.api_key().expect("key"), "FILE_KEY");
        assert_eq!(cfg.base_url, None);
    }

    #[test]
    fn set_locale_rejects_unknown_names() {
        let mut cfg = Config::default();

        let err = cfg.set_locale("xx_NOPE").unwrap_err();
        assert!(err.to_string().contains("Unknown locale"));
        assert_eq!(cfg.locale, None);

        cfg.set_locale("ru_RU").expect("ru_RU is a known locale");
        assert_eq!(cfg.locale.as_deref(), Some("ru_RU"));
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("SAVED".into());
        cfg.set_locale("en_GB").expect("known locale");
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = Config::load_from(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").expect("write");

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
