use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::llm::RetryConfig;
use crate::llm::openai::DEFAULT_OPENAI_BASE_URL;
use crate::llm::toolhouse::DEFAULT_TOOLHOUSE_BASE_URL;
use crate::shop::ShopLinks;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BUNDLE: &str = "my-app";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileConfig {
    pub model: Option<String>,
    pub bundle: Option<String>,
    pub timeout: Option<u64>,
    pub retries: Option<u32>,
    pub retry_delay: Option<u64>,
    pub openai_base_url: Option<String>,
    pub toolhouse_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
    shop_links: Option<HashMap<String, String>>,
}

/// Values given on the command line; `None` falls through to the
/// environment, then the profile, then built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub profile: Option<String>,
    pub model: Option<String>,
    pub bundle: Option<String>,
    pub timeout: Option<u64>,
    pub retries: Option<u32>,
    pub retry_delay: Option<u64>,
}

/// Fully resolved settings for one designer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub model: String,
    pub bundle: String,
    pub retry: RetryConfig,
    pub openai_base_url: String,
    pub toolhouse_base_url: String,
}

impl Settings {
    pub fn resolve(cli: &CliOverrides) -> Result<Self, String> {
        let profile = match cli.profile.as_deref() {
            Some(name) => load_profile(name)?,
            None => ProfileConfig::default(),
        };

        let model = cli
            .model
            .clone()
            .or_else(|| env_string("ROOMGEN_MODEL"))
            .or(profile.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let bundle = cli
            .bundle
            .clone()
            .or_else(|| env_string("ROOMGEN_BUNDLE"))
            .or(profile.bundle)
            .unwrap_or_else(|| DEFAULT_BUNDLE.to_string());

        let defaults = RetryConfig::default();
        let timeout_secs = match cli.timeout {
            Some(value) => Some(value),
            None => env_number("ROOMGEN_TIMEOUT")?.or(profile.timeout),
        };
        let retries = match cli.retries {
            Some(value) => value,
            None => env_number("ROOMGEN_RETRIES")?
                .or(profile.retries)
                .unwrap_or(defaults.retries),
        };
        let retry_delay_ms = match cli.retry_delay {
            Some(value) => value,
            None => env_number("ROOMGEN_RETRY_DELAY")?
                .or(profile.retry_delay)
                .unwrap_or(defaults.retry_delay_ms),
        };

        if model.trim().is_empty() {
            return Err("Model must not be empty.".to_string());
        }
        if bundle.trim().is_empty() {
            return Err("Tool bundle must not be empty.".to_string());
        }

        Ok(Self {
            model,
            bundle,
            retry: RetryConfig {
                timeout_secs,
                retries,
                retry_delay_ms,
            },
            openai_base_url: profile
                .openai_base_url
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            toolhouse_base_url: profile
                .toolhouse_base_url
                .unwrap_or_else(|| DEFAULT_TOOLHOUSE_BASE_URL.to_string()),
        })
    }
}

pub fn load_profile(name: &str) -> Result<ProfileConfig, String> {
    let path = config_path()?;
    let config = read_config(&path)?;

    let profiles = config.profiles.ok_or_else(|| {
        format!(
            "Config file '{}' does not contain a [profiles] section.",
            path.display()
        )
    })?;

    profiles.get(name).cloned().ok_or_else(|| {
        format!(
            "Profile '{}' not found in config file '{}'.",
            name,
            path.display()
        )
    })
}

/// Shop links from the config file layered over the defaults. A missing
/// config file only means no extra links.
pub fn load_shop_links() -> Result<ShopLinks, String> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(ShopLinks::default());
    }

    let config = read_config(&path)?;
    Ok(match &config.shop_links {
        Some(extra) => ShopLinks::with_overrides(extra),
        None => ShopLinks::default(),
    })
}

/// Parses the config file and checks every profile and shop link, or only
/// `profile` when given. Returns the checked path.
pub fn validate_config(profile: Option<&str>) -> Result<PathBuf, String> {
    let path = config_path()?;
    let config = read_config(&path)?;
    let profiles = config.profiles.unwrap_or_default();

    let mut names: Vec<&String> = match profile {
        Some(name) => {
            let (key, _) = profiles.get_key_value(name).ok_or_else(|| {
                format!(
                    "Profile '{}' not found in config file '{}'.",
                    name,
                    path.display()
                )
            })?;
            vec![key]
        }
        None => profiles.keys().collect(),
    };
    names.sort();

    for name in names {
        validate_profile(name, &profiles[name])?;
    }

    if let Some(links) = &config.shop_links {
        let mut entries: Vec<_> = links.iter().collect();
        entries.sort();
        for (component, link) in entries {
            if Url::parse(link).is_err() {
                return Err(format!(
                    "Invalid shop link for '{component}': '{link}' is not a URL."
                ));
            }
        }
    }

    Ok(path)
}

fn validate_profile(name: &str, profile: &ProfileConfig) -> Result<(), String> {
    if profile.model.as_deref().is_some_and(|model| model.trim().is_empty()) {
        return Err(format!("Profile '{name}' has an empty model."));
    }
    if profile
        .bundle
        .as_deref()
        .is_some_and(|bundle| bundle.trim().is_empty())
    {
        return Err(format!("Profile '{name}' has an empty bundle."));
    }
    for (field, value) in [
        ("openai_base_url", &profile.openai_base_url),
        ("toolhouse_base_url", &profile.toolhouse_base_url),
    ] {
        if let Some(value) = value {
            if Url::parse(value).is_err() {
                return Err(format!(
                    "Invalid profile {field} '{value}' in profile '{name}'."
                ));
            }
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<ConfigFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read config file '{}': {err}", path.display()))?;

    toml::from_str(&raw)
        .map_err(|err| format!("Failed to parse config file '{}': {err}", path.display()))
}

pub fn config_path() -> Result<PathBuf, String> {
    if let Some(path) = env_string("ROOMGEN_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    if let Some(xdg) = env_string("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("roomgen").join("config.toml"));
    }

    let home = env::var("HOME").map_err(|_| {
        "Cannot resolve config path: set ROOMGEN_CONFIG or HOME/XDG_CONFIG_HOME.".to_string()
    })?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("roomgen")
        .join("config.toml"))
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_number<T: std::str::FromStr>(key: &str) -> Result<Option<T>, String> {
    match env_string(key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| format!("Invalid {key} '{raw}': expected a non-negative integer.")),
        None => Ok(None),
    }
}
