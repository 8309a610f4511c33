use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;
use crate::scrape::parser::CompiledSelectors;

/// Validated configuration handed to the collaborators at startup.
/// Everything fallible about the config file is rejected here, before
/// the scheduling loop begins.
#[derive(Debug)]
pub struct Config {
    pub telegram: Telegram,
    pub page: Page,
    pub selectors: Selectors,
    pub schedule: Schedule,
    pub store_path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Telegram {
    pub bot_token: SecretString,
    pub chat_id: String,
}

#[derive(Debug)]
pub struct Page {
    pub base_url: Url,
    pub listing_url: Url,
}

#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub notify_delay: Duration,
}

/// CSS selectors for carving product records out of the listing page.
/// All optional in the file; the defaults match the storefront theme
/// this tool was originally written against.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Container grouping one product's name, price, and link
    pub container: String,
    /// Anchor tags searched for the product link
    pub link: String,
    /// Substring an anchor's href must contain to count as the product link
    pub link_substring: String,
    /// Product name element within the container
    pub name: String,
    /// Sale price element, tried first
    pub price_sale: String,
    /// Wrapper around the regular price, tried when no sale price exists
    pub price_regular_wrap: String,
    /// Regular price element within the wrapper
    pub price_regular: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Selectors {
            container: "div.card-information".to_string(),
            link: "a".to_string(),
            link_substring: "/products/".to_string(),
            name: "a.card-title".to_string(),
            price_sale: "span.price-item--sale".to_string(),
            price_regular_wrap: "div.price__regular".to_string(),
            price_regular: "span.price-item--regular".to_string(),
        }
    }
}

// Raw shape of the config file. Resolved into `Config` after
// validation so the rest of the crate only sees typed values.
#[derive(Deserialize)]
struct RawConfig {
    telegram: RawTelegram,
    page: RawPage,
    #[serde(default)]
    selectors: Selectors,
    #[serde(default)]
    schedule: RawSchedule,
    #[serde(default)]
    store: RawStore,
}

#[derive(Deserialize)]
struct RawTelegram {
    bot_token: String,
    chat_id: String,
}

#[derive(Deserialize)]
struct RawPage {
    base_url: String,
    listing_url: String,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawSchedule {
    min_interval: String,
    max_interval: String,
    notify_delay: String,
}

impl Default for RawSchedule {
    fn default() -> Self {
        RawSchedule {
            min_interval: "2m".to_string(),
            max_interval: "5m".to_string(),
            notify_delay: "1s".to_string(),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawStore {
    path: Option<PathBuf>,
}

impl Config {
    /// Load and validate the config file, using the platform config dir
    /// (~/.config/dropwatch/config.toml or equivalent) when no explicit
    /// path is given.
    pub fn load(override_path: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match override_path {
            Some(p) => p.to_path_buf(),
            None => default_path()?,
        };

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        Config::from_toml(&text, &path)
    }

    fn from_toml(text: &str, path: &Path) -> Result<Config, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        raw.resolve()
    }
}

fn default_path() -> Result<PathBuf, ConfigError> {
    let dirs = directories::ProjectDirs::from("", "", "dropwatch")
        .ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().join("config.toml"))
}

impl RawConfig {
    fn resolve(self) -> Result<Config, ConfigError> {
        // refuse to start against template credentials, a half-filled
        // config would otherwise fail on every telegram send
        let token = self.telegram.bot_token.trim();
        if token.is_empty() || token.contains("YOUR_BOT_TOKEN") {
            return Err(ConfigError::PlaceholderToken);
        }
        let chat_id = self.telegram.chat_id.trim();
        if chat_id.is_empty() || chat_id.contains("YOUR_CHAT_ID") {
            return Err(ConfigError::PlaceholderChatId);
        }

        let base_url = parse_url(&self.page.base_url, "page.base_url")?;
        let listing_url = parse_url(&self.page.listing_url, "page.listing_url")?;

        let min_interval = parse_duration(&self.schedule.min_interval, "schedule.min_interval")?;
        let max_interval = parse_duration(&self.schedule.max_interval, "schedule.max_interval")?;
        let notify_delay = parse_duration(&self.schedule.notify_delay, "schedule.notify_delay")?;

        if min_interval.is_zero() || max_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if min_interval > max_interval {
            return Err(ConfigError::IntervalOrder);
        }

        // compile once to surface bad css before the loop starts
        CompiledSelectors::compile(&self.selectors)?;

        Ok(Config {
            telegram: Telegram {
                bot_token: SecretString::from(self.telegram.bot_token),
                chat_id: self.telegram.chat_id,
            },
            page: Page {
                base_url,
                listing_url,
            },
            selectors: self.selectors,
            schedule: Schedule {
                min_interval,
                max_interval,
                notify_delay,
            },
            store_path: self.store.path,
        })
    }
}

fn parse_url(text: &str, field: &'static str) -> Result<Url, ConfigError> {
    Url::parse(text).map_err(|source| ConfigError::Url { field, source })
}

fn parse_duration(text: &str, field: &'static str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(text).map_err(|source| ConfigError::Duration { field, source })
}
