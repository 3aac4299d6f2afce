use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::ConfigError;
use crate::filter::{FilterPolicy, UnknownDurationPolicy};
use crate::retry::RetryPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "gallery.env";
pub const DEFAULT_CHANNEL_ID: &str = "UCLh7D6zXWhTrE_ELl0k55bQ";
pub const DEFAULT_API_BASE: &str = "https://youtube.googleapis.com/youtube/v3";
pub const DEFAULT_OUTPUT_PATH: &str = "public/index.html";
pub const DEFAULT_PAGE_TITLE: &str = "Sermon Recordings";
pub const DEFAULT_SEARCH_RESULTS: u32 = 50;
/// Upper bound the search endpoint accepts for `maxResults`.
pub const MAX_SEARCH_RESULTS: u32 = 50;

const API_KEY: &str = "YT_API_KEY";
const CHANNEL_ID: &str = "YT_CHANNEL_ID";
const SEARCH_RESULTS: &str = "GALLERY_SEARCH_RESULTS";
const DESIRED_COUNT: &str = "GALLERY_DESIRED_COUNT";
const SHORT_THRESHOLD: &str = "GALLERY_SHORT_THRESHOLD";
const UNKNOWN_DURATION: &str = "GALLERY_UNKNOWN_DURATION";
const OUTPUT: &str = "GALLERY_OUTPUT";
const TITLE: &str = "GALLERY_TITLE";
const API_BASE: &str = "GALLERY_API_BASE";
const RETRIES: &str = "GALLERY_RETRIES";
const HTTP_TIMEOUT: &str = "GALLERY_HTTP_TIMEOUT_SECS";

/// Raw values as read from the env file or the process environment. Nothing
/// is validated until [`GalleryConfig::from_env_config`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub api_key: Option<String>,
    pub channel_id: Option<String>,
    pub search_results: Option<String>,
    pub desired_count: Option<String>,
    pub short_threshold: Option<String>,
    pub unknown_duration: Option<String>,
    pub output: Option<String>,
    pub title: Option<String>,
    pub api_base: Option<String>,
    pub retries: Option<String>,
    pub http_timeout: Option<String>,
}

impl EnvConfig {
    fn slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        let slot = match key {
            API_KEY => &mut self.api_key,
            CHANNEL_ID => &mut self.channel_id,
            SEARCH_RESULTS => &mut self.search_results,
            DESIRED_COUNT => &mut self.desired_count,
            SHORT_THRESHOLD => &mut self.short_threshold,
            UNKNOWN_DURATION => &mut self.unknown_duration,
            OUTPUT => &mut self.output,
            TITLE => &mut self.title,
            API_BASE => &mut self.api_base,
            RETRIES => &mut self.retries,
            HTTP_TIMEOUT => &mut self.http_timeout,
            _ => return None,
        };
        Some(slot)
    }

    /// Parses `KEY="value"` lines. Blank lines, comments and unknown keys are
    /// skipped; empty values leave the key unset.
    pub fn parse(content: &str) -> Self {
        let mut cfg = EnvConfig::default();
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Some((key, value_raw)) = trimmed.split_once('=') {
                let value = value_raw.trim().trim_matches('"');
                if value.is_empty() {
                    continue;
                }
                if let Some(slot) = cfg.slot(key.trim()) {
                    *slot = Some(value.to_string());
                }
            }
        }
        cfg
    }

    /// Collects every known key from a lookup such as `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = EnvConfig::default();
        for key in [
            API_KEY,
            CHANNEL_ID,
            SEARCH_RESULTS,
            DESIRED_COUNT,
            SHORT_THRESHOLD,
            UNKNOWN_DURATION,
            OUTPUT,
            TITLE,
            API_BASE,
            RETRIES,
            HTTP_TIMEOUT,
        ] {
            if let Some(value) = lookup(key).filter(|value| !value.is_empty())
                && let Some(slot) = cfg.slot(key)
            {
                *slot = Some(value);
            }
        }
        cfg
    }

    /// Returns `self` with every value set in `other` taking precedence.
    pub fn overlay(self, other: EnvConfig) -> Self {
        EnvConfig {
            api_key: other.api_key.or(self.api_key),
            channel_id: other.channel_id.or(self.channel_id),
            search_results: other.search_results.or(self.search_results),
            desired_count: other.desired_count.or(self.desired_count),
            short_threshold: other.short_threshold.or(self.short_threshold),
            unknown_duration: other.unknown_duration.or(self.unknown_duration),
            output: other.output.or(self.output),
            title: other.title.or(self.title),
            api_base: other.api_base.or(self.api_base),
            retries: other.retries.or(self.retries),
            http_timeout: other.http_timeout.or(self.http_timeout),
        }
    }
}

/// Everything a build needs, resolved once at startup and passed down
/// explicitly.
#[derive(Clone)]
pub struct GalleryConfig {
    pub api_key: String,
    pub channel_id: String,
    pub search_results: u32,
    pub filter: FilterPolicy,
    pub output_path: PathBuf,
    pub page_title: String,
    pub api_base: String,
    pub retry: RetryPolicy,
    pub http_timeout: Option<Duration>,
}

impl fmt::Debug for GalleryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GalleryConfig")
            .field("api_key", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("search_results", &self.search_results)
            .field("filter", &self.filter)
            .field("output_path", &self.output_path)
            .field("page_title", &self.page_title)
            .field("api_base", &self.api_base)
            .field("retry", &self.retry)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl GalleryConfig {
    /// Validates raw values and fills in defaults.
    pub fn from_env_config(cfg: EnvConfig) -> Result<Self, ConfigError> {
        let api_key = cfg
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let channel_id = cfg
            .channel_id
            .unwrap_or_else(|| DEFAULT_CHANNEL_ID.to_string());
        if channel_id.trim().is_empty() {
            return Err(ConfigError::Empty { key: CHANNEL_ID });
        }

        let search_results = parse_number(SEARCH_RESULTS, cfg.search_results.as_deref())?
            .unwrap_or(DEFAULT_SEARCH_RESULTS)
            .clamp(1, MAX_SEARCH_RESULTS);

        let defaults = FilterPolicy::default();
        let filter = FilterPolicy {
            short_threshold_secs: parse_number(SHORT_THRESHOLD, cfg.short_threshold.as_deref())?
                .unwrap_or(defaults.short_threshold_secs),
            unknown_duration: match cfg.unknown_duration.as_deref() {
                Some(value) => {
                    value
                        .parse::<UnknownDurationPolicy>()
                        .map_err(|_| ConfigError::Invalid {
                            key: UNKNOWN_DURATION,
                            value: value.to_string(),
                        })?
                }
                None => defaults.unknown_duration,
            },
            max_count: parse_number(DESIRED_COUNT, cfg.desired_count.as_deref())?
                .unwrap_or(defaults.max_count),
        };

        let retry = RetryPolicy {
            max_retries: parse_number(RETRIES, cfg.retries.as_deref())?.unwrap_or(0),
            ..RetryPolicy::default()
        };
        let http_timeout = parse_number::<u64>(HTTP_TIMEOUT, cfg.http_timeout.as_deref())?
            .map(Duration::from_secs);

        Ok(GalleryConfig {
            api_key,
            channel_id,
            search_results,
            filter,
            output_path: PathBuf::from(cfg.output.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)),
            page_title: cfg.title.unwrap_or_else(|| DEFAULT_PAGE_TITLE.to_string()),
            api_base: cfg
                .api_base
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            retry,
            http_timeout,
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    key: &'static str,
    value: Option<&str>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
                key,
                value: raw.to_string(),
            })
        })
        .transpose()
}

pub fn read_env_config(path: &Path) -> Result<Option<EnvConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(EnvConfig::parse(&content)))
}

pub fn load_config() -> Result<GalleryConfig, ConfigError> {
    load_config_from(DEFAULT_CONFIG_PATH)
}

/// Reads the optional env file at `path`, lets the process environment
/// override it, and validates the result.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<GalleryConfig, ConfigError> {
    let file = read_env_config(path.as_ref())?.unwrap_or_default();
    let process = EnvConfig::from_lookup(|key| std::env::var(key).ok());
    GalleryConfig::from_env_config(file.overlay(process))
}
