//! Runtime settings resolved from builder values, the environment and defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::catalog::{
    CatalogClient, CatalogClientBuilder, CatalogError, DEFAULT_API_URL, DEFAULT_UPLOADS_URL,
    RetryPolicy,
};

const DEFAULT_RETRY_ATTEMPTS: usize = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_PACING_MS: u64 = 250;

/// Errors raised while resolving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}'")]
    InvalidVar { name: &'static str, value: String },

    #[error("Failed to determine data directory; set MANGENRE_DATA_DIR")]
    NoDataDir,
}

/// Resolved settings for one process.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub uploads_url: String,
    /// Root for the corpus, image cache and model artifacts.
    pub data_dir: PathBuf,
    pub retry: RetryPolicy,
    /// Pause between dataset builder items.
    pub pacing: Duration,
}

impl Settings {
    /// Resolves every setting from the environment and defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        SettingsBuilder::new().build()
    }

    pub fn corpus_path(&self) -> PathBuf {
        self.data_dir.join("manga_dataset.csv")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    /// Cover images captured during dataset builds.
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    /// Cover thumbnails fetched for lookups.
    pub fn covers_dir(&self) -> PathBuf {
        self.data_dir.join("covers")
    }

    /// A catalog client pointed at the configured hosts.
    pub fn catalog_client(&self) -> Result<CatalogClient, CatalogError> {
        CatalogClientBuilder::new()
            .base_url(&self.api_url)
            .uploads_url(&self.uploads_url)
            .retry(self.retry)
            .build()
    }
}

/// Builder for [`Settings`].
///
/// Each field takes the explicit value if set, else its `MANGENRE_*`
/// environment variable, else the default.
///
/// # Examples
///
/// ```
/// use mangenre::config::SettingsBuilder;
///
/// let settings = SettingsBuilder::new()
///     .api_url("http://localhost:8080")
///     .data_dir("/tmp/mangenre")
///     .build()
///     .unwrap();
/// assert_eq!(settings.api_url, "http://localhost:8080");
/// assert_eq!(settings.models_dir(), std::path::Path::new("/tmp/mangenre/models"));
/// ```
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    api_url: Option<String>,
    uploads_url: Option<String>,
    data_dir: Option<PathBuf>,
    retry_attempts: Option<usize>,
    retry_delay: Option<Duration>,
    pacing: Option<Duration>,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn uploads_url(mut self, url: impl Into<String>) -> Self {
        self.uploads_url = Some(url.into());
        self
    }

    pub fn data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn retry_attempts(mut self, attempts: usize) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.pacing = Some(pacing);
        self
    }

    pub fn build(self) -> Result<Settings, ConfigError> {
        let api_url = self
            .api_url
            .unwrap_or_else(|| env_or("MANGENRE_API_URL", DEFAULT_API_URL));
        let uploads_url = self
            .uploads_url
            .unwrap_or_else(|| env_or("MANGENRE_UPLOADS_URL", DEFAULT_UPLOADS_URL));

        let data_dir = match self.data_dir {
            Some(dir) => dir,
            None => match std::env::var("MANGENRE_DATA_DIR") {
                Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
                _ => dirs::data_dir()
                    .ok_or(ConfigError::NoDataDir)?
                    .join("mangenre"),
            },
        };

        let attempts = match self.retry_attempts {
            Some(n) => n,
            None => env_parse("MANGENRE_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS)?,
        };
        let delay = match self.retry_delay {
            Some(d) => d,
            None => Duration::from_millis(env_parse("MANGENRE_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS)?),
        };
        let pacing = match self.pacing {
            Some(p) => p,
            None => Duration::from_millis(env_parse("MANGENRE_PACING_MS", DEFAULT_PACING_MS)?),
        };

        Ok(Settings {
            api_url,
            uploads_url,
            data_dir,
            retry: RetryPolicy::new(attempts, delay),
            pacing,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidVar { name, value }),
        Err(_) => Ok(default),
    }
}
