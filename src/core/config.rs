use crate::core::currency::is_valid_code;
use crate::core::normalize::DEFAULT_SPREAD;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{debug, warn};

/// Default source order: commercial API first, then the central bank feed.
pub const DEFAULT_PRIORITY: [&str; 3] = ["exchangerate_api", "tcmb", "fixer"];

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FixerConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub access_key: Option<String>,
}

impl Default for FixerConfig {
    fn default() -> Self {
        FixerConfig {
            url: "https://api.fixer.io".to_string(),
            timeout_secs: 12,
            access_key: None,
        }
    }
}

// access_key stays out of debug logs
impl std::fmt::Debug for FixerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixerConfig")
            .field("url", &self.url)
            .field("timeout_secs", &self.timeout_secs)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl FixerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub tcmb: SourceConfig,
    pub exchangerate_api: SourceConfig,
    pub fixer: FixerConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            url: String::new(),
            timeout_secs: 12,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            tcmb: SourceConfig {
                url: "https://www.tcmb.gov.tr/kurlar/today.xml".to_string(),
                timeout_secs: 15,
            },
            exchangerate_api: SourceConfig {
                url: "https://api.exchangerate-api.com".to_string(),
                timeout_secs: 12,
            },
            fixer: FixerConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub domestic_currency: String,
    pub cache_ttl_secs: u64,
    /// Symmetric spread synthesized around midpoint-only quotes.
    pub spread: f64,
    /// Source ids, highest priority first.
    pub priority: Vec<String>,
    pub sources: SourcesConfig,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            domestic_currency: "TRY".to_string(),
            cache_ttl_secs: 30 * 60,
            spread: DEFAULT_SPREAD,
            priority: DEFAULT_PRIORITY.iter().map(|s| s.to_string()).collect(),
            sources: SourcesConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        warn!("Ignoring unparsable value for {}: '{}'", key, value);
    }
    parsed
}

impl AppConfig {
    /// Loads the configuration at the default path, or built-in defaults when
    /// no file exists there. Environment overrides are applied either way.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let mut config = if config_path.exists() {
            Self::read_file(&config_path)?
        } else {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "kurlar", "kurlar")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let mut config = Self::read_file(path.as_ref())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &std::path::Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Applies `KURLAR_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("KURLAR_DOMESTIC_CURRENCY") {
            self.domestic_currency = v.trim().to_uppercase();
        }
        if let Some(v) = lookup("KURLAR_CACHE_TTL_SECS")
            && let Some(ttl) = parse_or_warn("KURLAR_CACHE_TTL_SECS", &v)
        {
            self.cache_ttl_secs = ttl;
        }
        if let Some(v) = lookup("KURLAR_SPREAD")
            && let Some(spread) = parse_or_warn("KURLAR_SPREAD", &v)
        {
            self.spread = spread;
        }
        if let Some(v) = lookup("KURLAR_PRIORITY") {
            self.priority = v
                .split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect();
        }
        if let Some(v) = lookup("KURLAR_TIMEOUT_SECS")
            && let Some(secs) = parse_or_warn::<u64>("KURLAR_TIMEOUT_SECS", &v)
        {
            self.sources.tcmb.timeout_secs = secs;
            self.sources.exchangerate_api.timeout_secs = secs;
            self.sources.fixer.timeout_secs = secs;
        }
        if let Some(v) = lookup("KURLAR_TCMB_URL") {
            self.sources.tcmb.url = v;
        }
        if let Some(v) = lookup("KURLAR_EXCHANGERATE_API_URL") {
            self.sources.exchangerate_api.url = v;
        }
        if let Some(v) = lookup("KURLAR_FIXER_URL") {
            self.sources.fixer.url = v;
        }
        if let Some(v) = lookup("KURLAR_FIXER_ACCESS_KEY") {
            self.sources.fixer.access_key = Some(v).filter(|k| !k.is_empty());
        }
        if let Some(v) = lookup("KURLAR_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("KURLAR_PORT")
            && let Some(port) = parse_or_warn("KURLAR_PORT", &v)
        {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_code(&self.domestic_currency) {
            bail!(
                "Invalid domestic currency code: '{}'",
                self.domestic_currency
            );
        }
        if !(0.0..0.5).contains(&self.spread) {
            bail!("Spread must be within [0, 0.5), got {}", self.spread);
        }
        let timeouts = [
            ("tcmb", self.sources.tcmb.timeout_secs),
            ("exchangerate_api", self.sources.exchangerate_api.timeout_secs),
            ("fixer", self.sources.fixer.timeout_secs),
        ];
        for (id, secs) in timeouts {
            if secs == 0 {
                bail!("Timeout for source '{}' must be positive", id);
            }
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
