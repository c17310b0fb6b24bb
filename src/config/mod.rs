use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub cookbook: CookbookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public URL the site is reachable under, if behind a proxy
    pub base_url: Option<String>,
    pub api_rate_limit: u64,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookbookConfig {
    pub location: PathBuf,
    /// Language used when a request names none; defaults to the cookbook's largest language
    pub default_lang: Option<String>,
    pub site_name: String,
    /// Seconds between folder reloads; no reloading when unset
    pub reload_interval_seconds: Option<u64>,
}

/// Optional JSON settings file named by `COOKBOOK_CONFIG`.
///
/// Every field may be omitted; environment variables win over the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    host: Option<String>,
    port: Option<u16>,
    base_url: Option<String>,
    api_rate_limit: Option<u64>,
    max_request_body_size: Option<usize>,
    location: Option<PathBuf>,
    default_lang: Option<String>,
    site_name: Option<String>,
    reload_interval_seconds: Option<u64>,
}

impl FileSettings {
    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid {name} value")))
        })
        .transpose()
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = match lookup("COOKBOOK_CONFIG") {
            Some(path) => FileSettings::read(Path::new(&path))?,
            None => FileSettings::default(),
        };

        let host = lookup("HOST")
            .or(file.host)
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_var(&lookup, "PORT")?.or(file.port).unwrap_or(8080);
        let base_url = lookup("BASE_URL").or(file.base_url);
        let api_rate_limit = parse_var(&lookup, "API_RATE_LIMIT")?
            .or(file.api_rate_limit)
            .unwrap_or(100);
        let max_request_body_size = parse_var(&lookup, "MAX_REQUEST_BODY_SIZE")?
            .or(file.max_request_body_size)
            .unwrap_or(65536);

        let location = lookup("COOKBOOK_LOCATION")
            .map(PathBuf::from)
            .or(file.location)
            .unwrap_or_else(|| PathBuf::from("./recipes"));
        let default_lang = lookup("DEFAULT_LANG").or(file.default_lang);
        let site_name = lookup("SITE_NAME")
            .or(file.site_name)
            .unwrap_or_else(|| "Cookbook".to_string());
        let reload_interval_seconds =
            parse_var(&lookup, "RELOAD_INTERVAL")?.or(file.reload_interval_seconds);

        Ok(Settings {
            server: ServerConfig {
                host,
                port,
                base_url,
                api_rate_limit,
                max_request_body_size,
            },
            cookbook: CookbookConfig {
                location,
                default_lang,
                site_name,
                reload_interval_seconds,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("Port must be non-zero".to_string()));
        }

        if self.server.api_rate_limit == 0 {
            return Err(Error::Config("API rate limit must be non-zero".to_string()));
        }

        if let Some(base_url) = &self.server.base_url {
            url::Url::parse(base_url)
                .map_err(|e| Error::Config(format!("Invalid BASE_URL '{base_url}': {e}")))?;
        }

        if self.cookbook.reload_interval_seconds == Some(0) {
            return Err(Error::Config(
                "Reload interval must be non-zero".to_string(),
            ));
        }

        if !self.cookbook.location.is_dir() {
            return Err(Error::Config(format!(
                "Cookbook location {} is not a directory",
                self.cookbook.location.display()
            )));
        }

        Ok(())
    }
}
