// src/config.rs
// =============================================================================
// Loads and validates the JSON configuration file.
//
// Default location: $HOME/.config/geodiff/config.json
//
// {
//   "countries": ["cn", "in", "us", "jp", "de"],
//   "proxy": { "host": "...", "port": "...", "username": "...", "password": "..." }
// }
//
// If the file does not exist we write a template there and stop, so the user
// can fill in real proxy credentials before anything is requested.
// =============================================================================

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Host used in the generated template, never a real proxy.
const PLACEHOLDER_HOST: &str = "example.com";

const DEFAULT_COUNTRIES: [&str; 5] = ["cn", "in", "us", "jp", "de"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the home directory")]
    NoHomeDir,

    #[error("creating config directory {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("writing default config to {}", .path.display())]
    WriteDefault {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("serializing default config for {}", .path.display())]
    SerializeDefault {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("default config created at {}, update it with your proxy credentials", .path.display())]
    DefaultCreated { path: PathBuf },

    #[error("config at {} still uses the default proxy credentials", .path.display())]
    DefaultCredentials { path: PathBuf },

    #[error("proxy host is still the placeholder {}", PLACEHOLDER_HOST)]
    PlaceholderHost,

    #[error("no countries specified")]
    NoCountries,

    #[error("invalid country code: {0} (must be 2 letters)")]
    InvalidCountry(String),

    #[error("proxy {0} is required")]
    MissingProxyField(&'static str),

    #[error("invalid proxy port: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub countries: Vec<String>,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            proxy: ProxyConfig {
                host: PLACEHOLDER_HOST.to_string(),
                port: "12345".to_string(),
                username: "username".to_string(),
                password: "password".to_string(),
            },
        }
    }
}

impl Config {
    /// Loads the config from `path`, or from the default location when None.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_path()?,
        };

        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config file not found, creating default config");
                write_default(&path)?;
                return Err(ConfigError::DefaultCreated { path });
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let config: Config = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        if let Err(e) = config.validate() {
            if matches!(e, ConfigError::PlaceholderHost) {
                warn!(path = %path.display(), "looks like the default proxy credentials are still in place");
                return Err(ConfigError::DefaultCredentials { path });
            }
            return Err(e);
        }
        Ok(config)
    }

    /// Checks countries first, then the proxy fields in order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_countries(&self.countries)?;

        let proxy = &self.proxy;
        if proxy.host.is_empty() {
            return Err(ConfigError::MissingProxyField("host"));
        }
        if proxy.host == PLACEHOLDER_HOST {
            return Err(ConfigError::PlaceholderHost);
        }
        if proxy.port.is_empty() {
            return Err(ConfigError::MissingProxyField("port"));
        }
        if proxy.port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidPort(proxy.port.clone()));
        }
        if proxy.username.is_empty() {
            return Err(ConfigError::MissingProxyField("username"));
        }
        if proxy.password.is_empty() {
            return Err(ConfigError::MissingProxyField("password"));
        }

        Ok(())
    }
}

/// Every country must be a two letter code; there must be at least one.
pub fn validate_countries(countries: &[String]) -> Result<(), ConfigError> {
    if countries.is_empty() {
        return Err(ConfigError::NoCountries);
    }

    for country in countries {
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidCountry(country.clone()));
        }
    }

    Ok(())
}

pub fn default_path() -> Result<PathBuf, ConfigError> {
    let dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDir)?;
    Ok(dirs
        .home_dir()
        .join(".config")
        .join(env!("CARGO_PKG_NAME"))
        .join("config.json"))
}

fn write_default(path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let data = serde_json::to_string_pretty(&Config::default()).map_err(|source| ConfigError::SerializeDefault {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, data).map_err(|source| ConfigError::WriteDefault {
        path: path.to_path_buf(),
        source,
    })
}
