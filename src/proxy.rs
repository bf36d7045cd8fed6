// src/proxy.rs
// =============================================================================
// Builds the proxy URL used to route a request through a given country.
//
// Geo-targeting proxy providers pick the exit country from the username:
//   http://<username>-country-<cc>:<password>@<host>:<port>
//
// The checker only sees the ProxyProvider trait, so tests can swap in a fake
// provider (or one that always fails).
// =============================================================================

use thiserror::Error;
use url::Url;

use crate::config::ProxyConfig;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid proxy address: {0}")]
    InvalidAddress(#[from] url::ParseError),

    #[error("proxy address {0} cannot carry credentials")]
    CannotCarryCredentials(String),
}

/// Resolves the proxy to use for a country.
pub trait ProxyProvider: Send + Sync {
    fn url_for(&self, country: &str) -> Result<Url, ProxyError>;
}

/// Username-based country targeting in front of a single proxy endpoint.
#[derive(Debug, Clone)]
pub struct GeoProxy {
    host: String,
    port: String,
    username: String,
    password: String,
}

impl GeoProxy {
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        GeoProxy {
            host: host.into(),
            port: port.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    fn username_for(&self, country: &str) -> String {
        if country.is_empty() {
            self.username.clone()
        } else {
            format!("{}-country-{}", self.username, country)
        }
    }
}

impl From<&ProxyConfig> for GeoProxy {
    fn from(config: &ProxyConfig) -> Self {
        GeoProxy::new(
            config.host.as_str(),
            config.port.as_str(),
            config.username.as_str(),
            config.password.as_str(),
        )
    }
}

impl ProxyProvider for GeoProxy {
    fn url_for(&self, country: &str) -> Result<Url, ProxyError> {
        let address = format!("http://{}:{}", self.host, self.port);
        let mut url = Url::parse(&address)?;

        // set_username/set_password percent-encode for us
        url.set_username(&self.username_for(country))
            .map_err(|_| ProxyError::CannotCarryCredentials(address.clone()))?;
        url.set_password(Some(&self.password))
            .map_err(|_| ProxyError::CannotCarryCredentials(address))?;

        Ok(url)
    }
}
