//! Centralized configuration for Trove.
//!
//! All provider credentials, endpoints, timeouts and page sizes live here so
//! adapters never read the process environment themselves. The configuration
//! is built once at startup and shared read-only.

use std::time::Duration;

use url::Url;

/// Errors raised while building configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment override could not be parsed.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue {
        /// Name of the offending variable
        name: String,
        /// The raw value that was rejected
        value: String,
    },

    /// An endpoint override is not an absolute URL.
    #[error("Invalid endpoint URL for {name}: {reason}")]
    InvalidEndpoint {
        /// Name of the offending variable
        name: String,
        /// Parser error message
        reason: String,
    },
}

/// Central configuration for all Trove components.
#[derive(Debug, Clone, Default)]
pub struct TroveConfig {
    pub credentials: ProviderCredentials,
    pub endpoints: ProviderEndpoints,
    pub network: NetworkConfig,
    pub paging: PagingConfig,
}

/// API keys and secrets for every external provider.
///
/// Every field is optional. Adapters decide whether an absent secret is
/// fatal, skippable, or a trigger for degraded mode.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub naver_client_id: Option<String>,
    pub naver_client_secret: Option<String>,
    pub google_books_api_key: Option<String>,
    pub tmdb_access_token: Option<String>,
    pub rawg_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub qnet_service_key: Option<String>,
}

impl ProviderCredentials {
    /// Reads credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads credentials through an arbitrary variable lookup.
    ///
    /// Blank values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            naver_client_id: read("NAVER_CLIENT_ID"),
            naver_client_secret: read("NAVER_CLIENT_SECRET"),
            google_books_api_key: read("GOOGLE_BOOKS_API_KEY"),
            tmdb_access_token: read("TMDB_ACCESS_TOKEN"),
            rawg_api_key: read("RAWG_API_KEY"),
            spotify_client_id: read("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: read("SPOTIFY_CLIENT_SECRET"),
            qnet_service_key: read("QNET_SERVICE_KEY"),
        }
    }

    /// Naver needs both header secrets; one without the other is useless.
    pub fn naver(&self) -> Option<(&str, &str)> {
        match (&self.naver_client_id, &self.naver_client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }

    /// Spotify client-credentials pair, if both halves are configured.
    pub fn spotify(&self) -> Option<(&str, &str)> {
        match (&self.spotify_client_id, &self.spotify_client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            if value.is_some() { "<set>" } else { "<unset>" }
        }

        f.debug_struct("ProviderCredentials")
            .field("naver_client_id", &redact(&self.naver_client_id))
            .field("naver_client_secret", &redact(&self.naver_client_secret))
            .field("google_books_api_key", &redact(&self.google_books_api_key))
            .field("tmdb_access_token", &redact(&self.tmdb_access_token))
            .field("rawg_api_key", &redact(&self.rawg_api_key))
            .field("spotify_client_id", &redact(&self.spotify_client_id))
            .field("spotify_client_secret", &redact(&self.spotify_client_secret))
            .field("qnet_service_key", &redact(&self.qnet_service_key))
            .finish()
    }
}

/// Base URLs of every external provider.
///
/// Paths are appended by the adapters, so these carry scheme and host only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub naver: String,
    pub google_books: String,
    pub tmdb: String,
    pub tmdb_images: String,
    pub rawg: String,
    pub spotify: String,
    pub spotify_accounts: String,
    pub qnet: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            naver: "https://openapi.naver.com".to_string(),
            google_books: "https://www.googleapis.com".to_string(),
            tmdb: "https://api.themoviedb.org".to_string(),
            tmdb_images: "https://image.tmdb.org/t/p/w500".to_string(),
            rawg: "https://api.rawg.io".to_string(),
            spotify: "https://api.spotify.com".to_string(),
            spotify_accounts: "https://accounts.spotify.com".to_string(),
            qnet: "http://openapi.q-net.or.kr".to_string(),
        }
    }
}

impl ProviderEndpoints {
    /// Points every provider at the same base URL.
    ///
    /// Used by tests that serve all providers from a single mock server.
    pub fn all(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            naver: base.clone(),
            google_books: base.clone(),
            tmdb: base.clone(),
            tmdb_images: format!("{base}/images"),
            rawg: base.clone(),
            spotify: base.clone(),
            spotify_accounts: base.clone(),
            qnet: base,
        }
    }
}

/// HTTP behaviour shared by all adapters.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Upper bound for a single provider call
    pub provider_timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(5),
            user_agent: "trove/0.1.0",
        }
    }
}

/// Page sizes sent to each provider.
#[derive(Debug, Clone)]
pub struct PagingConfig {
    /// Naver `display` (1..=100)
    pub naver_display: u32,
    /// Google Books `maxResults` (1..=40)
    pub google_max_results: u32,
    /// RAWG `page_size`
    pub rawg_page_size: u32,
    /// Spotify `limit` (1..=50)
    pub spotify_limit: u32,
    /// Items per certificate page, registry and local store alike
    pub certificate_page_size: u32,
    /// Rows pulled from the registry before client-side filtering
    pub registry_window: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            naver_display: 20,
            google_max_results: 20,
            rawg_page_size: 20,
            spotify_limit: 20,
            certificate_page_size: 20,
            registry_window: 1000,
        }
    }
}

impl TroveConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` - A numeric override does not parse
    /// - `ConfigError::InvalidEndpoint` - An endpoint override is not a URL
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`TroveConfig::from_env`] with an injectable lookup.
    ///
    /// # Errors
    /// - `ConfigError::InvalidValue` - A numeric override does not parse
    /// - `ConfigError::InvalidEndpoint` - An endpoint override is not a URL
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            credentials: ProviderCredentials::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(raw) = lookup("TROVE_PROVIDER_TIMEOUT_SECS") {
            let seconds = parse_number::<u64>("TROVE_PROVIDER_TIMEOUT_SECS", &raw)?;
            config.network.provider_timeout = Duration::from_secs(seconds);
        }

        if let Some(raw) = lookup("TROVE_REGISTRY_WINDOW") {
            config.paging.registry_window = parse_number("TROVE_REGISTRY_WINDOW", &raw)?;
        }

        let endpoints = &mut config.endpoints;
        for (name, slot) in [
            ("TROVE_NAVER_URL", &mut endpoints.naver),
            ("TROVE_GOOGLE_BOOKS_URL", &mut endpoints.google_books),
            ("TROVE_TMDB_URL", &mut endpoints.tmdb),
            ("TROVE_RAWG_URL", &mut endpoints.rawg),
            ("TROVE_SPOTIFY_URL", &mut endpoints.spotify),
            ("TROVE_QNET_URL", &mut endpoints.qnet),
        ] {
            if let Some(raw) = lookup(name) {
                *slot = parse_endpoint(name, &raw)?;
            }
        }

        Ok(config)
    }

    /// Configuration with every provider served from one base URL.
    pub fn for_testing(base_url: &str, credentials: ProviderCredentials) -> Self {
        Self {
            credentials,
            endpoints: ProviderEndpoints::all(base_url),
            ..Self::default()
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

fn parse_endpoint(name: &str, raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEndpoint {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config_values() {
        let config = TroveConfig::default();

        assert_eq!(config.network.provider_timeout, Duration::from_secs(5));
        assert_eq!(config.paging.naver_display, 20);
        assert_eq!(config.paging.google_max_results, 20);
        assert_eq!(config.endpoints.naver, "https://openapi.naver.com");
        assert_eq!(config.credentials, ProviderCredentials::default());
    }

    #[test]
    fn test_blank_credentials_are_absent() {
        let credentials = ProviderCredentials::from_lookup(lookup_from(&[
            ("NAVER_CLIENT_ID", "id"),
            ("NAVER_CLIENT_SECRET", "   "),
            ("QNET_SERVICE_KEY", "key"),
        ]));

        assert_eq!(credentials.naver_client_id.as_deref(), Some("id"));
        assert!(credentials.naver_client_secret.is_none());
        assert!(credentials.naver().is_none());
        assert_eq!(credentials.qnet_service_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = ProviderCredentials {
            rawg_api_key: Some("super-secret".to_string()),
            ..Default::default()
        };

        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("rawg_api_key: \"<set>\""));
    }

    #[test]
    fn test_env_override() {
        let config = TroveConfig::from_lookup(lookup_from(&[
            ("TROVE_PROVIDER_TIMEOUT_SECS", "12"),
            ("TROVE_REGISTRY_WINDOW", "200"),
            ("TROVE_NAVER_URL", "http://localhost:9000/"),
        ]))
        .unwrap();

        assert_eq!(config.network.provider_timeout, Duration::from_secs(12));
        assert_eq!(config.paging.registry_window, 200);
        assert_eq!(config.endpoints.naver, "http://localhost:9000");
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let err = TroveConfig::from_lookup(lookup_from(&[("TROVE_PROVIDER_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = TroveConfig::from_lookup(lookup_from(&[("TROVE_TMDB_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_all_endpoints_share_base() {
        let endpoints = ProviderEndpoints::all("http://127.0.0.1:4000/");
        assert_eq!(endpoints.qnet, "http://127.0.0.1:4000");
        assert_eq!(endpoints.tmdb_images, "http://127.0.0.1:4000/images");
    }
}
