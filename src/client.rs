use crate::error::{CyreneError, Result};
use crate::token::GrantStrategy;
use reqwest::blocking::{Client, ClientBuilder};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Domain every Cyrene instance is hosted under
pub const CYRENE_DOMAIN: &str = "cyrene.io";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create the HTTP client used for token and protected requests
pub fn create_http_client(config: &Config) -> Result<Client> {
    let client = ClientBuilder::new()
        .pool_max_idle_per_host(50)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(concat!("cyrene/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Configuration for a Cyrene client.
///
/// Built with [`Config::new`], which validates every field; a `Config` value
/// is always usable.
#[derive(Clone)]
pub struct Config {
    base_url: Url,
    client_id: String,
    client_secret: String,
    grant: GrantStrategy,
    /// Total request timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
}

impl Config {
    /// Create a configuration for the instance `https://<short_name>.cyrene.io`
    ///
    /// # Arguments
    /// * `short_name` - Instance name, not a URL
    /// * `client_id` - OAuth2 client identifier
    /// * `client_secret` - OAuth2 client secret
    pub fn new(short_name: &str, client_id: &str, client_secret: &str) -> Result<Self> {
        let short_name = short_name.trim();
        if short_name.is_empty() {
            return Err(CyreneError::Configuration(
                "client name must not be blank".to_string(),
            ));
        }
        if short_name.starts_with("http") {
            return Err(CyreneError::Configuration(format!(
                "client name must be a short name, not a URL: {}",
                short_name
            )));
        }
        if client_id.trim().is_empty() {
            return Err(CyreneError::Configuration(
                "client id must not be blank".to_string(),
            ));
        }
        if client_secret.trim().is_empty() {
            return Err(CyreneError::Configuration(
                "client secret must not be blank".to_string(),
            ));
        }

        let base_url = parse_base_url(&format!("https://{}.{}", short_name, CYRENE_DOMAIN))?;
        let expected_host = format!("{}.{}", short_name, CYRENE_DOMAIN).to_ascii_lowercase();
        if base_url.host_str() != Some(expected_host.as_str()) {
            return Err(CyreneError::Configuration(format!(
                "client name does not form a valid host: {}",
                short_name
            )));
        }

        Ok(Config {
            base_url,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            grant: GrantStrategy::ClientCredentials,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Load the configuration from `CYRENE_*` environment variables.
    ///
    /// `CYRENE_CLIENT_NAME`, `CYRENE_CLIENT_ID` and `CYRENE_CLIENT_SECRET` are
    /// required. `CYRENE_USERNAME` and `CYRENE_PASSWORD` switch to the password
    /// grant when both are set.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::new(
            &required_env("CYRENE_CLIENT_NAME")?,
            &required_env("CYRENE_CLIENT_ID")?,
            &required_env("CYRENE_CLIENT_SECRET")?,
        )?;
        if let (Ok(username), Ok(password)) = (
            std::env::var("CYRENE_USERNAME"),
            std::env::var("CYRENE_PASSWORD"),
        ) {
            config.set_user_credentials(&username, &password);
        }
        Ok(config)
    }

    /// Point the client at another host, e.g. an on-premise install
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Set the total request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Use the password grant with the given user, see [`Config::set_user_credentials`]
    pub fn with_user_credentials(mut self, username: &str, password: &str) -> Self {
        self.set_user_credentials(username, password);
        self
    }

    /// Switch to the resource-owner password grant.
    ///
    /// Does nothing and returns `false` when either value is blank.
    pub fn set_user_credentials(&mut self, username: &str, password: &str) -> bool {
        if username.trim().is_empty() || password.trim().is_empty() {
            return false;
        }
        self.grant = GrantStrategy::ResourceOwnerPassword {
            username: username.to_string(),
            password: password.to_string(),
        };
        true
    }

    /// Get the base URL without trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Get the OAuth2 client identifier
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Get the active grant strategy
    pub fn grant(&self) -> &GrantStrategy {
        &self.grant
    }

    /// Build an absolute URL from path segments below the base URL
    pub(crate) fn endpoint<I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CyreneError::Configuration(format!("base URL cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Resolve a relative URL such as `/Main/Contacts?active=1` against the
    /// base URL. Anything that would leave the configured host is rejected.
    pub(crate) fn resolve(&self, relative_url: &str) -> Result<Url> {
        if !relative_url.starts_with('/') || relative_url.starts_with("//") {
            return Err(CyreneError::InvalidInput(format!(
                "expected a path relative to {}: {}",
                self.base_url(),
                relative_url
            )));
        }
        let url = Url::parse(&format!("{}{}", self.base_url(), relative_url))
            .map_err(|e| CyreneError::InvalidInput(format!("invalid path {}: {}", relative_url, e)))?;
        if url.origin() != self.base_url.origin() {
            return Err(CyreneError::InvalidInput(format!(
                "path leaves {}: {}",
                self.base_url(),
                relative_url
            )));
        }
        Ok(url)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("grant", &self.grant)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| CyreneError::Configuration(format!("invalid base URL {}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() || url.host().is_none() {
        return Err(CyreneError::Configuration(format!(
            "base URL must be an absolute http(s) URL: {}",
            raw
        )));
    }
    Ok(url)
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| CyreneError::Configuration(format!("environment variable {} is not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new("acme", "client-id", "client-secret").unwrap()
    }

    #[test]
    fn test_base_url_derivation() {
        assert_eq!(config().base_url(), "https://acme.cyrene.io");
    }

    #[test]
    fn test_default_grant_is_client_credentials() {
        assert_eq!(config().grant(), &GrantStrategy::ClientCredentials);
    }

    #[test]
    fn test_rejects_blank_short_name() {
        for name in ["", "   "] {
            let err = Config::new(name, "id", "secret").unwrap_err();
            assert!(matches!(err, CyreneError::Configuration(_)));
        }
    }

    #[test]
    fn test_rejects_url_short_name() {
        for name in ["http://acme.cyrene.io", "https://acme.cyrene.io", "httpacme"] {
            let err = Config::new(name, "id", "secret").unwrap_err();
            assert!(matches!(err, CyreneError::Configuration(_)), "{}", name);
        }
    }

    #[test]
    fn test_rejects_blank_credentials() {
        assert!(matches!(
            Config::new("acme", " ", "secret"),
            Err(CyreneError::Configuration(_))
        ));
        assert!(matches!(
            Config::new("acme", "id", ""),
            Err(CyreneError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_name_that_is_not_a_host() {
        for name in ["acme/evil", "acme@other", "ac me"] {
            assert!(
                matches!(Config::new(name, "id", "secret"), Err(CyreneError::Configuration(_))),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_set_user_credentials_requires_both() {
        let mut config = config();

        assert!(!config.set_user_credentials("", "password"));
        assert!(!config.set_user_credentials("user", "  "));
        assert_eq!(config.grant(), &GrantStrategy::ClientCredentials);

        assert!(config.set_user_credentials("user", "password"));
        assert!(config.grant().is_password());

        // a later blank call keeps the password grant
        assert!(!config.set_user_credentials("", ""));
        assert!(config.grant().is_password());
    }

    #[test]
    fn test_with_base_url() {
        let config = config().with_base_url("http://127.0.0.1:8080").unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");

        assert!(config.clone().with_base_url("ftp://example.com").is_err());
        assert!(config.with_base_url("not a url").is_err());
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = config().endpoint(["Main", "Contacts", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://acme.cyrene.io/Main/Contacts/a%2Fb%20c");

        let url = config().endpoint(["oauth2", "token"]).unwrap();
        assert_eq!(url.as_str(), "https://acme.cyrene.io/oauth2/token");
    }

    #[test]
    fn test_resolve_stays_on_base_host() {
        let url = config().resolve("/Main/Contacts?active=1").unwrap();
        assert_eq!(url.as_str(), "https://acme.cyrene.io/Main/Contacts?active=1");

        let url = config()
            .with_base_url("http://127.0.0.1:8080/api/")
            .unwrap()
            .resolve("/Main/Contacts/1")
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/Main/Contacts/1");

        for relative in [
            "http://evil.example/steal",
            "//evil.example/steal",
            "Main/Contacts",
            "@evil.example/steal",
            "",
        ] {
            let err = config().resolve(relative).unwrap_err();
            assert!(matches!(err, CyreneError::InvalidInput(_)), "{}", relative);
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", config().with_user_credentials("user", "pa55word"));
        assert!(!debug.contains("client-secret"));
        assert!(!debug.contains("pa55word"));
        assert!(debug.contains("client-id"));
    }

    #[test]
    fn test_with_timeout() {
        let config = config()
            .with_timeout(Duration::from_secs(5))
            .with_connect_timeout(Duration::from_secs(1));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
    }
}
