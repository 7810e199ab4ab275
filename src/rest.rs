use crate::client::{create_http_client, Config};
use crate::error::{CyreneError, Result};
use crate::resource::{query_string, Filter, Resource};
use crate::response::{Entry, Envelope, Lookup, Payload};
use crate::token::TokenResponse;
use parking_lot::Mutex;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

const JSON: &str = "application/json";

/// Authenticated client for one Cyrene instance.
///
/// The bearer token is fetched lazily on the first protected call and reused
/// for the lifetime of the client. The token slot is guarded by a mutex, so a
/// client can be shared between threads.
pub struct CyreneClient {
    client: Client,
    config: Config,
    token: Mutex<Option<String>>,
}

impl CyreneClient {
    /// Create a client for `https://<short_name>.cyrene.io` using the
    /// client-credentials grant
    pub fn new(short_name: &str, client_id: &str, client_secret: &str) -> Result<Self> {
        Self::with_config(Config::new(short_name, client_id, client_secret)?)
    }

    /// Create a client from a prepared configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(CyreneClient {
            client: create_http_client(&config)?,
            config,
            token: Mutex::new(None),
        })
    }

    /// Switch to the password grant; a no-op returning `false` if either value is blank.
    ///
    /// An already cached token is kept.
    pub fn set_user_credentials(&mut self, username: &str, password: &str) -> bool {
        self.config.set_user_credentials(username, password)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the instance URL, e.g. `https://acme.cyrene.io`
    pub fn cyrene_url(&self) -> &str {
        self.config.base_url()
    }

    /// Check if a token is cached
    pub fn has_token(&self) -> bool {
        self.token.lock().is_some()
    }

    /// Exchange the credentials for a new token and cache it, replacing any
    /// token already held
    pub fn acquire_token(&self) -> Result<String> {
        let token = self.exchange_credentials()?;
        *self.token.lock() = Some(token.clone());
        Ok(token)
    }

    /// Return the cached token, fetching one first if none is cached
    pub fn ensure_token(&self) -> Result<String> {
        let mut slot = self.token.lock();
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }
        let token = self.exchange_credentials()?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Check that a token can be obtained
    pub fn test_connection(&self) -> bool {
        match self.ensure_token() {
            Ok(_) => true,
            Err(err) => {
                warn!(url = self.cyrene_url(), error = %err, "connection test failed");
                false
            }
        }
    }

    /// Fetch a single entry by id, `None` when the server has no such entry
    pub fn get_entry(&self, resource: impl Into<Resource>, id: &str) -> Result<Option<Entry>> {
        let resource = resource.into();
        if id.trim().is_empty() {
            return Err(CyreneError::InvalidInput("entry id must not be blank".to_string()));
        }
        let url = self.config.endpoint(resource.segments(&[id]))?;

        let token = self.ensure_token()?;
        Ok(self.send_get(&token, url)?.first())
    }

    /// List the entries matching all `filters`
    pub fn get_entries_with_filter(
        &self,
        resource: impl Into<Resource>,
        filters: &[Filter],
    ) -> Result<Vec<Entry>> {
        let resource = resource.into();
        let mut url = self.config.endpoint(resource.segments(&[]))?;
        url.set_query(query_string(filters).as_deref());

        let token = self.ensure_token()?;
        Ok(self.send_get(&token, url)?.into_entries())
    }

    /// Create an entry; `Ok(false)` when the server rejects it
    pub fn create_entry(&self, resource: impl Into<Resource>, payload: &Payload) -> Result<bool> {
        let resource = resource.into();
        if payload.is_empty() {
            return Err(CyreneError::InvalidInput("payload must not be empty".to_string()));
        }
        let body = serde_json::to_string(payload)?;
        let url = self.config.endpoint(resource.segments(&["create"]))?;

        let token = self.ensure_token()?;
        self.send_post(&token, url, body)
    }

    /// Update an entry; `Ok(false)` when the server rejects it
    pub fn update_entry(
        &self,
        resource: impl Into<Resource>,
        id: &str,
        payload: &Payload,
    ) -> Result<bool> {
        let resource = resource.into();
        if payload.is_empty() {
            return Err(CyreneError::InvalidInput("payload must not be empty".to_string()));
        }
        if id.trim().is_empty() {
            return Err(CyreneError::InvalidInput("entry id must not be blank".to_string()));
        }
        let body = serde_json::to_string(payload)?;
        let url = self.config.endpoint(resource.segments(&["update", id]))?;

        let token = self.ensure_token()?;
        self.send_post(&token, url, body)
    }

    /// Issue an authenticated GET against a path of this instance and
    /// interpret the response envelope.
    ///
    /// # Arguments
    /// * `token` - Bearer token, usually from [`CyreneClient::ensure_token`]
    /// * `relative_url` - Path and query below the instance URL, e.g. `/Main/Contacts?active=1`
    ///
    /// # Returns
    /// * `Lookup::Found` when the call succeeded and the first entity has an `_id`
    /// * `Lookup::Empty` for any other well-formed envelope
    pub fn get_protected(&self, token: &str, relative_url: &str) -> Result<Lookup> {
        let url = self.config.resolve(relative_url)?;
        self.send_get(token, url)
    }

    /// Issue an authenticated POST with a JSON body against a path of this
    /// instance.
    ///
    /// Returns whether the server answered with a success status; the body of
    /// the answer is not read.
    pub fn post_protected(&self, token: &str, relative_url: &str, body: String) -> Result<bool> {
        let url = self.config.resolve(relative_url)?;
        self.send_post(token, url, body)
    }

    fn send_get(&self, token: &str, url: Url) -> Result<Lookup> {
        let start = Instant::now();
        let response = self.protected(self.client.get(url.clone()), token).send()?;
        let status = response.status();
        let body = response.text()?;

        debug!(
            method = "GET",
            path = url.path(),
            status = status.as_u16(),
            elapsed = ?start.elapsed(),
            "protected request completed"
        );

        if !status.is_success() {
            return Err(CyreneError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Envelope::parse(&body)?.into_lookup())
    }

    fn send_post(&self, token: &str, url: Url, body: String) -> Result<bool> {
        let start = Instant::now();
        let response = self
            .protected(self.client.post(url.clone()), token)
            .body(body)
            .send()?;
        let status = response.status();

        debug!(
            method = "POST",
            path = url.path(),
            status = status.as_u16(),
            elapsed = ?start.elapsed(),
            "protected request completed"
        );

        if !status.is_success() {
            warn!(path = url.path(), status = status.as_u16(), "server rejected POST");
            return Ok(false);
        }
        Ok(true)
    }

    fn protected(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .bearer_auth(token)
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .header("X-Requested-With", "XMLHttpRequest")
    }

    fn exchange_credentials(&self) -> Result<String> {
        let url = self.config.endpoint(["oauth2", "token"])?;
        let grant = self.config.grant();
        let form = grant.form(self.config.client_id(), self.config.client_secret());

        debug!(url = %url, grant_type = grant.grant_type(), "requesting token");

        let response = self
            .client
            .post(url)
            .form(&form)
            .send()
            .map_err(|e| CyreneError::authentication("token endpoint unreachable", e))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| CyreneError::authentication("failed to read token response", e))?;

        if !status.is_success() {
            return Err(CyreneError::authentication_status(
                status.as_u16(),
                format!("token endpoint returned {}", status),
            ));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| CyreneError::authentication("unreadable token response", e))?;
        let access_token = token.access_token().ok_or_else(|| {
            CyreneError::authentication_status(
                status.as_u16(),
                "token response has no access_token",
            )
        })?;

        info!(
            grant_type = grant.grant_type(),
            token_type = token.token_type.as_deref().unwrap_or("unknown"),
            expires_in = ?token.expires_in,
            "token acquired"
        );

        Ok(access_token.to_string())
    }
}

impl fmt::Debug for CyreneClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CyreneClient")
            .field("config", &self.config)
            .field(
                "has_token",
                // the slot stays locked while a token exchange is in flight
                &self.token.try_lock().map(|token| token.is_some()),
            )
            .finish()
    }
}
