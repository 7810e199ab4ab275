use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth2 flow used to obtain the bearer token.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum GrantStrategy {
    /// Client id and secret only
    #[default]
    ClientCredentials,
    /// Client id and secret plus a user's login
    ResourceOwnerPassword { username: String, password: String },
}

impl GrantStrategy {
    /// The `grant_type` value sent to the token endpoint
    pub fn grant_type(&self) -> &'static str {
        match self {
            GrantStrategy::ClientCredentials => "client_credentials",
            GrantStrategy::ResourceOwnerPassword { .. } => "password",
        }
    }

    /// Check if this is the resource-owner password flow
    pub fn is_password(&self) -> bool {
        matches!(self, GrantStrategy::ResourceOwnerPassword { .. })
    }

    /// Build the form fields for a token request
    pub(crate) fn form<'a>(
        &'a self,
        client_id: &'a str,
        client_secret: &'a str,
    ) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![("client_id", client_id), ("client_secret", client_secret)];
        if let GrantStrategy::ResourceOwnerPassword { username, password } = self {
            form.push(("username", username.as_str()));
            form.push(("password", password.as_str()));
        }
        form.push(("grant_type", self.grant_type()));
        form
    }
}

impl fmt::Debug for GrantStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantStrategy::ClientCredentials => f.write_str("ClientCredentials"),
            GrantStrategy::ResourceOwnerPassword { username, .. } => f
                .debug_struct("ResourceOwnerPassword")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Body returned by the `/oauth2/token` endpoint.
///
/// Only `access_token` is used; the remaining fields are kept for logging.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token for protected requests
    #[serde(default)]
    pub access_token: Option<String>,

    /// Token type (usually "Bearer")
    #[serde(default)]
    pub token_type: Option<String>,

    /// Token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,

    /// Refresh token, never used by this client
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Granted scope
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// The access token, if present and not blank
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_credentials_form() {
        let grant = GrantStrategy::ClientCredentials;
        let form = grant.form("id", "secret");

        assert_eq!(
            form,
            vec![
                ("client_id", "id"),
                ("client_secret", "secret"),
                ("grant_type", "client_credentials"),
            ]
        );
    }

    #[test]
    fn test_password_form() {
        let grant = GrantStrategy::ResourceOwnerPassword {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        };
        let form = grant.form("id", "secret");

        assert_eq!(
            form,
            vec![
                ("client_id", "id"),
                ("client_secret", "secret"),
                ("username", "alice"),
                ("password", "hunter2"),
                ("grant_type", "password"),
            ]
        );
        assert!(grant.is_password());
    }

    #[test]
    fn test_debug_redacts_password() {
        let grant = GrantStrategy::ResourceOwnerPassword {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{:?}", grant);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_token_response_deserialization() {
        let json = r#"{"access_token":"abc","token_type":"Bearer","expires_in":3600}"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.access_token(), Some("abc"));
        assert_eq!(response.expires_in, Some(3600));
        assert!(response.refresh_token.is_none());
    }

    #[test]
    fn test_blank_access_token_is_missing() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"  "}"#).unwrap();
        assert_eq!(response.access_token(), None);

        let response: TokenResponse = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert_eq!(response.access_token(), None);
    }
}
