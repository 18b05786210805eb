//! OAuth2 client-credentials token acquisition.
//!
//! The token is requested once per run. There is no refresh: a run that
//! outlives the token's lifetime fails on the first rejected request.

use crate::backend::http::{USER_AGENT, send_checked};
use crate::error::{Error, Result};
use crate::types::RetryConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::fmt;

/// Client credentials for the token endpoint.
///
/// The [`Debug`] impl redacts the secret so credentials can be logged safely.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// OAuth2 client id.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Resource (audience) the token is requested for.
    pub resource: String,
    /// Token endpoint URL.
    pub token_url: String,
}

impl ClientCredentials {
    /// Value of the HTTP basic `Authorization` header.
    fn basic_header(&self) -> String {
        let pair = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(pair))
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("resource", &self.resource)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Bearer access token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Value of the `Authorization` header for API requests.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Request an access token with the client-credentials grant.
///
/// Any failure (unreachable endpoint, non-success status, response without
/// `access_token`) is reported as [`Error::Auth`].
pub fn request_token(
    agent: &ureq::Agent,
    credentials: &ClientCredentials,
    retry: &RetryConfig,
) -> Result<AccessToken> {
    log::debug!("Requesting access token from {}", credentials.token_url);

    let authorization = credentials.basic_header();
    let form = [
        ("grant_type", "client_credentials"),
        ("resource", credentials.resource.as_str()),
    ];

    let mut response = send_checked(retry, "POST", &credentials.token_url, || {
        agent
            .post(&credentials.token_url)
            .header("Authorization", authorization.as_str())
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send_form(form)
    })
    .map_err(|e| Error::Auth(e.to_string()))?;

    let body: TokenResponse = response
        .body_mut()
        .read_json()
        .map_err(|e| Error::Auth(format!("unreadable token response: {e}")))?;

    parse_token(body)
}

fn parse_token(body: TokenResponse) -> Result<AccessToken> {
    match body.access_token {
        Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
        _ => Err(Error::Auth(
            "token endpoint response contains no access_token".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> ClientCredentials {
        ClientCredentials {
            client_id: "perun".to_string(),
            client_secret: "s3cr3t".to_string(),
            resource: "negotiator".to_string(),
            token_url: "https://login.test/connect/token".to_string(),
        }
    }

    #[test]
    fn test_basic_header() {
        // base64("perun:s3cr3t")
        assert_eq!(credentials().basic_header(), "Basic cGVydW46czNjcjN0");
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("perun"));
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_token_debug_redacted() {
        let token = AccessToken::new("eyJhbGciOi");
        assert!(!format!("{token:?}").contains("eyJ"));
        assert_eq!(token.bearer_header(), "Bearer eyJhbGciOi");
    }

    #[test]
    fn test_parse_token() {
        let body: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","token_type":"Bearer","expires_in":300}"#)
                .unwrap();
        assert_eq!(parse_token(body).unwrap().bearer_header(), "Bearer abc");
    }

    #[test]
    fn test_parse_token_missing() {
        let body: TokenResponse = serde_json::from_str(r#"{"error":"invalid_client"}"#).unwrap();
        assert!(matches!(parse_token(body), Err(Error::Auth(_))));
    }

    #[test]
    fn test_parse_token_empty() {
        let body: TokenResponse = serde_json::from_str(r#"{"access_token":""}"#).unwrap();
        assert!(parse_token(body).is_err());
    }

    #[test]
    fn test_unreachable_token_endpoint_is_auth_error() {
        let creds = ClientCredentials {
            token_url: "http://127.0.0.1:9/connect/token".to_string(),
            ..credentials()
        };
        let err = request_token(&crate::build_agent(), &creds, &RetryConfig::no_retry())
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }
}
