//! HTTP backend for the Negotiator REST API.
//!
//! Every request goes through [`send_checked`], which applies the retry
//! policy and turns non-success statuses into [`Error::Status`] carrying the
//! response body.

use crate::auth::AccessToken;
use crate::backend::{Backend, listing_path};
use crate::error::{Error, Result};
use crate::retry::{self, LogCallback};
use crate::types::{Page, RetryConfig};
use serde_json::{Value, json};
use std::time::Duration;
use ureq::Body;
use ureq::http::Response;

/// Media type requested for listings.
const ACCEPT: &str = "application/hal+json, application/json";

/// User agent sent with every request.
pub(crate) const USER_AGENT: &str = concat!("negotiator-sync/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP agent shared by the token request and the API backend.
///
/// Status codes are checked by [`send_checked`] rather than by ureq, so the
/// response body is still readable for diagnostics.
pub fn build_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build();
    ureq::Agent::new_with_config(config)
}

/// Send a request with retries, failing on any non-success status.
pub(crate) fn send_checked<F>(
    retry: &RetryConfig,
    method: &'static str,
    url: &str,
    mut send: F,
) -> Result<Response<Body>>
where
    F: FnMut() -> std::result::Result<Response<Body>, ureq::Error>,
{
    retry::with_retry(retry, Some(&LogCallback), || {
        let mut response = send().map_err(|e| Error::transport(url, &e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);
        let body = response
            .body_mut()
            .read_to_string()
            .unwrap_or_else(|_| "<no body>".to_string());
        Err(Error::Status {
            method,
            url: url.to_string(),
            status: status.as_u16(),
            body,
            retry_after,
        })
    })
}

/// Parse a `Retry-After` value given in seconds.
///
/// The HTTP-date form is not supported and yields `None`, which falls back to
/// the backoff schedule.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Negotiator API backend.
///
/// Holds the bearer token acquired at startup; the token is never renewed
/// during a run.
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL, without trailing slash.
    api_url: String,
    /// Precomputed `Authorization` header value.
    authorization: String,
    /// Retry policy applied to every request.
    retry: RetryConfig,
}

impl HttpBackend {
    /// Create a backend on an existing agent.
    pub fn with_agent(
        agent: ureq::Agent,
        api_url: impl Into<String>,
        token: &AccessToken,
        retry: RetryConfig,
    ) -> Self {
        let api_url: String = api_url.into();
        Self {
            agent,
            api_url: api_url.trim_end_matches('/').to_string(),
            authorization: token.bearer_header(),
            retry,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn page_url(&self, path: &str, page: u32) -> String {
        format!("{}{}?page={}", self.api_url, path, page)
    }
}

impl Backend for HttpBackend {
    fn fetch_page(&self, path: &str, embedded_key: &str, page: u32) -> Result<Page> {
        let url = self.page_url(path, page);
        log::debug!("GET {url}");

        let mut response = send_checked(&self.retry, "GET", &url, || {
            self.agent
                .get(&url)
                .header("Authorization", self.authorization.as_str())
                .header("Accept", ACCEPT)
                .header("User-Agent", USER_AGENT)
                .call()
        })?;

        let body: Value = response
            .body_mut()
            .read_json()
            .map_err(|e| Error::InvalidResponse(format!("{url}: {e}")))?;

        Page::from_envelope(body, embedded_key)
    }

    fn add_assignment(&self, user_id: &str, segment: &str, resource_id: &str) -> Result<()> {
        let url = self.url(&listing_path(Some(user_id), segment));
        let body = json!({ "id": id_value(resource_id) });
        log::debug!("PATCH {url} {body}");

        send_checked(&self.retry, "PATCH", &url, || {
            self.agent
                .patch(&url)
                .header("Authorization", self.authorization.as_str())
                .header("User-Agent", USER_AGENT)
                .send_json(&body)
        })?;
        Ok(())
    }

    fn remove_assignment(&self, user_id: &str, segment: &str, resource_id: &str) -> Result<()> {
        let url = format!(
            "{}/{}",
            self.url(&listing_path(Some(user_id), segment)),
            resource_id
        );
        log::debug!("DELETE {url}");

        send_checked(&self.retry, "DELETE", &url, || {
            self.agent
                .delete(&url)
                .header("Authorization", self.authorization.as_str())
                .header("User-Agent", USER_AGENT)
                .call()
        })?;
        Ok(())
    }
}

/// Send numeric ids back as JSON numbers, anything else as a string.
fn id_value(id: &str) -> Value {
    id.parse::<i64>()
        .map_or_else(|_| Value::String(id.to_string()), Value::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(api_url: &str) -> HttpBackend {
        HttpBackend::with_agent(
            build_agent(),
            api_url,
            &AccessToken::new("t0k3n"),
            RetryConfig::no_retry(),
        )
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = backend("https://negotiator.test/api/v3/");
        assert_eq!(backend.url("/users"), "https://negotiator.test/api/v3/users");
    }

    #[test]
    fn test_page_url() {
        let backend = backend("https://negotiator.test/api/v3");
        assert_eq!(
            backend.page_url("/users", 0),
            "https://negotiator.test/api/v3/users?page=0"
        );
        assert_eq!(
            backend.page_url(&listing_path(Some("12"), "networks"), 3),
            "https://negotiator.test/api/v3/users/12/networks?page=3"
        );
    }

    #[test]
    fn test_authorization_header() {
        let backend = backend("https://negotiator.test/api/v3");
        assert_eq!(backend.authorization, "Bearer t0k3n");
    }

    #[test]
    fn test_id_value() {
        assert_eq!(id_value("42"), json!(42));
        assert_eq!(id_value("bbmri-eric:ID:EU_BBMRI-ERIC"), json!("bbmri-eric:ID:EU_BBMRI-ERIC"));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_retry_after(" 0 "), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2026 07:28:00 GMT"), None);
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept connections
        let backend = backend("http://127.0.0.1:9/api/v3");
        let err = backend.fetch_page("/users", "users", 0).unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }
}
