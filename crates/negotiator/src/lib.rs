//! # negotiator
//!
//! Blocking client for the BBMRI Negotiator v3 REST API, limited to what a
//! membership sync needs:
//! - OAuth2 client-credentials token acquisition
//! - Paginated HAL listings (`/users`, `/resources`, `/users/{id}/networks`, ...)
//! - Assigning and removing resources on a user
//! - Automatic retry with exponential backoff on 429/500/502/503/504
//!
//! ## Example
//!
//! ```no_run
//! use negotiator::{ClientCredentials, RetryConfig, backend::Backend};
//!
//! let credentials = ClientCredentials {
//!     client_id: "perun".to_string(),
//!     client_secret: "secret".to_string(),
//!     resource: "negotiator".to_string(),
//!     token_url: "https://login.example.org/connect/token".to_string(),
//! };
//!
//! let backend = negotiator::connect("https://negotiator.example.org/api/v3", &credentials, RetryConfig::default())
//!     .expect("could not connect");
//!
//! let first = backend.fetch_page("/users", "users", 0).expect("listing failed");
//! println!("{} users on page 0 of {}", first.items.len(), first.total_pages);
//! ```

#![warn(clippy::all)]

pub mod auth;
pub mod backend;
pub mod error;
pub mod retry;
pub mod types;

pub use auth::{AccessToken, ClientCredentials};
pub use backend::http::{HttpBackend, build_agent};
pub use backend::{Backend, Call, MockBackend};
pub use error::{Error, ErrorCategory, Result};
pub use types::{Page, RetryConfig, TargetResource, TargetUser};

/// Acquire an access token and build an authenticated backend.
///
/// The token and the API calls share one agent and one retry policy.
pub fn connect(
    api_url: &str,
    credentials: &ClientCredentials,
    retry: RetryConfig,
) -> Result<HttpBackend> {
    let agent = build_agent();
    let token = auth::request_token(&agent, credentials, &retry)?;
    log::info!("Obtained access token for {}", credentials.client_id);
    Ok(HttpBackend::with_agent(agent, api_url, &token, retry))
}
