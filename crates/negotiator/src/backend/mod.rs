//! Backend trait and implementations for talking to the Negotiator.
//!
//! [`http::HttpBackend`] is the real implementation. Use [`MockBackend`] for
//! testing without network access:
//!
//! ```
//! use negotiator::backend::{Backend, MockBackend};
//! use serde_json::json;
//!
//! let mock = MockBackend::new().with_page_size(1);
//! mock.set_listing("/resources", vec![
//!     json!({ "id": 1, "sourceId": "col-A" }),
//!     json!({ "id": 2, "sourceId": "col-B" }),
//! ]);
//!
//! let first = mock.fetch_page("/resources", "resources", 0).unwrap();
//! assert_eq!(first.items.len(), 1);
//! assert_eq!(first.total_pages, 2);
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{Page, json_id};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Backend trait for the Negotiator's listing and assignment endpoints.
///
/// Paths are relative to the API base, e.g. `/users` or `/users/7/networks`.
pub trait Backend: Send + Sync {
    /// Fetch one page of a paginated listing.
    ///
    /// `embedded_key` names the array under `_embedded` holding the items.
    fn fetch_page(&self, path: &str, embedded_key: &str, page: u32) -> Result<Page>;

    /// Assign a resource to a user (`PATCH /users/{user}/{segment}`).
    fn add_assignment(&self, user_id: &str, segment: &str, resource_id: &str) -> Result<()>;

    /// Remove a resource from a user (`DELETE /users/{user}/{segment}/{resource}`).
    fn remove_assignment(&self, user_id: &str, segment: &str, resource_id: &str) -> Result<()>;
}

/// Path of the global user listing.
pub const USERS_PATH: &str = "/users";

/// Path of a resource listing, global or scoped to one user.
pub fn listing_path(user_id: Option<&str>, segment: &str) -> String {
    match user_id {
        Some(user_id) => format!("/users/{user_id}/{segment}"),
        None => format!("/{segment}"),
    }
}

/// A mutating call recorded by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `PATCH /users/{user_id}/{segment}` with `{ "id": resource_id }`.
    Add {
        user_id: String,
        segment: String,
        resource_id: String,
    },
    /// `DELETE /users/{user_id}/{segment}/{resource_id}`.
    Remove {
        user_id: String,
        segment: String,
        resource_id: String,
    },
}

/// Mock backend for testing without network access.
///
/// Listings are stored in memory per path and served in pages of
/// `page_size` items. Assignment calls are recorded and applied to the
/// per-user listings, so a second pass over the same data sees the effect
/// of the first.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    listings: HashMap<String, Vec<Value>>,
    page_size: Option<usize>,
    failures: HashMap<String, u16>,
    calls: Vec<Call>,
    page_requests: Vec<(String, u32)>,
}

/// Page size used by [`MockBackend`] unless overridden; matches Spring's default.
const DEFAULT_PAGE_SIZE: usize = 20;

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve listings in pages of `page_size` items.
    #[must_use]
    pub fn with_page_size(self, page_size: usize) -> Self {
        self.state.lock().unwrap().page_size = Some(page_size.max(1));
        self
    }

    /// Set all items of a listing.
    pub fn set_listing(&self, path: impl Into<String>, items: Vec<Value>) {
        self.state.lock().unwrap().listings.insert(path.into(), items);
    }

    /// Current items of a listing.
    pub fn listing(&self, path: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .listings
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every request for `method` + `path` answer with `status`.
    pub fn fail(&self, method: &str, path: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(format!("{method} {path}"), status);
    }

    /// Mutating calls received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Forget recorded calls and page requests.
    pub fn clear_calls(&self) {
        let mut state = self.state.lock().unwrap();
        state.calls.clear();
        state.page_requests.clear();
    }

    /// Page requests received so far as `(path, page)`.
    pub fn page_requests(&self) -> Vec<(String, u32)> {
        self.state.lock().unwrap().page_requests.clone()
    }

    fn check_failure(state: &MockState, method: &'static str, path: &str) -> Result<()> {
        match state.failures.get(&format!("{method} {path}")) {
            Some(&status) => Err(Error::Status {
                method,
                url: format!("mock://{path}"),
                status,
                body: format!("injected failure for {method} {path}"),
                retry_after: None,
            }),
            None => Ok(()),
        }
    }
}

impl Backend for MockBackend {
    fn fetch_page(&self, path: &str, _embedded_key: &str, page: u32) -> Result<Page> {
        let mut state = self.state.lock().unwrap();
        state.page_requests.push((path.to_string(), page));
        Self::check_failure(&state, "GET", path)?;

        let page_size = state.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let items = state.listings.get(path).map(Vec::as_slice).unwrap_or_default();
        let total_pages = items.len().div_ceil(page_size) as u32;

        let start = (page as usize).saturating_mul(page_size).min(items.len());
        let end = start.saturating_add(page_size).min(items.len());

        Ok(Page {
            items: items[start..end].to_vec(),
            number: page,
            total_pages,
        })
    }

    fn add_assignment(&self, user_id: &str, segment: &str, resource_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let user_path = listing_path(Some(user_id), segment);
        Self::check_failure(&state, "PATCH", &user_path)?;

        state.calls.push(Call::Add {
            user_id: user_id.to_string(),
            segment: segment.to_string(),
            resource_id: resource_id.to_string(),
        });

        let resource = state
            .listings
            .get(&listing_path(None, segment))
            .and_then(|all| {
                all.iter()
                    .find(|r| json_id(r.get("id")).as_deref() == Some(resource_id))
            })
            .cloned()
            .unwrap_or_else(|| serde_json::json!({ "id": resource_id }));

        let assigned = state.listings.entry(user_path).or_default();
        if !assigned
            .iter()
            .any(|r| json_id(r.get("id")).as_deref() == Some(resource_id))
        {
            assigned.push(resource);
        }
        Ok(())
    }

    fn remove_assignment(&self, user_id: &str, segment: &str, resource_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let user_path = listing_path(Some(user_id), segment);
        Self::check_failure(&state, "DELETE", &format!("{user_path}/{resource_id}"))?;

        state.calls.push(Call::Remove {
            user_id: user_id.to_string(),
            segment: segment.to_string(),
            resource_id: resource_id.to_string(),
        });

        if let Some(assigned) = state.listings.get_mut(&user_path) {
            assigned.retain(|r| json_id(r.get("id")).as_deref() != Some(resource_id));
        }
        Ok(())
    }
}
