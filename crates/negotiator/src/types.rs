//! Core types for the Negotiator API.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// One page of a HAL-style listing.
///
/// The listing envelope looks like
/// `{ "_embedded": { "<key>": [...] }, "page": { "number": 0, "totalPages": 3 } }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Raw items found under the embedded key.
    pub items: Vec<Value>,
    /// Zero-based number of this page.
    pub number: u32,
    /// Total number of pages in the listing.
    pub total_pages: u32,
}

impl Page {
    /// Decode a listing envelope, extracting the items under `embedded_key`.
    ///
    /// A missing `_embedded` object or key yields no items; a missing `page`
    /// object is treated as a single page.
    pub fn from_envelope(body: Value, embedded_key: &str) -> Result<Self> {
        let mut envelope: Envelope = serde_json::from_value(body)?;

        let items = match envelope
            .embedded
            .as_mut()
            .and_then(|embedded| embedded.remove(embedded_key))
        {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(Error::InvalidResponse(format!(
                    "_embedded.{embedded_key} is not an array: {other}"
                )));
            }
        };

        let (number, total_pages) = match envelope.page {
            Some(info) => (info.number.unwrap_or(0), info.total_pages.unwrap_or(0)),
            None => (0, 1),
        };

        Ok(Self {
            items,
            number,
            total_pages,
        })
    }

    /// Number of the page to request after this one, if any.
    pub fn next(&self) -> Option<u32> {
        let next = self.number + 1;
        (next < self.total_pages).then_some(next)
    }
}

// Explicit nulls decode like absent fields.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "_embedded", default)]
    embedded: Option<HashMap<String, Value>>,
    #[serde(default)]
    page: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(default)]
    number: Option<u32>,
    #[serde(rename = "totalPages", default)]
    total_pages: Option<u32>,
}

/// A user as known to the Negotiator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUser {
    /// Negotiator-internal user id.
    pub id: String,
    /// Subject id issued by the identity registry.
    pub subject_id: String,
}

impl TargetUser {
    /// Build a user from a raw listing item.
    pub fn from_value(item: &Value) -> Result<Self> {
        let id = json_id(item.get("id"))
            .ok_or_else(|| Error::InvalidResponse(format!("user without id: {item}")))?;
        let subject_id = json_id(item.get("subjectId")).unwrap_or_default();
        Ok(Self { id, subject_id })
    }
}

/// A resource (collection, network, ...) as known to the Negotiator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResource {
    /// Negotiator-internal resource id.
    pub id: String,
    /// Registry-side identifier, read from the kind's identifier field.
    pub identifier: Option<String>,
}

impl TargetResource {
    /// Build a resource from a raw listing item, reading the registry-side
    /// identifier from `identifier_field` (e.g. `sourceId` or `externalId`).
    pub fn from_value(item: &Value, identifier_field: &str) -> Result<Self> {
        let id = json_id(item.get("id"))
            .ok_or_else(|| Error::InvalidResponse(format!("resource without id: {item}")))?;
        Ok(Self {
            id,
            identifier: json_id(item.get(identifier_field)),
        })
    }
}

/// Normalise an id that may be serialized as a JSON string or number.
pub fn json_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        if capped.is_finite() && capped > 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            Duration::ZERO
        }
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_from_envelope() {
        let body = json!({
            "_embedded": { "users": [{ "id": 1 }, { "id": 2 }] },
            "page": { "size": 2, "totalElements": 5, "totalPages": 3, "number": 1 }
        });
        let page = Page::from_envelope(body, "users").unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.next(), Some(2));
    }

    #[test]
    fn test_page_last_has_no_next() {
        let body = json!({
            "_embedded": { "resources": [] },
            "page": { "totalPages": 3, "number": 2 }
        });
        let page = Page::from_envelope(body, "resources").unwrap();
        assert_eq!(page.next(), None);
    }

    #[test]
    fn test_page_empty_listing() {
        // Spring HAL omits _embedded entirely for empty listings
        let body = json!({ "page": { "size": 20, "totalElements": 0, "totalPages": 0, "number": 0 } });
        let page = Page::from_envelope(body, "networks").unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next(), None);
    }

    #[test]
    fn test_page_without_page_info() {
        let body = json!({ "_embedded": { "networks": [{ "id": "n1" }] } });
        let page = Page::from_envelope(body, "networks").unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.next(), None);
    }

    #[test]
    fn test_page_other_embedded_key_ignored() {
        let body = json!({ "_embedded": { "users": [{ "id": 1 }] } });
        let page = Page::from_envelope(body, "resources").unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_page_explicit_nulls() {
        let body = json!({ "_embedded": null, "page": null });
        let page = Page::from_envelope(body, "users").unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.next(), None);

        let body = json!({
            "_embedded": { "users": [{ "id": 1 }] },
            "page": { "number": null, "totalPages": null }
        });
        let page = Page::from_envelope(body, "users").unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.number, 0);
        assert_eq!(page.next(), None);
    }

    #[test]
    fn test_page_embedded_not_array() {
        let body = json!({ "_embedded": { "users": { "id": 1 } } });
        assert!(Page::from_envelope(body, "users").is_err());
    }

    #[test]
    fn test_target_user_numeric_id() {
        let user = TargetUser::from_value(&json!({ "id": 42, "subjectId": "abc@lifescience-ri.eu" }))
            .unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.subject_id, "abc@lifescience-ri.eu");
    }

    #[test]
    fn test_target_user_missing_id() {
        assert!(TargetUser::from_value(&json!({ "subjectId": "abc" })).is_err());
    }

    #[test]
    fn test_target_resource_identifier_field() {
        let item = json!({ "id": 7, "sourceId": "bbmri-eric:ID:CZ_MMCI:collection:LTS", "externalId": "x" });
        let collection = TargetResource::from_value(&item, "sourceId").unwrap();
        assert_eq!(collection.id, "7");
        assert_eq!(
            collection.identifier.as_deref(),
            Some("bbmri-eric:ID:CZ_MMCI:collection:LTS")
        );

        let network = TargetResource::from_value(&item, "externalId").unwrap();
        assert_eq!(network.identifier.as_deref(), Some("x"));
    }

    #[test]
    fn test_target_resource_without_identifier() {
        let resource = TargetResource::from_value(&json!({ "id": "t9" }), "sourceId").unwrap();
        assert_eq!(resource.identifier, None);
    }

    #[test]
    fn test_json_id() {
        assert_eq!(json_id(Some(&json!("a"))), Some("a".to_string()));
        assert_eq!(json_id(Some(&json!(12))), Some("12".to_string()));
        assert_eq!(json_id(Some(&json!(""))), None);
        assert_eq!(json_id(Some(&json!(null))), None);
        assert_eq!(json_id(None), None);
    }

    #[test]
    fn test_retry_delay_backoff() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(8));
    }

    #[test]
    fn test_retry_delay_capped() {
        let config = RetryConfig {
            max_attempts: 10,
            max_delay: Duration::from_secs(5),
            ..RetryConfig::default()
        };
        assert_eq!(config.delay_for_attempt(6), Duration::from_secs(5));
    }

    #[test]
    fn test_retry_delay_never_negative() {
        let config = RetryConfig {
            backoff_factor: -2.0,
            ..RetryConfig::default()
        };
        assert_eq!(config.delay_for_attempt(1), Duration::ZERO);

        let config = RetryConfig {
            backoff_factor: f64::NAN,
            ..RetryConfig::default()
        };
        assert!(config.delay_for_attempt(2) <= config.max_delay);
    }

    #[test]
    fn test_no_retry() {
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
    }
}
