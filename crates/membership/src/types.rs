//! Core types for membership reconciliation

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// A membership section: section key (e.g. `collections`) to registry ids.
pub type MembershipSection = BTreeMap<String, Vec<String>>;

/// One user as exported by the membership registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    /// Registry subject id; matches the Negotiator's `subjectId`.
    pub id: String,
    /// Resources the user is a member of.
    #[serde(default)]
    pub membership: MembershipSection,
    /// Resources the user administers.
    #[serde(default)]
    pub administrator: Option<MembershipSection>,
}

impl UserRecord {
    /// Get one section of the record, if present.
    pub fn section(&self, section: Section) -> Option<&MembershipSection> {
        match section {
            Section::Membership => Some(&self.membership),
            Section::Administrator => self.administrator.as_ref(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InputDocument {
    Users(Vec<UserRecord>),
    Wrapped { users: Vec<UserRecord> },
}

/// Decode an input document: either an array of users or `{ "users": [...] }`.
pub fn parse_users(json: &str) -> Result<Vec<UserRecord>> {
    let document: InputDocument = serde_json::from_str(json).map_err(|e| {
        Error::InvalidInput(format!(
            "expected an array of users or {{\"users\": [...]}}: {e}"
        ))
    })?;
    Ok(match document {
        InputDocument::Users(users) | InputDocument::Wrapped { users } => users,
    })
}

/// Top-level section of a [`UserRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// `membership`
    Membership,
    /// `administrator`
    Administrator,
}

/// Where a kind's desired ids are read from: `<section>.<key>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSource {
    pub section: Section,
    pub key: &'static str,
}

/// Per-kind configuration of a reconciled resource dimension.
///
/// Kinds differ only in data: the API path segment, the field holding the
/// registry id, and the input sections the desired set is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKind {
    /// Name used in logs and the summary.
    pub name: &'static str,
    /// API path segment and `_embedded` key (`/resources`, `/users/{id}/resources`).
    pub segment: &'static str,
    /// Field of a Negotiator resource holding the registry id.
    pub identifier_field: &'static str,
    /// Input sections unioned into the desired set.
    pub sources: &'static [InputSource],
}

/// Collections: `/resources`, matched on `sourceId`.
pub const COLLECTIONS: ResourceKind = ResourceKind {
    name: "collections",
    segment: "resources",
    identifier_field: "sourceId",
    sources: &[InputSource {
        section: Section::Membership,
        key: "collections",
    }],
};

/// Networks: `/networks`, matched on `externalId`. Administrators of a
/// network are also members of it.
pub const NETWORKS: ResourceKind = ResourceKind {
    name: "networks",
    segment: "networks",
    identifier_field: "externalId",
    sources: &[
        InputSource {
            section: Section::Membership,
            key: "networks",
        },
        InputSource {
            section: Section::Administrator,
            key: "networks",
        },
    ],
};

/// Kinds reconciled by a sync run, in order.
pub const RESOURCE_KINDS: [ResourceKind; 2] = [COLLECTIONS, NETWORKS];

impl ResourceKind {
    /// Desired registry ids for a user: the union of all source sections.
    pub fn desired(&self, user: &UserRecord) -> BTreeSet<String> {
        self.sources
            .iter()
            .filter_map(|source| user.section(source.section)?.get(source.key))
            .flatten()
            .filter(|id| !id.is_empty())
            .cloned()
            .collect()
    }
}

/// Options for a reconciliation run
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Compute and report changes without PATCH/DELETE calls
    pub dry_run: bool,
}
