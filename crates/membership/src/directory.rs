//! User and resource directories
//!
//! Both walk a paginated listing to the end before returning; a failed page
//! fails the whole fetch.

use crate::context::SyncContext;
use crate::error::{Error, Result};
use crate::types::ResourceKind;
use negotiator::backend::{Backend, USERS_PATH, listing_path};
use negotiator::{TargetResource, TargetUser};
use serde_json::Value;
use std::collections::HashMap;

/// Fetch every item of a paginated listing, starting at page 0.
pub fn fetch_all(backend: &dyn Backend, path: &str, embedded_key: &str) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    let mut page = 0;

    loop {
        let current = backend.fetch_page(path, embedded_key, page)?;
        log::debug!(
            "{path}: page {}/{} with {} items",
            current.number + 1,
            current.total_pages.max(1),
            current.items.len()
        );

        if current.number < page {
            return Err(Error::Pagination {
                path: path.to_string(),
                requested: page,
                returned: current.number,
            });
        }

        let next = current.next();
        items.extend(current.items);

        match next {
            Some(next) => page = next,
            None => break,
        }
    }

    Ok(items)
}

/// Fetch all resources of a kind, globally or assigned to one user.
///
/// Every listed resource is recorded in the context's identifier map.
pub fn fetch_resources(
    backend: &dyn Backend,
    ctx: &mut SyncContext,
    kind: &ResourceKind,
    user_id: Option<&str>,
) -> Result<Vec<TargetResource>> {
    let path = listing_path(user_id, kind.segment);
    let resources = fetch_all(backend, &path, kind.segment)?
        .iter()
        .map(|item| TargetResource::from_value(item, kind.identifier_field))
        .collect::<negotiator::Result<Vec<_>>>()?;

    for resource in &resources {
        ctx.record_resource(kind, resource);
    }

    Ok(resources)
}

/// Snapshot of Negotiator users indexed by subject id.
#[derive(Debug, Default)]
pub struct UserDirectory {
    by_subject: HashMap<String, TargetUser>,
    total: usize,
}

impl UserDirectory {
    /// Fetch all users from `/users`.
    pub fn fetch(backend: &dyn Backend) -> Result<Self> {
        let users = fetch_all(backend, USERS_PATH, "users")?
            .iter()
            .map(TargetUser::from_value)
            .collect::<negotiator::Result<Vec<_>>>()?;
        Ok(Self::from_users(users))
    }

    /// Build a directory from already fetched users.
    ///
    /// When several users share a subject id the first one wins.
    pub fn from_users(users: Vec<TargetUser>) -> Self {
        let total = users.len();
        let mut by_subject = HashMap::with_capacity(total);
        for user in users {
            if user.subject_id.is_empty() {
                continue;
            }
            by_subject.entry(user.subject_id.clone()).or_insert(user);
        }
        Self { by_subject, total }
    }

    /// Find the Negotiator user for a registry subject id.
    pub fn resolve(&self, subject_id: &str) -> Option<&TargetUser> {
        self.by_subject.get(subject_id)
    }

    /// Number of users fetched, including ones without a subject id.
    pub fn len(&self) -> usize {
        self.total
    }

    /// Whether no users were fetched.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
