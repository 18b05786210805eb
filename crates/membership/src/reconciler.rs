//! Per-user, per-kind reconciliation
//!
//! Fetches the user's current assignments fresh from the Negotiator, diffs
//! them against the desired set, and issues one call per change. The first
//! failing call aborts; changes already applied stay applied.

use crate::context::SyncContext;
use crate::diff::AssignmentDiff;
use crate::directory;
use crate::error::Result;
use crate::types::{ReconcileOptions, ResourceKind};
use negotiator::backend::Backend;
use std::collections::BTreeSet;

/// What a reconciliation pass did (or, in a dry run, would do).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Registry ids assigned
    pub added: Vec<String>,
    /// Negotiator ids unassigned
    pub removed: Vec<String>,
    /// Desired registry ids skipped as unknown
    pub unmapped: Vec<String>,
}

impl ReconcileOutcome {
    /// Whether at least one add or remove happened.
    pub fn updated(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Converge one user's assignments of one kind to `desired`.
pub fn reconcile(
    backend: &dyn Backend,
    ctx: &mut SyncContext,
    desired: &BTreeSet<String>,
    user_id: &str,
    kind: &ResourceKind,
    options: ReconcileOptions,
) -> Result<ReconcileOutcome> {
    let assigned = directory::fetch_resources(backend, ctx, kind, Some(user_id))?;
    let diff = AssignmentDiff::compute(desired, &assigned, ctx.mapping(kind));
    let mut outcome = ReconcileOutcome::default();

    for source_id in diff.unmapped {
        log::warn!("User {user_id}: {} {source_id} not found in Negotiator", kind.name);
        ctx.record_unknown(kind, &source_id);
        outcome.unmapped.push(source_id);
    }

    for add in diff.to_add {
        log::info!(
            "User {user_id}: adding {} {} (id {})",
            kind.name,
            add.source_id,
            add.target_id
        );
        if !options.dry_run {
            backend.add_assignment(user_id, kind.segment, &add.target_id)?;
        }
        ctx.stats.kind_mut(kind).added += 1;
        outcome.added.push(add.source_id);
    }

    for resource in diff.to_remove {
        log::info!(
            "User {user_id}: removing {} {} (id {})",
            kind.name,
            resource.identifier.as_deref().unwrap_or("<no registry id>"),
            resource.id
        );
        if !options.dry_run {
            backend.remove_assignment(user_id, kind.segment, &resource.id)?;
        }
        ctx.stats.kind_mut(kind).removed += 1;
        outcome.removed.push(resource.id);
    }

    Ok(outcome)
}
