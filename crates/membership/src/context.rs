//! Run-wide reconciliation state
//!
//! [`SyncContext`] owns everything a run accumulates: the identifier maps
//! built from listings, the registry ids with no Negotiator counterpart, and
//! the counters reported at the end. Components receive it by reference.

use crate::types::ResourceKind;
use negotiator::TargetResource;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Registry id -> Negotiator id, for one resource kind.
pub type IdentifierMap = HashMap<String, String>;

/// Counters for one resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindStats {
    /// Assignments added
    pub added: usize,
    /// Assignments removed
    pub removed: usize,
    /// Desired ids skipped because they are not known to the Negotiator
    pub unmapped: usize,
}

/// Counters for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Input users matched to a Negotiator user and reconciled
    pub users_processed: usize,
    /// Input users without a Negotiator account
    pub users_skipped: usize,
    /// Users with at least one add or remove
    pub users_updated: usize,
    /// Per-kind breakdown
    pub kinds: BTreeMap<&'static str, KindStats>,
}

impl SyncStats {
    /// Total assignments added across kinds.
    pub fn added(&self) -> usize {
        self.kinds.values().map(|k| k.added).sum()
    }

    /// Total assignments removed across kinds.
    pub fn removed(&self) -> usize {
        self.kinds.values().map(|k| k.removed).sum()
    }

    /// Mutable counters for a kind.
    pub fn kind_mut(&mut self, kind: &ResourceKind) -> &mut KindStats {
        self.kinds.entry(kind.name).or_default()
    }
}

/// State shared by the directories and the reconciler during one run.
#[derive(Debug, Default)]
pub struct SyncContext {
    mappings: HashMap<&'static str, IdentifierMap>,
    unknown: BTreeMap<&'static str, BTreeSet<String>>,
    /// Run counters
    pub stats: SyncStats,
}

impl SyncContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a listed resource in the kind's identifier map.
    ///
    /// Resources without a registry id are not mapped. Entries are only ever
    /// added or overwritten, never removed.
    pub fn record_resource(&mut self, kind: &ResourceKind, resource: &TargetResource) {
        if let Some(identifier) = &resource.identifier {
            self.mappings
                .entry(kind.name)
                .or_default()
                .insert(identifier.clone(), resource.id.clone());
        }
    }

    /// Identifier map of a kind, if any resource of it has been listed.
    pub fn mapping(&self, kind: &ResourceKind) -> Option<&IdentifierMap> {
        self.mappings.get(kind.name)
    }

    /// Negotiator id for a registry id.
    pub fn target_id(&self, kind: &ResourceKind, source_id: &str) -> Option<&str> {
        self.mapping(kind)?.get(source_id).map(String::as_str)
    }

    /// Remember a desired registry id that has no Negotiator counterpart.
    pub fn record_unknown(&mut self, kind: &ResourceKind, source_id: &str) {
        let newly_seen = self
            .unknown
            .entry(kind.name)
            .or_default()
            .insert(source_id.to_string());
        if newly_seen {
            self.stats.kind_mut(kind).unmapped += 1;
        }
    }

    /// Unknown ids of one kind.
    pub fn unknown(&self, kind: &ResourceKind) -> Option<&BTreeSet<String>> {
        self.unknown.get(kind.name)
    }

    /// Unknown ids of all kinds, sorted and deduplicated.
    pub fn all_unknown(&self) -> BTreeSet<&str> {
        self.unknown
            .values()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Whether any desired id was unknown.
    pub fn has_unknown(&self) -> bool {
        self.unknown.values().any(|ids| !ids.is_empty())
    }
}
