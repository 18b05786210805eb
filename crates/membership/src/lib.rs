//! # Membership
//!
//! Reconciliation of resource memberships between a membership registry and
//! the BBMRI Negotiator.
//!
//! For every user and every [`ResourceKind`], the desired set of registry ids
//! (from the input file) is compared with the resources currently assigned in
//! the Negotiator, and the minimal set of add/remove calls is issued.
//!
//! ## Core Concepts
//!
//! - **ResourceKind**: Declarative description of a reconciled dimension
//!   (collections, networks): API segment, identifier field, input sections
//! - **SyncContext**: Identifier maps, unknown ids and counters for one run
//! - **UserDirectory**: Negotiator users indexed by registry subject id
//! - **AssignmentDiff**: Pure set difference between desired and assigned
//! - **reconcile**: Applies one diff through a [`negotiator::Backend`]
//!
//! ## Example
//!
//! ```
//! use membership::{ReconcileOptions, RESOURCE_KINDS, parse_users, sync};
//! use negotiator::MockBackend;
//! use serde_json::json;
//!
//! let backend = MockBackend::new();
//! backend.set_listing("/users", vec![json!({ "id": 1, "subjectId": "alice" })]);
//! backend.set_listing("/resources", vec![json!({ "id": 7, "sourceId": "col-A" })]);
//!
//! let users = parse_users(r#"[{"id": "alice", "membership": {"collections": ["col-A"]}}]"#).unwrap();
//! let ctx = sync::run(&backend, &users, &RESOURCE_KINDS, ReconcileOptions::default()).unwrap();
//!
//! assert_eq!(ctx.stats.users_updated, 1);
//! assert_eq!(backend.calls().len(), 1);
//! ```

pub mod context;
pub mod diff;
pub mod directory;
pub mod error;
pub mod reconciler;
pub mod sync;
pub mod types;

// Re-export main types at crate root
pub use context::{IdentifierMap, KindStats, SyncContext, SyncStats};
pub use diff::{AssignmentDiff, PlannedAdd};
pub use directory::{UserDirectory, fetch_all, fetch_resources};
pub use error::{Error, Result};
pub use reconciler::{ReconcileOutcome, reconcile};
pub use types::{
    COLLECTIONS, InputSource, MembershipSection, NETWORKS, RESOURCE_KINDS, ReconcileOptions,
    ResourceKind, Section, UserRecord, parse_users,
};
