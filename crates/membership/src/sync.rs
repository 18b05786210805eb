//! Whole-run synchronization
//!
//! Fetches the user directory and the global resource listings once, then
//! reconciles every input user against every resource kind, users outer and
//! kinds inner, strictly one request at a time.

use crate::context::SyncContext;
use crate::directory::{self, UserDirectory};
use crate::error::Result;
use crate::reconciler;
use crate::types::{ReconcileOptions, ResourceKind, UserRecord};
use negotiator::TargetUser;
use negotiator::backend::Backend;

/// Run a full synchronization and return the accumulated context.
pub fn run(
    backend: &dyn Backend,
    users: &[UserRecord],
    kinds: &[ResourceKind],
    options: ReconcileOptions,
) -> Result<SyncContext> {
    let mut ctx = SyncContext::new();

    let directory = UserDirectory::fetch(backend)?;
    log::info!("Fetched {} Negotiator users", directory.len());

    for kind in kinds {
        let resources = directory::fetch_resources(backend, &mut ctx, kind, None)?;
        log::info!("Fetched {} Negotiator {}", resources.len(), kind.name);
    }

    for user in users {
        match directory.resolve(&user.id) {
            Some(target) => sync_user(backend, &mut ctx, user, target, kinds, options)?,
            None => {
                log::debug!("User {} has no Negotiator account, skipping", user.id);
                ctx.stats.users_skipped += 1;
            }
        }
    }

    Ok(ctx)
}

/// Reconcile every kind for one user.
fn sync_user(
    backend: &dyn Backend,
    ctx: &mut SyncContext,
    user: &UserRecord,
    target: &TargetUser,
    kinds: &[ResourceKind],
    options: ReconcileOptions,
) -> Result<()> {
    let mut updated = false;

    for kind in kinds {
        let desired = kind.desired(user);
        let outcome = reconciler::reconcile(backend, ctx, &desired, &target.id, kind, options)?;
        updated |= outcome.updated();
    }

    ctx.stats.users_processed += 1;
    if updated {
        ctx.stats.users_updated += 1;
    }
    Ok(())
}
