use anyhow::{Context as _, Result};
use colored::Colorize;
use membership::{RESOURCE_KINDS, ReconcileOptions, SyncContext};
use negotiator::ErrorCategory;

use crate::Context;
use crate::cli::Cli;
use crate::config::SyncConfig;
use crate::input;
use crate::ui;

pub fn run(ctx: &Context, args: &Cli) -> Result<()> {
    let result = execute(ctx, args);
    if let Err(err) = &result
        && let Some(category) = error_category(err)
    {
        ui::warn(&format!("{category}. {}", category.advice()));
    }
    result
}

/// Category of the Negotiator error behind a failure, if there is one.
fn error_category(err: &anyhow::Error) -> Option<ErrorCategory> {
    err.chain().find_map(|cause| {
        if let Some(api) = cause.downcast_ref::<negotiator::Error>() {
            return Some(api.category());
        }
        match cause.downcast_ref::<membership::Error>() {
            Some(membership::Error::Api(api)) => Some(api.category()),
            _ => None,
        }
    })
}

fn execute(ctx: &Context, args: &Cli) -> Result<()> {
    // Configuration and input are validated before any network activity
    let (config, config_path) = SyncConfig::load(args.config.as_deref())?;
    log::info!("Using configuration {}", config_path.display());

    let users = input::load_input(&args.input)?;
    log::info!("Loaded {} users from {}", users.len(), args.input.display());

    let backend = negotiator::connect(
        &config.api_url,
        &config.credentials(),
        config.retry_config(),
    )
    .context("Authentication against the Negotiator failed")?;

    if args.dry_run && !ctx.quiet {
        ui::info("Dry run: no assignments will be changed");
    }

    let options = ReconcileOptions {
        dry_run: args.dry_run,
    };
    let result = membership::sync::run(&backend, &users, &RESOURCE_KINDS, options)
        .context("Synchronization aborted")?;

    print_summary(ctx, &result, args.dry_run);
    Ok(())
}

/// Summary lines: updated-user count, then unknown ids if any.
fn summary_lines(result: &SyncContext, dry_run: bool) -> Vec<String> {
    let verb = if dry_run { "Would update" } else { "Updated" };
    let mut lines = vec![format!(
        "{verb} resources for {} users.",
        result.stats.users_updated
    )];

    if result.has_unknown() {
        let unknown: Vec<&str> = result.all_unknown().into_iter().collect();
        lines.push(format!(
            "Resources not found in Negotiator: {}",
            unknown.join(", ")
        ));
    }
    lines
}

fn print_summary(ctx: &Context, result: &SyncContext, dry_run: bool) {
    let stats = &result.stats;

    if ctx.verbose > 0 && !ctx.quiet {
        ui::header("Membership Sync");
        ui::kv("Users reconciled", &stats.users_processed.to_string());
        ui::kv("Users without account", &stats.users_skipped.to_string());
        for kind in &RESOURCE_KINDS {
            let kind_stats = stats.kinds.get(kind.name).cloned().unwrap_or_default();
            ui::kv(
                kind.name,
                &format!(
                    "{} added, {} removed, {} unknown",
                    kind_stats.added.to_string().green(),
                    kind_stats.removed.to_string().red(),
                    kind_stats.unmapped.to_string().yellow()
                ),
            );
        }
        println!();
    }

    let mut lines = summary_lines(result, dry_run).into_iter();
    if let Some(first) = lines.next() {
        ui::success(&first);
    }
    for line in lines {
        ui::warn(&line);
    }
}
