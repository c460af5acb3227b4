//! End-to-end run dispatch: load inputs, route credentials, build the
//! matrix, construct collectors (real or null), orchestrate.

use std::path::Path;

use anyhow::Context;
use gander_core::{
    build_session, CredentialRouter, CredentialStore, Collector, Orchestrator,
    OperationMatrixBuilder, Provider,
};
use tracing::{error, info, warn};

use crate::args::Args;

pub async fn execute(args: Args) -> anyhow::Result<i32> {
    // Missing credentials abort before any unit of work launches.
    let store = CredentialStore::load(&args.authfile)?;
    let credentials = CredentialRouter::route(&store);

    match &credentials.graph_delegated {
        Some(record) => {
            if !record.check_expiry("graph") {
                warn!("delegated graph credential failed the expiry check; graph operations may fail");
            }
        }
        None => warn!("no delegated graph credential in the store"),
    }

    let matrix = OperationMatrixBuilder::new(gander_providers::catalogs())
        .build_from_file(&args.config, args.overrides());
    if matrix.is_empty() {
        warn!("no operations enabled; nothing to collect");
    }

    let collectors: Vec<std::sync::Arc<dyn Collector>> = if args.dry_run {
        info!("dry run: substituting the null collector for every provider");
        gander_providers::null_collectors()
    } else {
        prepare_output_dirs(&args.output_dir, &args.reports_dir)
            .context("failed to prepare output directories")?;
        let session = build_session()?;
        gander_providers::real_collectors(&session, &credentials, &args.output_dir)
    };

    info!(operations = matrix.len(), dry_run = args.dry_run, "beginning collection run");
    match Orchestrator::new(args.parallel).run(&collectors, &matrix).await {
        Ok(report) => {
            info!(
                succeeded = report.succeeded,
                elapsed_secs = format!("{:.2}", report.elapsed.as_secs_f64()),
                "collection run succeeded"
            );
            Ok(0)
        }
        Err(e) => {
            // Siblings already ran to completion; their output is on disk.
            error!(error = %e, "collection run finished with failures");
            Ok(1)
        }
    }
}

/// Create the output tree up front: the run root, the reports root, and
/// one directory per provider. Skipped entirely in dry-run.
fn prepare_output_dirs(output_dir: &Path, reports_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(output_dir)?;
    std::fs::create_dir_all(reports_dir)?;
    for provider in Provider::ALL {
        std::fs::create_dir_all(output_dir.join(provider.as_str()))?;
    }
    Ok(())
}
