use swcache_core::{Event, EventOutcome, InstallReport, Worker};

use super::build_worker;
use crate::cli::args::GlobalArgs;
use crate::exit_codes::SUCCESS;

pub async fn install(global: &GlobalArgs) -> anyhow::Result<i32> {
    let worker = build_worker(global)?;
    let report = run_install(&worker).await?;
    print_install(&report);
    Ok(SUCCESS)
}

/// A new process is a new worker instance, so activation installs first.
pub async fn activate(global: &GlobalArgs) -> anyhow::Result<i32> {
    let worker = build_worker(global)?;
    let report = run_install(&worker).await?;
    print_install(&report);

    let EventOutcome::Activated(report) = worker.dispatch(Event::Activate).await? else {
        anyhow::bail!("activate produced no report");
    };
    if report.deleted.is_empty() {
        println!("no stale partitions");
    }
    for name in &report.deleted {
        println!("deleted {}", name);
    }
    Ok(SUCCESS)
}

async fn run_install(worker: &Worker) -> anyhow::Result<InstallReport> {
    match worker.dispatch(Event::Install).await? {
        EventOutcome::Installed(report) => Ok(report),
        other => anyhow::bail!("unexpected install outcome: {:?}", other),
    }
}

fn print_install(report: &InstallReport) {
    for asset in &report.cached {
        println!("cached  {}", asset);
    }
    for (asset, reason) in &report.failed {
        println!("failed  {}: {}", asset, reason);
    }
}
