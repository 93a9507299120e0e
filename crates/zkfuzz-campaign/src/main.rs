//! Differential fuzzing campaigns against zkVM targets.

mod campaign;
mod config;
mod telemetry;

use anyhow::{anyhow, Result};
use campaign::{Campaign, Summary};
use config::CampaignConfig;
use tokio::signal;
use tracing::{error, info, warn};
use zkfuzz_target::{Label, Target};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    let config = CampaignConfig::load(std::env::args().nth(1))?;
    info!(
        seed = config.seed,
        targets = config.targets.len(),
        output = %config.output_dir.display(),
        "Starting zkfuzz campaigns"
    );

    let mut handles = Vec::new();
    for (index, target_config) in config.targets.iter().enumerate() {
        let target = Target::from_name(&target_config.name)
            .ok_or_else(|| anyhow!("unknown target '{}'", target_config.name))?;
        let campaign = Campaign::new(
            target,
            target_config.clone(),
            config.generation.clone(),
            config.bundles_per_target,
            &config.output_dir,
            config.seed.wrapping_add(index as u64),
        );
        info!(
            zkvm = %target,
            campaign = %campaign.id(),
            dir = %campaign.dir().display(),
            "Campaign scheduled"
        );

        let handle = tokio::spawn(async move { (target, campaign.run().await) });
        handles.push(handle);
    }

    tokio::select! {
        results = collect(handles) => report(&results),
        _ = shutdown_signal() => warn!("Interrupted; partial results are on disk"),
    }

    Ok(())
}

async fn collect(
    handles: Vec<tokio::task::JoinHandle<(Target, Result<Summary>)>>,
) -> Vec<(Target, Summary)> {
    let mut results = Vec::new();
    for handle in handles {
        match handle.await {
            Ok((target, Ok(summary))) => results.push((target, summary)),
            Ok((target, Err(e))) => error!(zkvm = %target, "Campaign failed: {:#}", e),
            Err(e) => error!("Campaign task panicked: {}", e),
        }
    }
    results
}

fn report(results: &[(Target, Summary)]) {
    for (target, summary) in results {
        info!(
            zkvm = %target,
            bundles = summary.bundles,
            circuits = summary.circuits,
            findings = summary.findings,
            outcomes = ?summary.outcomes,
            "Summary"
        );
    }
    let findings: usize = results.iter().map(|(_, s)| s.findings).sum();
    info!(findings, "All campaigns complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
