use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use cloudcontrol_scheduler::cli::Cli;
use cloudcontrol_scheduler::cloud_auth::DefaultCloudAuth;
use cloudcontrol_scheduler::sink::ChannelSink;
use cloudcontrol_scheduler::Scheduler;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let auth: Arc<dyn cloudcontrol_scheduler::cloud_auth::CloudAuth> =
        Arc::new(DefaultCloudAuth::new(cli.profile.clone()));
    let cache = config.cache_dir.clone().map(|dir| {
        let cache: Arc<dyn cloudcontrol_scheduler::cache::ResponseCache> = Arc::new(
            cloudcontrol_scheduler::cache::FsResponseCache::new(dir, config.cache_ttl, config.cache_ext.clone()),
        );
        cache
    });

    // stdout-on-newline sink: every emitted resource prints as one JSON line. A real downstream
    // consumer is out of scope for this crate; this is the simplest sink that makes the binary
    // useful standalone.
    let (sink, mut records) = ChannelSink::new();
    let sink = Arc::new(sink);

    let printer = tokio::spawn(async move {
        while let Some(resource) = records.recv().await {
            match serde_json::to_string(&resource) {
                Ok(line) => println!("{line}"),
                Err(err) => error!(%err, "failed to serialize resource"),
            }
        }
    });

    let scheduler = match Scheduler::bootstrap(config, auth.as_ref(), cache, sink).await {
        Ok(scheduler) => scheduler,
        Err(err) => {
            error!(%err, "failed to initialize scheduler");
            return ExitCode::FAILURE;
        }
    };

    let result = scheduler.run().await;
    drop(scheduler);
    let _ = printer.await;

    match result {
        Ok(summary) if summary.interrupted => {
            warn!(
                completed = summary.total_completed,
                total = summary.total_expected,
                "run interrupted, not full completion"
            );
            ExitCode::SUCCESS
        }
        Ok(summary) if summary.hit_safety_deadline => {
            warn!(
                completed = summary.total_completed,
                total = summary.total_expected,
                "run exited via safety deadline, not full completion"
            );
            ExitCode::SUCCESS
        }
        Ok(summary) => {
            info!(
                completed = summary.total_completed,
                total = summary.total_expected,
                "run complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "scheduler run failed");
            ExitCode::FAILURE
        }
    }
}
