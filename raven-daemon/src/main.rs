#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use raven_control::OnosClient;
use raven_core::RavenConfig;
use raven_daemon::Monitor;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// RAVEN path-selection controller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Controller base URL, e.g. http://onos:8181
    #[arg(long)]
    controller_url: Option<String>,

    /// Seconds to wait before the first cycle
    #[arg(long)]
    startup_delay: Option<u64>,
}

fn load_config(args: &Args) -> anyhow::Result<RavenConfig> {
    let cfg = match &args.config {
        Some(path) => RavenConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RavenConfig::default(),
    };
    let mut cfg = cfg.apply_env().context("applying RAVEN_* overrides")?;
    if let Some(url) = &args.controller_url {
        cfg.controller.url = url.clone();
    }
    if let Some(secs) = args.startup_delay {
        cfg.monitor.startup_delay_secs = secs;
    }
    cfg.validate()?;
    Ok(cfg)
}

#[tokio::main(worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = load_config(&args)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        controller = %cfg.controller.url,
        k = cfg.monitor.candidate_paths,
        alpha = cfg.scoring.alpha,
        beta = cfg.scoring.beta,
        gamma = cfg.scoring.gamma,
        "starting raven-controller"
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("stop requested");
                let _ = stop_tx.send(true);
            }
            Err(e) => {
                // Hold the sender; the loop then runs until killed.
                error!("failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
        }
    });

    let delay = cfg.monitor.startup_delay();
    if delay > Duration::ZERO {
        info!(secs = delay.as_secs(), "waiting for controller startup");
        let mut early = stop_rx.clone();
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = early.changed() => {}
        }
    }

    let controller = Arc::new(OnosClient::new(&cfg.controller));
    info!(api = %controller.base_url(), "controller client ready");
    let monitor = Monitor::new(controller, &cfg);
    let stats = monitor.run(stop_rx).await;

    let s = stats.snapshot();
    info!(
        cycles = s.cycles,
        installs = s.installs,
        install_failures = s.install_failures,
        fetch_failures = s.fetch_failures,
        "raven-controller exiting"
    );
    Ok(())
}
