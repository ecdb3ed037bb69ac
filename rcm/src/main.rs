mod cli;
mod config;
mod controller;
mod workers;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use libscaler::events::LogEventRecorder;
use libscaler::reconciler::ReplicaScaler;
use libscaler::with_xline::XlineRuntimeStore;
use log::error;

use crate::config::load_config;
use crate::controller::Controller;
use crate::workers::XlineWorkerLifecycle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Start { config } => {
            let cfg = load_config(config.to_str().unwrap())?;
            let endpoints: Vec<&str> = cfg
                .xline_config
                .endpoints
                .iter()
                .map(|s| s.as_str())
                .collect();
            let store = Arc::new(
                XlineRuntimeStore::new(&endpoints)
                    .await
                    .context("failed to connect to xline")?,
            );
            println!("[rcm] managing runtimes via {:?}", cfg.xline_config.endpoints);

            let workers = Arc::new(XlineWorkerLifecycle::new(store.clone()));
            let recorder = Arc::new(LogEventRecorder);
            let scaler = Arc::new(ReplicaScaler::new(store.clone(), workers, recorder));
            let controller = Controller::new(
                store,
                scaler,
                Duration::from_secs(cfg.resync_period_secs),
            );
            if let Err(e) = controller.run().await {
                error!("controller stopped: {e:?}");
                return Err(e.into());
            }
        }
    }

    Ok(())
}
