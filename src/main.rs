// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge daemon: polls the configured controllers and syncs their overlay
//! models with the MQTT bus until interrupted.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use fpp_mqtt_bridge::{
    BridgeConfig, CommandResolver, Error, HttpFetcher, Poller, StateObserver, StateStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = BridgeConfig::parse();

    // RUST_LOG directives win over -v
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level()).into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Bridge stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &BridgeConfig) -> Result<(), Error> {
    let controllers = config.controllers();
    tracing::info!(
        controllers = ?controllers,
        interval = ?config.query_interval(),
        "Starting bridge"
    );

    let poller = Poller::new(Arc::new(HttpFetcher::new()?))
        .with_devices(controllers)
        .with_interval(config.query_interval());
    // Reject a bad schedule before touching the network
    poller.check_schedule()?;

    let bridge = config.mqtt_builder().build().await?;

    let publisher: Arc<dyn StateObserver> = Arc::new(bridge.status_publisher());
    let store = Arc::new(StateStore::new().with_observer(publisher));
    bridge.attach(CommandResolver::new(Arc::clone(&store)));

    let mut poller = poller.with_store(store);

    if let Err(e) = poller.start() {
        let _ = bridge.disconnect().await;
        return Err(e);
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for shutdown signal");
    }

    tracing::info!("Shutting down");
    poller.stop();
    bridge.disconnect().await?;
    Ok(())
}
