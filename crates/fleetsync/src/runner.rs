// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `fleetsync run` command: the foreground sync service.
//!
//! Wires the connectivity monitor, the HTTP transport, and the sync engine
//! together and runs until ctrl-c. The monitor is fed by a coarse
//! network-presence check against the API host: a TCP connect says nothing
//! about whether the fleet API will accept an action, which is exactly the
//! heuristic quality of signal the engine is designed around.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fleetsync_config::FleetsyncConfig;
use fleetsync_connectivity::ConnectivityMonitor;
use fleetsync_core::FleetsyncError;
use fleetsync_engine::SyncEngine;
use fleetsync_outbox::Outbox;
use fleetsync_transport::HttpTransport;

/// How often the network-presence check runs.
const PROBE_INTERVAL: Duration = Duration::from_secs(15);
/// Bound on one TCP connect attempt.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Run the sync service until interrupted.
pub async fn run_service(
    outbox: Arc<Outbox>,
    config: &FleetsyncConfig,
) -> Result<(), FleetsyncError> {
    let monitor = Arc::new(ConnectivityMonitor::default());
    let transport = Arc::new(HttpTransport::new(&config.api)?);
    let engine = SyncEngine::new(
        outbox,
        transport,
        monitor.subscribe(),
        config.sync.clone(),
    );

    let shutdown = CancellationToken::new();
    let probe = tokio::spawn(presence_probe(
        monitor.clone(),
        config.api.base_url.clone(),
        shutdown.clone(),
    ));

    info!(api = %config.api.base_url, "fleetsync service started");

    let result = tokio::select! {
        r = engine.run(shutdown.clone()) => r,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    };

    shutdown.cancel();
    probe.abort();
    result
}

/// Feed the monitor from periodic TCP reachability of the API host.
async fn presence_probe(
    monitor: Arc<ConnectivityMonitor>,
    base_url: String,
    shutdown: CancellationToken,
) {
    let Some(target) = probe_target(&base_url) else {
        warn!(%base_url, "cannot derive a probe target; assuming online");
        monitor.report_online();
        return;
    };

    loop {
        let reachable = matches!(
            tokio::time::timeout(PROBE_TIMEOUT, tokio::net::TcpStream::connect(&target)).await,
            Ok(Ok(_))
        );
        if reachable {
            monitor.report_online();
        } else {
            debug!(%target, "presence probe failed");
            monitor.report_offline();
        }

        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(PROBE_INTERVAL) => {}
        }
    }
}

/// `host:port` of the API base URL, for the TCP presence check.
fn probe_target(base_url: &str) -> Option<String> {
    let url = reqwest::Url::parse(base_url).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{host}:{port}"))
}
