//! Reachability monitor
//!
//! Polls a TCP probe endpoint and emits link-state transitions over a
//! channel. The first reading is always emitted so the router sees the
//! initial state; after that only changes are reported.

use coopgate_core::config::ProbeConfig;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Satisfied,
    Unsatisfied,
}

pub struct ConnectivityMonitor {
    host: String,
    port: u16,
    interval: Duration,
    timeout: Duration,
}

impl ConnectivityMonitor {
    pub fn new(probe: &ProbeConfig) -> Self {
        Self {
            host: probe.host.clone(),
            port: probe.port,
            interval: Duration::from_millis(probe.interval_ms),
            timeout: Duration::from_millis(probe.timeout_ms),
        }
    }

    async fn probe(&self) -> LinkState {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_)) => LinkState::Satisfied,
            _ => LinkState::Unsatisfied,
        }
    }

    /// Run the poll loop until cancelled or the receiver goes away.
    pub async fn run(self, tx: mpsc::Sender<LinkState>, cancel: CancellationToken) {
        info!("Connectivity monitor probing {}:{}", self.host, self.port);
        let mut last: Option<LinkState> = None;
        loop {
            let state = self.probe().await;
            if last != Some(state) {
                debug!("Link state: {:?}", state);
                if tx.send(state).await.is_err() {
                    info!("Connectivity channel closed, shutting down");
                    return;
                }
                last = Some(state);
            }
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
