//! Connectivity monitor.
//!
//! Probes the API on an interval and publishes the result on a
//! `tokio::sync::watch` channel. Subscribers only wake on a change, so an
//! `Offline -> Online` edge is what the sync coordinator treats as
//! "connectivity restored".

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::client::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
    Unknown,
}

impl std::fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkStatus::Online => write!(f, "online"),
            NetworkStatus::Offline => write!(f, "offline"),
            NetworkStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Something that can tell whether the API is reachable right now.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

#[async_trait]
impl ConnectivityProbe for ApiClient {
    async fn is_reachable(&self) -> bool {
        self.health().await
    }
}

pub struct NetworkMonitor {
    status: watch::Sender<NetworkStatus>,
    probe_interval: Duration,
}

impl NetworkMonitor {
    pub fn new(probe_interval: Duration) -> Self {
        let (status, _) = watch::channel(NetworkStatus::Unknown);
        Self {
            status,
            probe_interval,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status.subscribe()
    }

    pub fn current(&self) -> NetworkStatus {
        *self.status.borrow()
    }

    /// Publish `status`, waking subscribers only if it differs from the
    /// last published value.
    pub fn report(&self, status: NetworkStatus) -> bool {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            match status {
                NetworkStatus::Online => tracing::info!("network online"),
                NetworkStatus::Offline => tracing::warn!("network offline"),
                NetworkStatus::Unknown => tracing::debug!("network status unknown"),
            }
        }
        changed
    }

    /// Probe forever, until every subscriber has gone away.
    pub async fn run(self, probe: Arc<dyn ConnectivityProbe>) {
        let mut ticker = tokio::time::interval(self.probe_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.status.is_closed() {
                tracing::debug!("no connectivity subscribers left, stopping monitor");
                break;
            }
            let status = if probe.is_reachable().await {
                NetworkStatus::Online
            } else {
                NetworkStatus::Offline
            };
            self.report(status);
        }
    }
}
