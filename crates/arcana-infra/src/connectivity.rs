//! HTTP-probe connectivity monitor.
//!
//! Polls a health endpoint at a fixed interval and publishes transitions on
//! a watch channel. This backs the engine's [`ConnectivityMonitor`] seam in
//! environments without a platform online/offline event source; embedders
//! that have one should feed `arcana_core::connectivity::ManualConnectivity`
//! instead.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use arcana_core::connectivity::ConnectivityMonitor;

/// Connectivity monitor that probes a health URL on an interval.
///
/// The probe considers the backend reachable when the request completes
/// with any 2xx status; transport errors and non-2xx both count as offline.
pub struct HttpProbeConnectivity {
    tx: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl HttpProbeConnectivity {
    /// Start probing `probe_url` every `interval`. Assumes online until the
    /// first probe says otherwise.
    pub fn start(probe_url: String, interval: Duration) -> Self {
        let (tx, _) = watch::channel(true);
        let cancel = CancellationToken::new();

        let client = reqwest::Client::builder()
            .timeout(interval.min(Duration::from_secs(5)))
            .build()
            .expect("failed to create reqwest client");

        let probe_tx = tx.clone();
        let probe_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = probe_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let online = match client.head(&probe_url).send().await {
                            Ok(response) => response.status().is_success(),
                            Err(err) => {
                                debug!(error = %err, "connectivity probe failed");
                                false
                            }
                        };
                        probe_tx.send_if_modified(|state| {
                            if *state == online {
                                false
                            } else {
                                *state = online;
                                true
                            }
                        });
                    }
                }
            }
        });

        Self { tx, cancel }
    }

    /// Stop the probe task.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for HttpProbeConnectivity {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl ConnectivityMonitor for HttpProbeConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
