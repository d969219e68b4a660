//! Connectivity signal abstraction.
//!
//! The offline queue only consumes a boolean is-online signal plus a change
//! notification. Platform event sources are injected behind the
//! [`ConnectivityMonitor`] trait so the engine is testable without a real
//! network stack; arcana-infra ships an HTTP-probe implementation.

use tokio::sync::watch;

/// Source of the is-online signal consumed by the sync engine.
pub trait ConnectivityMonitor: Send + Sync {
    /// Current connectivity state.
    fn is_online(&self) -> bool;

    /// A receiver notified on every connectivity transition. The receiver's
    /// current value always reflects the latest known state.
    fn watch(&self) -> watch::Receiver<bool>;
}

/// Manually driven connectivity signal.
///
/// Embedders with a platform-provided online/offline event source (or
/// tests) feed transitions in via [`ManualConnectivity::set_online`].
#[derive(Debug)]
pub struct ManualConnectivity {
    tx: watch::Sender<bool>,
}

impl ManualConnectivity {
    /// Create a signal with the given initial state.
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx }
    }

    /// Report a connectivity transition. Subscribers are only woken when
    /// the state actually changes.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|state| {
            if *state == online {
                false
            } else {
                *state = online;
                true
            }
        });
    }
}

impl Default for ManualConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityMonitor for ManualConnectivity {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

// A monitor is typically shared between the engine and the platform event
// source feeding it.
impl<T: ConnectivityMonitor> ConnectivityMonitor for std::sync::Arc<T> {
    fn is_online(&self) -> bool {
        self.as_ref().is_online()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.as_ref().watch()
    }
}
