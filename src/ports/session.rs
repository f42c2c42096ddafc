//! Shared Wallet Session
//!
//! One writer (the wallet adapter) publishes the session; any number of
//! readers observe it through cloned `SessionContext` handles.

use tokio::sync::watch;

use crate::domain::{Address, ChainId, ConnectionStatus, WalletSession};

/// Write half, held by the wallet adapter only
#[derive(Debug)]
pub struct SessionPublisher {
    tx: watch::Sender<WalletSession>,
    // keeps the channel open while no reader is attached
    _rx: watch::Receiver<WalletSession>,
}

impl SessionPublisher {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(WalletSession::disconnected());
        Self { tx, _rx: rx }
    }

    /// Replace the session; readers are only woken on an actual change
    pub fn publish(&self, session: WalletSession) {
        self.tx.send_if_modified(|current| {
            if *current == session {
                false
            } else {
                *current = session;
                true
            }
        });
    }

    /// Replace the session only while `still_current` holds for the published one.
    /// Returns false when the check failed and nothing was written.
    pub fn publish_if(&self, still_current: impl FnOnce(&WalletSession) -> bool, session: WalletSession) -> bool {
        let mut applied = false;
        self.tx.send_if_modified(|current| {
            if !still_current(current) {
                return false;
            }
            applied = true;
            if *current == session {
                false
            } else {
                *current = session;
                true
            }
        });
        applied
    }

    pub fn current(&self) -> WalletSession {
        self.tx.borrow().clone()
    }

    pub fn context(&self) -> SessionContext {
        SessionContext { rx: self.tx.subscribe() }
    }
}

impl Default for SessionPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only session handle
#[derive(Debug, Clone)]
pub struct SessionContext {
    rx: watch::Receiver<WalletSession>,
}

impl SessionContext {
    pub fn snapshot(&self) -> WalletSession {
        self.rx.borrow().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.rx.borrow().status
    }

    pub fn address(&self) -> Option<Address> {
        self.rx.borrow().account().cloned()
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.rx.borrow().chain_id
    }

    pub fn is_connected(&self) -> bool {
        self.rx.borrow().is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.rx.borrow().is_connecting()
    }

    /// Wait for the next change; returns false once the publisher is gone
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
