use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::lists::{fetch_list, ListKind};

/// Allowed and denied wallet identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessLists {
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

impl AccessLists {
    pub fn new(whitelist: Vec<String>, blacklist: Vec<String>) -> Self {
        Self { whitelist, blacklist }
    }

    pub fn is_whitelisted(&self, wallet: &str) -> bool {
        self.whitelist.iter().any(|w| w == wallet)
    }

    pub fn is_blacklisted(&self, wallet: &str) -> bool {
        self.blacklist.iter().any(|w| w == wallet)
    }
}

/// Session-wide holder of the access lists.
///
/// Both lists start empty. Consumers read snapshots or subscribe to changes;
/// only the fetch task writes, and each list kind owns its own slot.
#[derive(Debug, Clone)]
pub struct ListStore {
    tx: Arc<watch::Sender<AccessLists>>,
}

impl Default for ListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ListStore {
    pub fn new() -> Self {
        Self::seeded(AccessLists::default())
    }

    /// Store pre-filled with fixed lists (no list service configured).
    pub fn seeded(lists: AccessLists) -> Self {
        let (tx, _rx) = watch::channel(lists);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<AccessLists> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> AccessLists {
        self.tx.borrow().clone()
    }

    pub fn whitelist(&self) -> Vec<String> {
        self.tx.borrow().whitelist.clone()
    }

    pub fn blacklist(&self) -> Vec<String> {
        self.tx.borrow().blacklist.clone()
    }

    /// Replace one list wholesale.
    pub fn replace(&self, kind: ListKind, wallets: Vec<String>) {
        self.tx.send_modify(|lists| match kind {
            ListKind::White => lists.whitelist = wallets,
            ListKind::Black => lists.blacklist = wallets,
        });
    }

    /// Fetch both lists concurrently from the list service.
    ///
    /// A failed fetch leaves its list untouched. Once `token` is cancelled no
    /// result is applied.
    pub fn spawn_fetch(
        &self,
        client: reqwest::Client,
        endpoint: String,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            tokio::join!(
                store.fetch_into(&client, &endpoint, ListKind::White, &token),
                store.fetch_into(&client, &endpoint, ListKind::Black, &token),
            );
        })
    }

    async fn fetch_into(
        &self,
        client: &reqwest::Client,
        endpoint: &str,
        kind: ListKind,
        token: &CancellationToken,
    ) {
        let result = tokio::select! {
            _ = token.cancelled() => {
                debug!(target: "lists", list = %kind, "fetch cancelled");
                return;
            }
            r = fetch_list(client, endpoint, kind) => r,
        };

        if token.is_cancelled() {
            return;
        }

        match result {
            Ok(wallets) => {
                info!(target: "lists", list = %kind, count = wallets.len(), "list loaded");
                self.replace(kind, wallets);
            }
            Err(e) => {
                warn!(target: "lists", list = %kind, "list fetch failed: {}", e);
            }
        }
    }
}
