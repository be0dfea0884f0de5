use std::sync::Arc;

use ethers::types::Address;
use log::debug;
use tokio::sync::mpsc;

use crate::sync::Synchronizer;

/// Producer half of the account-change channel. External wallet integrations
/// push the full authorized account list here; an empty list means the wallet
/// was disconnected.
#[derive(Clone)]
pub struct AccountNotifier {
    tx: mpsc::Sender<Vec<Address>>,
}

impl AccountNotifier {
    /// Returns false once the consumer has unsubscribed.
    pub async fn accounts_changed(&self, accounts: Vec<Address>) -> bool {
        self.tx.send(accounts).await.is_ok()
    }
}

/// Single-consumer half of the channel. Dropping it is the unsubscribe.
pub struct AccountEvents {
    rx: mpsc::Receiver<Vec<Address>>,
}

impl AccountEvents {
    pub async fn next(&mut self) -> Option<Vec<Address>> {
        self.rx.recv().await
    }

    /// Feeds notifications into the synchronizer until every notifier is
    /// dropped.
    pub async fn run(mut self, sync: Arc<Synchronizer>) {
        while let Some(accounts) = self.rx.recv().await {
            debug!("account notification with {} entries", accounts.len());
            sync.on_account_changed(accounts).await;
        }
        debug!("account notification channel closed");
    }
}

pub fn channel(capacity: usize) -> (AccountNotifier, AccountEvents) {
    let (tx, rx) = mpsc::channel(capacity);
    (AccountNotifier { tx }, AccountEvents { rx })
}
