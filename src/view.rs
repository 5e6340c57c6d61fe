use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tracing::info;

use crate::cards::{reveal_hole_cards, HoleCards};
use crate::ledger::{LedgerReader, LedgerWriter};
use crate::lifecycle::LifecycleController;
use crate::poller::TablePoller;
use crate::secret::SecretStore;
use crate::table::{Address, LifecycleLegals, LocalIdentity, SeatIndex, TableSnapshot};

const LOG_TARGET: &str = "holdem_client::view";

/// Everything the client holds for the table currently on screen: the latest
/// snapshot, the poller feeding it and the controller acting on it.
///
/// Retargeting or changing identity tears the old poller down and starts from
/// an empty snapshot, so nothing from the previous table leaks across.
pub struct TableView {
    reader: Arc<dyn LedgerReader>,
    writer: Arc<dyn LedgerWriter>,
    secrets: SecretStore,
    identity: LocalIdentity,
    poll_interval: Duration,
    snapshot: watch::Receiver<Arc<TableSnapshot>>,
    controller: Arc<LifecycleController>,
    poller: TablePoller,
}

struct Attached {
    snapshot: watch::Receiver<Arc<TableSnapshot>>,
    controller: Arc<LifecycleController>,
    poller: TablePoller,
}

fn attach(
    reader: &Arc<dyn LedgerReader>,
    writer: &Arc<dyn LedgerWriter>,
    secrets: &SecretStore,
    identity: &LocalIdentity,
    poll_interval: Duration,
    table: Address,
) -> io::Result<Attached> {
    let (publish, snapshot) = watch::channel(Arc::new(TableSnapshot::empty(table.clone())));
    let refresh = Arc::new(Notify::new());
    let controller = Arc::new(LifecycleController::new(
        table.clone(),
        identity.clone(),
        Arc::clone(writer),
        secrets.clone(),
        snapshot.clone(),
        Arc::clone(&refresh),
    ));
    let poller = TablePoller::spawn(Arc::clone(reader), table, poll_interval, publish, refresh)?;
    Ok(Attached {
        snapshot,
        controller,
        poller,
    })
}

impl TableView {
    /// Starts polling `table` immediately. Must be called inside a Tokio runtime.
    pub fn open(
        reader: Arc<dyn LedgerReader>,
        writer: Arc<dyn LedgerWriter>,
        secrets: SecretStore,
        identity: LocalIdentity,
        table: Address,
        poll_interval: Duration,
    ) -> io::Result<Self> {
        let Attached {
            snapshot,
            controller,
            poller,
        } = attach(&reader, &writer, &secrets, &identity, poll_interval, table)?;
        Ok(Self {
            reader,
            writer,
            secrets,
            identity,
            poll_interval,
            snapshot,
            controller,
            poller,
        })
    }

    pub fn table(&self) -> &Address {
        self.poller.table()
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    pub fn snapshot(&self) -> Arc<TableSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TableSnapshot>> {
        self.snapshot.clone()
    }

    pub fn controller(&self) -> Arc<LifecycleController> {
        Arc::clone(&self.controller)
    }

    pub fn legals(&self) -> LifecycleLegals {
        self.controller.legals()
    }

    pub fn refresh(&self) {
        self.poller.refresh();
    }

    pub fn local_seat(&self) -> Option<SeatIndex> {
        let address = self.identity.address.as_ref()?;
        self.snapshot.borrow().seat_of(address)
    }

    /// The local player's hole cards, decrypted with the working secret.
    pub fn hole_cards(&self) -> HoleCards {
        let snapshot = self.snapshot();
        let Some(seat) = self
            .identity
            .address
            .as_ref()
            .and_then(|address| snapshot.seat_of(address))
        else {
            return HoleCards::Hidden;
        };
        reveal_hole_cards(
            snapshot.game.phase,
            &snapshot.hole_cards,
            seat,
            &self.controller.secret(),
        )
    }

    /// Point the view at another table.
    pub async fn retarget(&mut self, table: Address) -> io::Result<()> {
        if *self.table() == table {
            return Ok(());
        }
        info!(target = LOG_TARGET, from = %self.table(), to = %table, "switching table");
        self.reattach(table).await
    }

    /// Wallet connected, disconnected or switched.
    pub async fn set_identity(&mut self, identity: LocalIdentity) -> io::Result<()> {
        if self.identity == identity {
            return Ok(());
        }
        self.identity = identity;
        let table = self.table().clone();
        self.reattach(table).await
    }

    async fn reattach(&mut self, table: Address) -> io::Result<()> {
        let Attached {
            snapshot,
            controller,
            poller,
        } = attach(
            &self.reader,
            &self.writer,
            &self.secrets,
            &self.identity,
            self.poll_interval,
            table,
        )?;
        let previous = std::mem::replace(&mut self.poller, poller);
        previous.stop().await;
        self.snapshot = snapshot;
        self.controller = controller;
        Ok(())
    }

    pub async fn close(self) {
        self.poller.stop().await;
    }
}
