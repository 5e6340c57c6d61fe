use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::ledger::{read_snapshot, LedgerReader};
use crate::table::{Address, TableSnapshot};
use crate::tokio_tools::spawn_named_task;

const LOG_TARGET: &str = "holdem_client::poller";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Background task re-reading one table on a fixed interval, or immediately
/// when its refresh trigger is notified. Each read completes before the next
/// one is scheduled, so polls never overlap.
pub struct TablePoller {
    table: Address,
    cancel: CancellationToken,
    refresh: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl TablePoller {
    /// Fails only when the runtime refuses the task.
    pub fn spawn(
        reader: Arc<dyn LedgerReader>,
        table: Address,
        period: Duration,
        publish: watch::Sender<Arc<TableSnapshot>>,
        refresh: Arc<Notify>,
    ) -> io::Result<Self> {
        let cancel = CancellationToken::new();
        let handle = spawn_named_task(
            format!("table-poller-{}", table.short()),
            poll_loop(
                reader,
                table.clone(),
                period,
                publish,
                Arc::clone(&refresh),
                cancel.clone(),
            ),
        )?;
        info!(
            target = LOG_TARGET,
            %table,
            period_ms = period.as_millis() as u64,
            "poller started"
        );
        Ok(Self {
            table,
            cancel,
            refresh,
            handle: Some(handle),
        })
    }

    pub fn table(&self) -> &Address {
        &self.table
    }

    /// Schedule an immediate re-read.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel the task and wait for it to exit. A read in progress is
    /// abandoned and never published.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                debug!(
                    target = LOG_TARGET,
                    table = %self.table,
                    error = %err,
                    "poller task ended abnormally"
                );
            }
        }
        info!(target = LOG_TARGET, table = %self.table, "poller stopped");
    }
}

impl Drop for TablePoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop(
    reader: Arc<dyn LedgerReader>,
    table: Address,
    period: Duration,
    publish: watch::Sender<Arc<TableSnapshot>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
            _ = refresh.notified() => {
                debug!(target = LOG_TARGET, %table, "refresh requested");
                ticker.reset();
            }
        }

        let snapshot = tokio::select! {
            _ = cancel.cancelled() => break,
            snapshot = read_snapshot(reader.as_ref(), &table) => snapshot,
        };
        debug!(
            target = LOG_TARGET,
            %table,
            phase = %snapshot.game.phase.name(),
            "poll tick"
        );
        if publish.send(Arc::new(snapshot)).is_err() {
            debug!(target = LOG_TARGET, %table, "no snapshot subscribers left");
            break;
        }
    }
}
