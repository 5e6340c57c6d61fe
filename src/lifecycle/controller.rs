use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::{watch, Notify};
use tracing::{info, warn};

use super::guard::{ActiveActionGuard, LifecycleAction};
use crate::ledger::{LedgerError, LedgerWriter, SecretBytes, TableCall, TxReceipt};
use crate::secret::{commit_hash, generate_secret, reveal_payload, CommitHash, SecretStore};
use crate::table::{
    Address, GateContext, GateRefusal, LeaveToggle, LifecycleLegals, LocalIdentity, SitToggle,
    TableSnapshot,
};

const LOG_TARGET: &str = "holdem_client::lifecycle::controller";

pub const SUBMITTED_STATUS: &str = "Action submitted. Refreshing table...";
pub const GENERATED_SECRET_STATUS: &str = "Generated a new secret. Keep it safe for reveal phase.";
pub const UNSAVED_SECRET_STATUS: &str =
    "Secret could not be saved and will be lost when the client restarts.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("Connect a wallet first")]
    NotConnected,
    #[error("A {0} action is still pending")]
    Busy(LifecycleAction),
    #[error("Cannot {action}: {reason}")]
    NotPermitted {
        action: LifecycleAction,
        reason: GateRefusal,
    },
    #[error("Enter or generate a secret first")]
    MissingSecret,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Last user-facing outcome of the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleStatus {
    Submitted,
    Failed(String),
    Info(String),
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleStatus::Submitted => f.write_str(SUBMITTED_STATUS),
            LifecycleStatus::Failed(message) | LifecycleStatus::Info(message) => {
                f.write_str(message)
            }
        }
    }
}

/// Submits lifecycle calls for one table on behalf of the local player.
///
/// The working secret lives in memory, seeded from the secret store and
/// written back to it on every change, so a missing or failing store only
/// costs persistence. Every submission reads the latest polled snapshot and
/// the working secret at call time, runs it past the gate, then holds the table's single action slot
/// until the ledger answers. The slot is released before the refresh trigger
/// fires, so the next snapshot is always evaluated with an idle guard.
pub struct LifecycleController {
    table: Address,
    identity: LocalIdentity,
    writer: Arc<dyn LedgerWriter>,
    secrets: SecretStore,
    secret: RwLock<String>,
    guard: ActiveActionGuard,
    snapshot: watch::Receiver<Arc<TableSnapshot>>,
    status: RwLock<Option<LifecycleStatus>>,
    refresh: Arc<Notify>,
}

impl LifecycleController {
    pub fn new(
        table: Address,
        identity: LocalIdentity,
        writer: Arc<dyn LedgerWriter>,
        secrets: SecretStore,
        snapshot: watch::Receiver<Arc<TableSnapshot>>,
        refresh: Arc<Notify>,
    ) -> Self {
        let secret = match identity.address.as_ref() {
            Some(player) => secrets.get(&table, player),
            None => String::new(),
        };
        Self {
            table,
            identity,
            writer,
            secrets,
            secret: RwLock::new(secret),
            guard: ActiveActionGuard::new(),
            snapshot,
            status: RwLock::new(None),
            refresh,
        }
    }

    pub fn table(&self) -> &Address {
        &self.table
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    pub fn guard(&self) -> &ActiveActionGuard {
        &self.guard
    }

    pub fn active_action(&self) -> Option<LifecycleAction> {
        self.guard.current()
    }

    pub fn status(&self) -> Option<LifecycleStatus> {
        self.status.read().clone()
    }

    pub fn clear_status(&self) {
        *self.status.write() = None;
    }

    fn set_status(&self, status: Option<LifecycleStatus>) {
        *self.status.write() = status;
    }

    fn address(&self) -> Result<&Address, LifecycleError> {
        self.identity
            .address
            .as_ref()
            .ok_or(LifecycleError::NotConnected)
    }

    /// The working secret for this table and the local player; empty when
    /// disconnected or nothing has been entered.
    pub fn secret(&self) -> String {
        self.secret.read().clone()
    }

    /// Replace the working secret and write it through to the store. Returns
    /// whether the store kept it; when it did not, the status says so.
    pub fn set_secret(&self, value: &str) -> Result<bool, LifecycleError> {
        let persisted = self.replace_secret(value.to_string())?;
        if !persisted {
            self.set_status(Some(LifecycleStatus::Info(
                UNSAVED_SECRET_STATUS.to_string(),
            )));
        }
        Ok(persisted)
    }

    /// Replace the working secret with a fresh random one.
    pub fn generate_secret(&self) -> Result<String, LifecycleError> {
        let secret = generate_secret();
        let persisted = self.replace_secret(secret.clone())?;
        let message = if persisted {
            GENERATED_SECRET_STATUS.to_string()
        } else {
            format!("{GENERATED_SECRET_STATUS} {UNSAVED_SECRET_STATUS}")
        };
        self.set_status(Some(LifecycleStatus::Info(message)));
        info!(
            target = LOG_TARGET,
            table = %self.table,
            persisted,
            "generated new secret"
        );
        Ok(secret)
    }

    fn replace_secret(&self, value: String) -> Result<bool, LifecycleError> {
        let player = self.address()?;
        let persisted = self.secrets.set(&self.table, player, &value);
        *self.secret.write() = value;
        Ok(persisted)
    }

    /// Hash the commit button would submit right now.
    pub fn commit_preview(&self) -> Option<CommitHash> {
        commit_hash(&self.secret())
    }

    pub fn snapshot(&self) -> Arc<TableSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// Control state for the latest snapshot.
    pub fn legals(&self) -> LifecycleLegals {
        let snapshot = self.snapshot();
        let secret = self.secret();
        LifecycleLegals::evaluate(&GateContext {
            snapshot: &snapshot,
            identity: &self.identity,
            secret: &secret,
            action_pending: self.guard.is_busy(),
        })
    }

    pub async fn start_hand(&self) -> Result<TxReceipt, LifecycleError> {
        self.run(LifecycleAction::StartHand, |gate| {
            gate.check_start_hand()?;
            Ok(TableCall::StartHand)
        })
        .await
    }

    /// Commits to the secret stored at the moment of the call.
    pub async fn submit_commit(&self) -> Result<TxReceipt, LifecycleError> {
        self.run(LifecycleAction::Commit, |gate| {
            gate.check_commit()?;
            let hash = commit_hash(gate.secret).ok_or(GateRefusal::MissingSecret)?;
            Ok(TableCall::SubmitCommit { hash })
        })
        .await
    }

    pub async fn reveal_secret(&self) -> Result<TxReceipt, LifecycleError> {
        self.run(LifecycleAction::Reveal, |gate| {
            gate.check_reveal()?;
            Ok(TableCall::RevealSecret {
                secret: SecretBytes::new(reveal_payload(gate.secret)),
            })
        })
        .await
    }

    /// Sit in when sitting out, otherwise sit out.
    pub async fn toggle_sit(&self) -> Result<TxReceipt, LifecycleError> {
        self.run(LifecycleAction::SitOut, |gate| {
            Ok(match gate.sit_toggle()? {
                SitToggle::SitIn => TableCall::SitIn,
                SitToggle::SitOut => TableCall::SitOut,
            })
        })
        .await
    }

    /// Request leaving after the hand, or cancel a pending request.
    pub async fn toggle_leave(&self) -> Result<TxReceipt, LifecycleError> {
        self.run(LifecycleAction::Leave, |gate| {
            Ok(match gate.leave_toggle()? {
                LeaveToggle::LeaveAfterHand => TableCall::LeaveAfterHand,
                LeaveToggle::CancelLeave => TableCall::CancelLeaveAfterHand,
            })
        })
        .await
    }

    pub async fn leave_table(&self) -> Result<TxReceipt, LifecycleError> {
        self.run(LifecycleAction::Leave, |gate| {
            gate.check_seated()?;
            Ok(TableCall::LeaveTable)
        })
        .await
    }

    /// Ask the ledger to expire the acting player. Whether the deadline has
    /// actually passed is for the ledger to decide.
    pub async fn handle_timeout(&self) -> Result<TxReceipt, LifecycleError> {
        self.run(LifecycleAction::HandleTimeout, |gate| {
            gate.check_seated()?;
            if gate.snapshot.game.action_on.is_none() {
                return Err(GateRefusal::WrongPhase(gate.snapshot.game.phase));
            }
            Ok(TableCall::HandleTimeout)
        })
        .await
    }

    fn refusal(&self, action: LifecycleAction, reason: GateRefusal) -> LifecycleError {
        match reason {
            GateRefusal::NotConnected => LifecycleError::NotConnected,
            GateRefusal::ActionPending => {
                LifecycleError::Busy(self.guard.current().unwrap_or(action))
            }
            GateRefusal::MissingSecret => LifecycleError::MissingSecret,
            reason => LifecycleError::NotPermitted { action, reason },
        }
    }

    async fn run<F>(&self, action: LifecycleAction, build: F) -> Result<TxReceipt, LifecycleError>
    where
        F: FnOnce(&GateContext<'_>) -> Result<TableCall, GateRefusal>,
    {
        self.address()?;
        let call = {
            let snapshot = self.snapshot();
            let secret = self.secret();
            let gate = GateContext {
                snapshot: &snapshot,
                identity: &self.identity,
                secret: &secret,
                action_pending: self.guard.is_busy(),
            };
            build(&gate).map_err(|reason| self.refusal(action, reason))?
        };

        let permit = self
            .guard
            .try_acquire(action)
            .map_err(LifecycleError::Busy)?;
        self.set_status(None);
        info!(
            target = LOG_TARGET,
            table = %self.table,
            %action,
            function = call.function_name(),
            "submitting lifecycle call"
        );

        let result = self.writer.submit(&self.table, call).await;
        drop(permit);

        match result {
            Ok(receipt) => {
                info!(
                    target = LOG_TARGET,
                    table = %self.table,
                    %action,
                    tx = %receipt.hash,
                    "lifecycle call confirmed"
                );
                self.set_status(Some(LifecycleStatus::Submitted));
                self.refresh.notify_one();
                Ok(receipt)
            }
            Err(err) => {
                warn!(
                    target = LOG_TARGET,
                    table = %self.table,
                    %action,
                    error = %err,
                    "lifecycle call failed"
                );
                self.set_status(Some(LifecycleStatus::Failed(err.to_string())));
                Err(err.into())
            }
        }
    }
}
