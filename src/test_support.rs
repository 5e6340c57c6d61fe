#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Semaphore;

use crate::ledger::{LedgerError, LedgerReader, LedgerWriter, TableCall, TxReceipt};
use crate::table::{
    ActionOn, Address, CardValue, Chips, GamePhase, SeatCount, SeatIndex, SeatInfo, SeatStatus,
    TableConfig, TableSnapshot, TableState,
};

const FIXTURE_TABLE: &str = "0x7ab1e";

/// Scripted ledger serving one mutable table state to any table address.
pub struct FakeLedger {
    state: RwLock<TableSnapshot>,
    fail_queries: AtomicBool,
    next_failure: Mutex<Option<LedgerError>>,
    hold: Mutex<Option<Arc<Semaphore>>>,
    submitted: Mutex<Vec<TableCall>>,
    phase_reads: AtomicUsize,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TableSnapshot::empty(Address::new(FIXTURE_TABLE))),
            fail_queries: AtomicBool::new(false),
            next_failure: Mutex::new(None),
            hold: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
            phase_reads: AtomicUsize::new(0),
        }
    }

    pub fn table(&self) -> Address {
        Address::new(FIXTURE_TABLE)
    }

    pub fn update(&self, edit: impl FnOnce(&mut TableSnapshot)) {
        edit(&mut self.state.write());
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_next_submit(&self, err: LedgerError) {
        *self.next_failure.lock() = Some(err);
    }

    /// Blocks every later submission until a permit is added per call.
    pub fn hold_submissions(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.hold.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn submitted(&self) -> Vec<TableCall> {
        self.submitted.lock().clone()
    }

    /// Number of full snapshot reads served so far.
    pub fn snapshot_reads(&self) -> usize {
        self.phase_reads.load(Ordering::SeqCst)
    }

    fn read<T>(&self, pick: impl FnOnce(&TableSnapshot) -> T) -> Result<T, LedgerError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("connection refused".to_string()));
        }
        Ok(pick(&self.state.read()))
    }
}

impl Default for FakeLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerReader for FakeLedger {
    async fn table_config(&self, _table: &Address) -> Result<TableConfig, LedgerError> {
        self.read(|s| s.config.clone())
    }

    async fn table_state(&self, _table: &Address) -> Result<TableState, LedgerError> {
        self.read(|s| s.state.clone())
    }

    async fn seat_info(
        &self,
        _table: &Address,
        seat: SeatIndex,
    ) -> Result<Option<SeatInfo>, LedgerError> {
        self.read(|s| s.seats.get(seat as usize).cloned().flatten())
    }

    async fn game_phase(&self, _table: &Address) -> Result<GamePhase, LedgerError> {
        self.phase_reads.fetch_add(1, Ordering::SeqCst);
        self.read(|s| s.game.phase)
    }

    async fn pot_size(&self, _table: &Address) -> Result<Chips, LedgerError> {
        self.read(|s| s.game.pot_size)
    }

    async fn community_cards(&self, _table: &Address) -> Result<Vec<CardValue>, LedgerError> {
        self.read(|s| s.game.community_cards.clone())
    }

    async fn action_on(&self, _table: &Address) -> Result<Option<ActionOn>, LedgerError> {
        self.read(|s| s.game.action_on.clone())
    }

    async fn current_bets(&self, _table: &Address) -> Result<Vec<Chips>, LedgerError> {
        self.read(|s| s.game.current_bets.clone())
    }

    async fn player_statuses(&self, _table: &Address) -> Result<Vec<SeatStatus>, LedgerError> {
        self.read(|s| s.game.player_statuses.clone())
    }

    async fn min_raise(&self, _table: &Address) -> Result<Chips, LedgerError> {
        self.read(|s| s.game.min_raise)
    }

    async fn call_amount(&self, _table: &Address, seat: SeatIndex) -> Result<Chips, LedgerError> {
        self.read(|s| {
            let max = s.game.current_bets.iter().copied().max().unwrap_or(0);
            let mine = s.game.current_bets.get(seat as usize).copied().unwrap_or(0);
            max.saturating_sub(mine)
        })
    }

    async fn is_paused(&self, _table: &Address) -> Result<bool, LedgerError> {
        self.read(|s| s.paused)
    }

    async fn is_admin_only_start(&self, _table: &Address) -> Result<bool, LedgerError> {
        self.read(|s| s.admin_only_start)
    }

    async fn admin(&self, _table: &Address) -> Result<Address, LedgerError> {
        self.read(|s| s.admin.clone().unwrap_or_else(|| Address::new("0x0")))
    }

    async fn pending_leaves(&self, _table: &Address) -> Result<Vec<bool>, LedgerError> {
        self.read(|s| s.pending_leaves.clone())
    }

    async fn seat_count(&self, _table: &Address) -> Result<SeatCount, LedgerError> {
        self.read(|s| s.seat_count)
    }

    async fn players_in_hand(&self, _table: &Address) -> Result<Vec<SeatIndex>, LedgerError> {
        self.read(|s| s.hole_cards.players_in_hand.clone())
    }

    async fn encrypted_hole_cards(&self, _table: &Address) -> Result<Vec<[u8; 2]>, LedgerError> {
        self.read(|s| s.hole_cards.encrypted.clone())
    }
}

#[async_trait]
impl LedgerWriter for FakeLedger {
    async fn submit(&self, _table: &Address, call: TableCall) -> Result<TxReceipt, LedgerError> {
        let hold = self.hold.lock().clone();
        if let Some(gate) = hold {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        // Every attempt is recorded, including rejected ones.
        let attempt = {
            let mut submitted = self.submitted.lock();
            submitted.push(call);
            submitted.len()
        };
        if let Some(err) = self.next_failure.lock().take() {
            return Err(err);
        }
        Ok(TxReceipt {
            hash: format!("0x{attempt:064x}"),
        })
    }
}
