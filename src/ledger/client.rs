use async_trait::async_trait;

use super::calls::TableCall;
use super::error::LedgerError;
use crate::table::phase::GamePhase;
use crate::table::types::{
    ActionOn, Address, CardValue, Chips, SeatCount, SeatIndex, SeatInfo, SeatStatus, TableConfig,
    TableState,
};

/// Read-only table views exposed by the ledger program.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn table_config(&self, table: &Address) -> Result<TableConfig, LedgerError>;

    async fn table_state(&self, table: &Address) -> Result<TableState, LedgerError>;

    /// `None` for an empty seat.
    async fn seat_info(
        &self,
        table: &Address,
        seat: SeatIndex,
    ) -> Result<Option<SeatInfo>, LedgerError>;

    async fn game_phase(&self, table: &Address) -> Result<GamePhase, LedgerError>;

    async fn pot_size(&self, table: &Address) -> Result<Chips, LedgerError>;

    async fn community_cards(&self, table: &Address) -> Result<Vec<CardValue>, LedgerError>;

    async fn action_on(&self, table: &Address) -> Result<Option<ActionOn>, LedgerError>;

    async fn current_bets(&self, table: &Address) -> Result<Vec<Chips>, LedgerError>;

    async fn player_statuses(&self, table: &Address) -> Result<Vec<SeatStatus>, LedgerError>;

    async fn min_raise(&self, table: &Address) -> Result<Chips, LedgerError>;

    async fn call_amount(&self, table: &Address, seat: SeatIndex) -> Result<Chips, LedgerError>;

    async fn is_paused(&self, table: &Address) -> Result<bool, LedgerError>;

    async fn is_admin_only_start(&self, table: &Address) -> Result<bool, LedgerError>;

    async fn admin(&self, table: &Address) -> Result<Address, LedgerError>;

    async fn pending_leaves(&self, table: &Address) -> Result<Vec<bool>, LedgerError>;

    async fn seat_count(&self, table: &Address) -> Result<SeatCount, LedgerError>;

    async fn players_in_hand(&self, table: &Address) -> Result<Vec<SeatIndex>, LedgerError>;

    /// Parallel to `players_in_hand`.
    async fn encrypted_hole_cards(&self, table: &Address) -> Result<Vec<[u8; 2]>, LedgerError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: String,
}

/// Signs, submits and waits for confirmation of a table call. Implemented by
/// the wallet integration; returns only once the ledger has confirmed or failed.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    async fn submit(&self, table: &Address, call: TableCall) -> Result<TxReceipt, LedgerError>;
}
