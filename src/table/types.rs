use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::phase::GamePhase;

pub type Chips = u64;
pub type SeatIndex = u8; // 0..MAX_SEATS
pub type CardValue = u8; // 0..=51 once decrypted

pub const MAX_SEATS: usize = 5;

/// Account identity as reported by the ledger. Comparisons ignore ASCII case
/// because wallets and view functions disagree on hex casing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ledger views report empty seats as `0x0` or an empty string.
    pub fn is_empty_account(&self) -> bool {
        self.0.is_empty() || self.0 == "0x0"
    }

    pub fn to_lowercase(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// `0x1234...abcd` style short form for logs and status lines.
    pub fn short(&self) -> String {
        if self.0.len() <= 10 {
            return self.0.clone();
        }
        match (self.0.get(..6), self.0.get(self.0.len() - 4..)) {
            (Some(head), Some(tail)) => format!("{head}...{tail}"),
            _ => self.0.clone(),
        }
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Address {}

impl PartialEq<str> for Address {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    #[default]
    Active, // still contesting the hand
    Folded,
    AllIn,
    Out, // not dealt in
}

impl SeatStatus {
    /// Ledger status codes: 0 active, 1 folded, 2 all-in, 3 out.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SeatStatus::Active),
            1 => Some(SeatStatus::Folded),
            2 => Some(SeatStatus::AllIn),
            3 => Some(SeatStatus::Out),
            _ => None,
        }
    }

    pub fn as_code(self) -> u8 {
        match self {
            SeatStatus::Active => 0,
            SeatStatus::Folded => 1,
            SeatStatus::AllIn => 2,
            SeatStatus::Out => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeatStatus::Active => "Active",
            SeatStatus::Folded => "Folded",
            SeatStatus::AllIn => "All-in",
            SeatStatus::Out => "Out",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatInfo {
    pub player: Address,
    pub chips: Chips,
    pub sitting_out: bool,
    pub current_bet: Chips,
    pub status: SeatStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOn {
    pub seat_index: SeatIndex,
    pub player_address: Address,
    /// Unix seconds. Advisory only; nothing in the client expires it.
    pub deadline: i64,
}

impl ActionOn {
    pub fn deadline_at(&self) -> Option<OffsetDateTime> {
        if self.deadline <= 0 {
            return None;
        }
        OffsetDateTime::from_unix_timestamp(self.deadline).ok()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    pub pot_size: Chips,
    pub community_cards: Vec<CardValue>,
    pub current_bets: Vec<Chips>,
    pub player_statuses: Vec<SeatStatus>,
    pub min_raise: Chips,
    pub max_current_bet: Chips,
    pub action_on: Option<ActionOn>,
}

impl GameState {
    pub fn max_bet(current_bets: &[Chips]) -> Chips {
        current_bets.iter().copied().max().unwrap_or(0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub min_buy_in: Chips,
    pub max_buy_in: Chips,
    pub ante: Chips,
    pub straddle_enabled: bool,
    pub fee_basis_points: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    pub hand_number: u64,
    pub dealer_seat: SeatIndex,
    pub next_big_blind: SeatIndex,
    pub total_fees_collected: Chips,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatCount {
    pub occupied: u8,
    pub total: u8,
}

impl Default for SeatCount {
    fn default() -> Self {
        Self {
            occupied: 0,
            total: MAX_SEATS as u8,
        }
    }
}

/// Encrypted hole cards for the current hand. `encrypted[i]` belongs to the
/// seat at `players_in_hand[i]`, not to seat `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleCardTable {
    pub players_in_hand: Vec<SeatIndex>,
    pub encrypted: Vec<[u8; 2]>,
}

impl HoleCardTable {
    pub fn pair_for_seat(&self, seat: SeatIndex) -> Option<[u8; 2]> {
        let position = self.players_in_hand.iter().position(|s| *s == seat)?;
        self.encrypted.get(position).copied()
    }
}

/// Everything one poll cycle fetches for a table. Replaced wholesale per poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub table: Address,
    pub config: TableConfig,
    pub state: TableState,
    pub seats: Vec<Option<SeatInfo>>,
    pub game: GameState,
    pub hole_cards: HoleCardTable,
    pub paused: bool,
    pub admin_only_start: bool,
    pub admin: Option<Address>,
    pub pending_leaves: Vec<bool>,
    pub seat_count: SeatCount,
}

impl TableSnapshot {
    pub fn empty(table: Address) -> Self {
        Self {
            table,
            config: TableConfig::default(),
            state: TableState::default(),
            seats: vec![None; MAX_SEATS],
            game: GameState::default(),
            hole_cards: HoleCardTable::default(),
            paused: false,
            admin_only_start: false,
            admin: None,
            pending_leaves: vec![false; MAX_SEATS],
            seat_count: SeatCount::default(),
        }
    }

    pub fn seat(&self, seat: SeatIndex) -> Option<&SeatInfo> {
        self.seats.get(seat as usize).and_then(Option::as_ref)
    }

    /// First occupied seat held by `player`.
    pub fn seat_of(&self, player: &Address) -> Option<SeatIndex> {
        self.seats
            .iter()
            .position(|seat| seat.as_ref().is_some_and(|info| info.player == *player))
            .map(|idx| idx as SeatIndex)
    }

    /// Occupied seats that are not sitting out.
    pub fn active_seat_count(&self) -> usize {
        self.seats
            .iter()
            .flatten()
            .filter(|info| !info.sitting_out)
            .count()
    }

    pub fn pending_leave(&self, seat: SeatIndex) -> bool {
        self.pending_leaves
            .get(seat as usize)
            .copied()
            .unwrap_or(false)
    }

    pub fn is_admin(&self, player: &Address) -> bool {
        self.admin.as_ref().is_some_and(|admin| admin == player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(player: &str, sitting_out: bool) -> SeatInfo {
        SeatInfo {
            player: Address::new(player),
            chips: 1_000,
            sitting_out,
            current_bet: 0,
            status: SeatStatus::Active,
        }
    }

    #[test]
    fn address_equality_ignores_case() {
        assert_eq!(Address::new("0xAA11"), Address::new("0xaa11"));
        assert_ne!(Address::new("0xaa11"), Address::new("0xaa12"));
        assert!(Address::new("0xAbC") == *"0xabc");
    }

    #[test]
    fn empty_accounts_are_recognised() {
        assert!(Address::new("0x0").is_empty_account());
        assert!(Address::new("").is_empty_account());
        assert!(!Address::new("0x1").is_empty_account());
    }

    #[test]
    fn short_address_keeps_prefix_and_suffix() {
        let addr = Address::new("0x1234567890abcdef");
        assert_eq!(addr.short(), "0x1234...cdef");
        assert_eq!(Address::new("0x12").short(), "0x12");
    }

    #[test]
    fn seat_status_codes_map_both_ways() {
        for code in 0..4u8 {
            let status = SeatStatus::from_code(code).unwrap();
            assert_eq!(status.as_code(), code);
        }
        assert_eq!(SeatStatus::from_code(9), None);
    }

    #[test]
    fn hole_card_pairs_follow_players_in_hand_order() {
        let table = HoleCardTable {
            players_in_hand: vec![3, 0, 4],
            encrypted: vec![[1, 2], [3, 4], [5, 6]],
        };
        assert_eq!(table.pair_for_seat(0), Some([3, 4]));
        assert_eq!(table.pair_for_seat(4), Some([5, 6]));
        assert_eq!(table.pair_for_seat(1), None);
    }

    #[test]
    fn hole_card_lookup_tolerates_short_pair_list() {
        let table = HoleCardTable {
            players_in_hand: vec![0, 1],
            encrypted: vec![[9, 9]],
        };
        assert_eq!(table.pair_for_seat(1), None);
    }

    #[test]
    fn snapshot_seat_helpers() {
        let mut snapshot = TableSnapshot::empty(Address::new("0xtable"));
        snapshot.seats[1] = Some(seat("0xAbCd", false));
        snapshot.seats[3] = Some(seat("0xbeef", true));
        snapshot.pending_leaves[3] = true;
        snapshot.admin = Some(Address::new("0xBEEF"));

        assert_eq!(snapshot.seat_of(&Address::new("0xabcd")), Some(1));
        assert_eq!(snapshot.seat_of(&Address::new("0xdead")), None);
        assert_eq!(snapshot.active_seat_count(), 1);
        assert!(snapshot.pending_leave(3));
        assert!(!snapshot.pending_leave(7));
        assert!(snapshot.is_admin(&Address::new("0xbeef")));
    }

    #[test]
    fn deadline_is_informational() {
        let action_on = ActionOn {
            seat_index: 1,
            player_address: Address::new("0xaa"),
            deadline: 1_700_000_000,
        };
        let at = action_on.deadline_at().unwrap();
        assert_eq!(at.unix_timestamp(), 1_700_000_000);

        let no_deadline = ActionOn {
            deadline: 0,
            ..action_on
        };
        assert!(no_deadline.deadline_at().is_none());
    }

    #[test]
    fn max_bet_of_empty_list_is_zero() {
        assert_eq!(GameState::max_bet(&[]), 0);
        assert_eq!(GameState::max_bet(&[5, 40, 10]), 40);
    }
}
