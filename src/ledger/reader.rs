use futures::future::join_all;
use tracing::{debug, warn};

use super::client::LedgerReader;
use super::error::LedgerError;
use crate::table::types::{
    Address, GameState, HoleCardTable, SeatIndex, TableSnapshot, MAX_SEATS,
};

const LOG_TARGET: &str = "holdem_client::ledger::reader";

/// Unwraps one query result, substituting `default` and logging on failure.
fn or_default<T>(
    table: &Address,
    query: &'static str,
    result: Result<T, LedgerError>,
    default: T,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(
                target = LOG_TARGET,
                %table,
                query,
                error = %err,
                "view query failed; using default"
            );
            default
        }
    }
}

/// Fetch every view the client needs for one refresh. Queries are issued
/// concurrently and each failure falls back to a conservative default so a
/// single bad view never blanks the whole table.
pub async fn read_snapshot(reader: &dyn LedgerReader, table: &Address) -> TableSnapshot {
    let seats = join_all((0..MAX_SEATS as SeatIndex).map(|seat| reader.seat_info(table, seat)));

    let (
        (config, state, phase, pot_size, community_cards, action_on),
        (current_bets, player_statuses, min_raise, paused, admin_only_start, admin),
        (pending_leaves, seat_count, players_in_hand, encrypted, seats),
    ) = futures::join!(
        async {
            futures::join!(
                reader.table_config(table),
                reader.table_state(table),
                reader.game_phase(table),
                reader.pot_size(table),
                reader.community_cards(table),
                reader.action_on(table),
            )
        },
        async {
            futures::join!(
                reader.current_bets(table),
                reader.player_statuses(table),
                reader.min_raise(table),
                reader.is_paused(table),
                reader.is_admin_only_start(table),
                reader.admin(table),
            )
        },
        async {
            futures::join!(
                reader.pending_leaves(table),
                reader.seat_count(table),
                reader.players_in_hand(table),
                reader.encrypted_hole_cards(table),
                seats,
            )
        },
    );

    let mut snapshot = TableSnapshot::empty(table.clone());
    snapshot.config = or_default(table, "table_config", config, Default::default());
    snapshot.state = or_default(table, "table_state", state, Default::default());
    snapshot.seats = seats
        .into_iter()
        .enumerate()
        .map(|(seat, result)| match result {
            Ok(info) => info.filter(|info| !info.player.is_empty_account()),
            Err(err) => {
                warn!(
                    target = LOG_TARGET,
                    %table,
                    seat,
                    error = %err,
                    "seat query failed; treating as empty"
                );
                None
            }
        })
        .collect();

    let current_bets = or_default(table, "current_bets", current_bets, Vec::new());
    snapshot.game = GameState {
        phase: or_default(table, "game_phase", phase, Default::default()),
        pot_size: or_default(table, "pot_size", pot_size, 0),
        community_cards: or_default(table, "community_cards", community_cards, Vec::new()),
        max_current_bet: GameState::max_bet(&current_bets),
        current_bets,
        player_statuses: or_default(table, "player_statuses", player_statuses, Vec::new()),
        min_raise: or_default(table, "min_raise", min_raise, 0),
        action_on: or_default(table, "action_on", action_on, None),
    };

    snapshot.hole_cards = HoleCardTable {
        players_in_hand: or_default(table, "players_in_hand", players_in_hand, Vec::new()),
        encrypted: or_default(table, "encrypted_hole_cards", encrypted, Vec::new()),
    };
    snapshot.paused = or_default(table, "is_paused", paused, false);
    snapshot.admin_only_start = or_default(table, "is_admin_only_start", admin_only_start, false);
    snapshot.admin = or_default(table, "admin", admin.map(Some), None)
        .filter(|admin| !admin.is_empty_account());

    let mut pending_leaves = or_default(table, "pending_leaves", pending_leaves, Vec::new());
    pending_leaves.resize(MAX_SEATS, false);
    snapshot.pending_leaves = pending_leaves;
    snapshot.seat_count = or_default(table, "seat_count", seat_count, Default::default());

    debug!(
        target = LOG_TARGET,
        %table,
        phase = %snapshot.game.phase.name(),
        hand = snapshot.state.hand_number,
        pot = snapshot.game.pot_size,
        "table snapshot refreshed"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::phase::GamePhase;
    use crate::table::types::{ActionOn, SeatInfo, SeatStatus};
    use crate::test_support::FakeLedger;

    fn occupied(player: &str) -> SeatInfo {
        SeatInfo {
            player: Address::new(player),
            chips: 900,
            sitting_out: false,
            current_bet: 20,
            status: SeatStatus::Active,
        }
    }

    #[tokio::test]
    async fn snapshot_reflects_ledger_views() {
        let ledger = FakeLedger::new();
        ledger.update(|s| {
            s.seats[0] = Some(occupied("0xaa"));
            s.seats[3] = Some(occupied("0xbb"));
            s.game.phase = GamePhase::Flop;
            s.game.current_bets = vec![20, 0, 0, 60, 0];
            s.game.pot_size = 140;
            s.game.action_on = Some(ActionOn {
                seat_index: 3,
                player_address: Address::new("0xbb"),
                deadline: 1_700_000_000,
            });
            s.pending_leaves = vec![false, false, false, true, false];
            s.admin = Some(Address::new("0xaa"));
        });

        let table = ledger.table();
        let snapshot = read_snapshot(&ledger, &table).await;
        assert_eq!(snapshot.game.phase, GamePhase::Flop);
        assert_eq!(snapshot.game.max_current_bet, 60);
        assert_eq!(snapshot.game.pot_size, 140);
        assert_eq!(snapshot.seat_of(&Address::new("0xBB")), Some(3));
        assert!(snapshot.pending_leave(3));
        assert!(snapshot.is_admin(&Address::new("0xAA")));
        assert_eq!(snapshot.seats.len(), MAX_SEATS);
    }

    #[tokio::test]
    async fn failing_queries_fall_back_to_defaults() {
        let ledger = FakeLedger::new();
        ledger.update(|s| {
            s.game.phase = GamePhase::Reveal;
            s.paused = true;
            s.seats[1] = Some(occupied("0xaa"));
        });
        ledger.fail_queries(true);

        let table = ledger.table();
        let snapshot = read_snapshot(&ledger, &table).await;
        assert_eq!(snapshot.game.phase, GamePhase::Waiting);
        assert!(!snapshot.paused);
        assert!(snapshot.seats.iter().all(Option::is_none));
        assert_eq!(snapshot.pending_leaves, vec![false; MAX_SEATS]);
        assert_eq!(snapshot.seat_count.total, MAX_SEATS as u8);
        assert!(snapshot.game.action_on.is_none());
    }

    #[tokio::test]
    async fn zero_address_seats_and_admin_read_as_empty() {
        let ledger = FakeLedger::new();
        ledger.update(|s| {
            s.seats[2] = Some(occupied("0x0"));
            s.admin = Some(Address::new("0x0"));
            s.pending_leaves = vec![true];
        });
        let table = ledger.table();
        let snapshot = read_snapshot(&ledger, &table).await;
        assert!(snapshot.seat(2).is_none());
        assert!(snapshot.admin.is_none());
        assert_eq!(snapshot.pending_leaves.len(), MAX_SEATS);
        assert!(snapshot.pending_leave(0));
    }
}
