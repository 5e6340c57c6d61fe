use serde::Serialize;
use tracing::debug;

use super::codec::{are_cards_valid, decode_card, xor_decrypt, Card};
use super::key::derive_card_key;
use crate::table::phase::GamePhase;
use crate::table::types::{HoleCardTable, SeatIndex};

const LOG_TARGET: &str = "holdem_client::cards::hole";

/// What the client can show for one seat's hole cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "cards", rename_all = "snake_case")]
pub enum HoleCards {
    /// Nothing dealt yet, or the seat is not in the hand.
    Hidden,
    /// Encrypted cards exist but the local secret does not open them.
    Unavailable,
    Revealed([Card; 2]),
}

impl HoleCards {
    pub fn cards(&self) -> Option<[Card; 2]> {
        match self {
            HoleCards::Revealed(cards) => Some(*cards),
            _ => None,
        }
    }
}

impl std::fmt::Display for HoleCards {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HoleCards::Hidden => f.write_str("-"),
            HoleCards::Unavailable => f.write_str("cards unavailable"),
            HoleCards::Revealed([a, b]) => write!(f, "{a} {b}"),
        }
    }
}

/// Decrypt `seat`'s pair with the key derived from `secret`. Out-of-range
/// results mean a wrong or stale secret and are reported as unavailable.
pub fn reveal_hole_cards(
    phase: GamePhase,
    table: &HoleCardTable,
    seat: SeatIndex,
    secret: &str,
) -> HoleCards {
    if !phase.hole_cards_visible() {
        return HoleCards::Hidden;
    }
    let Some(encrypted) = table.pair_for_seat(seat) else {
        return HoleCards::Hidden;
    };
    if secret.is_empty() {
        return HoleCards::Unavailable;
    }

    let key = derive_card_key(secret.as_bytes(), seat);
    let decrypted = xor_decrypt(encrypted, key.as_ref());
    if !are_cards_valid(&decrypted) {
        debug!(target = LOG_TARGET, seat, "decrypted hole cards out of range");
        return HoleCards::Unavailable;
    }

    match (decode_card(decrypted[0]), decode_card(decrypted[1])) {
        (Some(first), Some(second)) => HoleCards::Revealed([first, second]),
        _ => HoleCards::Unavailable,
    }
}
