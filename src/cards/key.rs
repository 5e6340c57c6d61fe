use sha3::{Digest, Sha3_256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::table::types::SeatIndex;

/// Domain tag the ledger program prefixes to every card key preimage.
pub const CARD_KEY_DOMAIN: &[u8] = b"holdem_cards";

/// 32-byte XOR key for one seat's hole cards. Recomputed on demand, never stored.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CardKey([u8; 32]);

impl CardKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8]> for CardKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for CardKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CardKey(..)")
    }
}

/// `SHA3-256("holdem_cards" || secret || seat)`, the seat encoded as one byte.
/// Must stay byte-identical to the ledger's derivation; any drift silently
/// yields garbage cards rather than an error.
pub fn derive_card_key(secret: &[u8], seat: SeatIndex) -> CardKey {
    let mut hasher = Sha3_256::new();
    hasher.update(CARD_KEY_DOMAIN);
    hasher.update(secret);
    hasher.update([seat]);
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    CardKey(bytes)
}
