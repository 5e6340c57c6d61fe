pub mod codec;
pub mod hole;
pub mod key;

pub use codec::{
    are_cards_valid, decode_card, format_card, format_cards, is_valid_card, xor_decrypt, Card,
    Suit, DECK_SIZE,
};
pub use hole::{reveal_hole_cards, HoleCards};
pub use key::{derive_card_key, CardKey, CARD_KEY_DOMAIN};
