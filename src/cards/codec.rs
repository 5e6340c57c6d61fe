//! Card integer decoding and the XOR cipher used for hole cards

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::table::types::CardValue;

pub const DECK_SIZE: u8 = 52;

/// Display ranks; `value % 13` indexes this table.
const RANKS: [&str; 13] = ["2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K", "A"];

/// Display suits; `value / 13` indexes this table.
const SUITS: [&str; 4] = ["♠", "♥", "♦", "♣"];

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suit {
    Spades = 0,
    Hearts = 1,
    Diamonds = 2,
    Clubs = 3,
}

impl Suit {
    fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Suit::Spades),
            1 => Some(Suit::Hearts),
            2 => Some(Suit::Diamonds),
            3 => Some(Suit::Clubs),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        SUITS[self as usize]
    }

    pub fn is_red(self) -> bool {
        matches!(self, Suit::Hearts | Suit::Diamonds)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    /// 0 = deuce .. 12 = ace
    pub rank: u8,
    pub suit: Suit,
}

impl Card {
    pub fn rank_label(&self) -> &'static str {
        RANKS[self.rank as usize]
    }

    pub fn value(&self) -> CardValue {
        self.suit as u8 * 13 + self.rank
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank_label(), self.suit.symbol())
    }
}

pub fn is_valid_card(value: CardValue) -> bool {
    value < DECK_SIZE
}

pub fn are_cards_valid(cards: &[CardValue]) -> bool {
    cards.len() == 2 && cards.iter().all(|&c| is_valid_card(c))
}

/// `None` for anything outside 0..=51.
pub fn decode_card(value: CardValue) -> Option<Card> {
    if !is_valid_card(value) {
        return None;
    }
    Some(Card {
        rank: value % 13,
        suit: Suit::from_index(value / 13)?,
    })
}

/// XOR each byte with `key[i % key.len()]`. Self-inverse, so it both encrypts
/// and decrypts. An empty key leaves the input unchanged.
pub fn xor_decrypt<const N: usize>(encrypted: [u8; N], key: &[u8]) -> [u8; N] {
    if key.is_empty() {
        return encrypted;
    }
    let mut out = encrypted;
    for (i, byte) in out.iter_mut().enumerate() {
        *byte ^= key[i % key.len()];
    }
    out
}

pub fn format_card(value: CardValue) -> String {
    match decode_card(value) {
        Some(card) => card.to_string(),
        None => "??".to_string(),
    }
}

pub fn format_cards(cards: &[CardValue]) -> String {
    cards
        .iter()
        .map(|&c| format_card(c))
        .collect::<Vec<_>>()
        .join(", ")
}
