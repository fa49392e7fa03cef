use std::fmt;

use serde::{Deserialize, Serialize};

pub const SUIT_NUM: u8 = 4;
pub const RANK_NUM: u8 = 13;
pub const CARD_NUM: usize = (SUIT_NUM * RANK_NUM) as usize;

pub const SUIT_CHARS: &[u8; 4] = b"SDCH";
pub const RANK_CHARS: &[u8; 13] = b"A23456789TJQK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Diamonds,
    Clubs,
    Hearts,
}

impl Suit {
    #[inline]
    pub fn all() -> [Suit; 4] {
        [Suit::Spades, Suit::Diamonds, Suit::Clubs, Suit::Hearts]
    }

    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Suit::Spades => 0,
            Suit::Diamonds => 1,
            Suit::Clubs => 2,
            Suit::Hearts => 3,
        }
    }

    #[inline]
    pub fn from_index(idx: u8) -> Suit {
        match idx % SUIT_NUM {
            0 => Suit::Spades,
            1 => Suit::Diamonds,
            2 => Suit::Clubs,
            _ => Suit::Hearts,
        }
    }

    #[inline]
    pub fn is_red(self) -> bool {
        matches!(self, Suit::Diamonds | Suit::Hearts)
    }

    /// The two suits of the other colour, in suit order.
    #[inline]
    pub fn opposite_colour(self) -> [Suit; 2] {
        if self.is_red() {
            [Suit::Spades, Suit::Clubs]
        } else {
            [Suit::Diamonds, Suit::Hearts]
        }
    }
}

/// A card identifier in `0..52`, laid out as `suit + 4 * rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card(u8);

impl Card {
    #[inline]
    pub fn new(suit: Suit, rank: u8) -> Self {
        debug_assert!(rank < RANK_NUM);
        Card(suit.index() + SUIT_NUM * rank)
    }

    #[inline]
    pub fn from_id(id: u8) -> Option<Self> {
        if (id as usize) < CARD_NUM {
            Some(Card(id))
        } else {
            None
        }
    }

    #[inline]
    pub fn id(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn suit(self) -> Suit {
        Suit::from_index(self.0 % SUIT_NUM)
    }

    /// Zero-based rank: ace is 0, king is 12.
    #[inline]
    pub fn rank(self) -> u8 {
        self.0 / SUIT_NUM
    }

    #[inline]
    pub fn is_red(self) -> bool {
        self.suit().is_red()
    }

    /// All 52 cards in identifier order.
    pub fn deck() -> impl Iterator<Item = Card> {
        (0..CARD_NUM as u8).map(Card)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = RANK_CHARS[self.rank() as usize] as char;
        let s = SUIT_CHARS[self.suit().index() as usize] as char;
        write!(f, "{r}{s}")
    }
}
