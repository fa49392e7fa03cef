//! TriPeaks: three overlapping peaks of 28 cards over a 24-card stock.
//!
//! ```text
//!      O     O     O          row 0
//!     O O   O O   O O         row 1
//!    O O O O O O O O O        row 2
//!   A A A A A A A A A A       row 3
//! ```
//!
//! A peak card is playable once both cards overlapping it are gone, and is
//! moved onto the waste when its rank is one above or below the waste top
//! (king and ace wrap). The stock can be drawn one card at a time. The game
//! is won when the three peak tops are cleared.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::{check_full_deck, format_pile, parse_pile};
use crate::error::DealError;
use crate::hash::DedupKey;
use crate::rng::DealRng;
use crate::state::{Game, Scored};
use crate::types::{Card, CARD_NUM, RANK_NUM};

pub const ROW_NUM: usize = 4;
pub const ROW_LEN: [usize; ROW_NUM] = [7, 8, 9, 10];
const ROW_MAX: usize = 10;
pub const STOCK_POS: usize = ROW_NUM;
pub const DESK_SIZE: usize = ROW_NUM + 1;
pub const STOCK_SIZE: usize = 24;

/// Dealt card counts per pile: three rows of the peaks, the base row, the stock.
pub const DEAL_SIZES: [usize; DESK_SIZE] = [3, 6, 9, 10, STOCK_SIZE];

/// Positions inside each row that hold a card at the deal; the rest are gaps
/// between the peaks.
const ROW_SLOTS: [&[usize]; ROW_NUM] = [
    &[0, 3, 6],
    &[0, 1, 3, 4, 6, 7],
    &[0, 1, 2, 3, 4, 5, 6, 7, 8],
    &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
];

/// Points per cleared peak top in the score policy.
pub const PEAK_TOP_BONUS: i64 = 15;

/// A move encoded as `pile + 5 * index`.
///
/// For piles 0..4 the index is the position in that row of the peak card to
/// play. For the stock pile the index is the stock pointer minus one at the
/// time of the draw, which makes the draw exactly reversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeaksMove(u8);

impl PeaksMove {
    #[inline]
    pub fn play(row: usize, index: usize) -> Self {
        debug_assert!(row < ROW_NUM && index < ROW_LEN[row]);
        PeaksMove((row + DESK_SIZE * index) as u8)
    }

    #[inline]
    pub fn draw(index: usize) -> Self {
        debug_assert!(index < STOCK_SIZE);
        PeaksMove((STOCK_POS + DESK_SIZE * index) as u8)
    }

    #[inline]
    pub fn from_code(code: u8) -> Self {
        PeaksMove(code)
    }

    #[inline]
    pub fn code(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn pile(self) -> usize {
        self.0 as usize % DESK_SIZE
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize / DESK_SIZE
    }

    #[inline]
    pub fn is_draw(self) -> bool {
        self.pile() == STOCK_POS
    }
}

impl fmt::Display for PeaksMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_draw() {
            write!(f, "draw@{}", self.index())
        } else {
            write!(f, "r{}c{}", self.pile(), self.index())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peaks {
    rows: [[Option<Card>; ROW_MAX]; ROW_NUM],
    // stock[..pointer] is undrawn, stock[pointer] is the waste top and the
    // rest of the waste follows it.
    stock: Vec<Card>,
    pointer: usize,
}

impl Peaks {
    fn from_dealt(piles: Vec<Vec<Card>>) -> Result<Self, DealError> {
        if piles.len() != DESK_SIZE {
            return Err(DealError::PileCount {
                expected: DESK_SIZE,
                found: piles.len(),
            });
        }
        for (i, (pile, &want)) in piles.iter().zip(DEAL_SIZES.iter()).enumerate() {
            if pile.len() != want {
                return Err(DealError::PileSize {
                    pile: i,
                    expected: want,
                    found: pile.len(),
                });
            }
        }
        check_full_deck(piles.iter().map(Vec::as_slice))?;

        let mut rows = [[None; ROW_MAX]; ROW_NUM];
        for (row, (dealt, slots)) in rows.iter_mut().zip(piles.iter().zip(ROW_SLOTS)) {
            for (&card, &pos) in dealt.iter().zip(slots.iter()) {
                row[pos] = Some(card);
            }
        }
        let mut stock = Vec::with_capacity(CARD_NUM);
        stock.extend_from_slice(&piles[STOCK_POS]);
        Ok(Self {
            rows,
            stock,
            pointer: STOCK_SIZE - 1,
        })
    }

    /// Deal by number: the LCG fills the peak rows top down, then the stock.
    /// The last stock card starts face up on the waste.
    pub fn deal(seed: u64) -> Result<Self, DealError> {
        Self::from_dealt(DealRng::new(seed)?.deal_sized(&DEAL_SIZES))
    }

    /// Build from five lines: rows of 3, 6, 9 and 10 cards, then the 24-card
    /// stock whose last card is the initial waste.
    pub fn from_layout<S: AsRef<str>>(lines: &[S]) -> Result<Self, DealError> {
        let piles = lines
            .iter()
            .map(|l| parse_pile(l.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_dealt(piles)
    }

    #[inline]
    pub fn card_at(&self, row: usize, index: usize) -> Option<Card> {
        self.rows[row][index]
    }

    #[inline]
    pub fn waste_top(&self) -> Card {
        self.stock[self.pointer]
    }

    /// Stock cards not yet drawn.
    #[inline]
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn remaining_peak_cards(&self) -> usize {
        self.rows.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn cleared_tops(&self) -> usize {
        ROW_SLOTS[0].iter().filter(|&&i| self.rows[0][i].is_none()).count()
    }

    fn is_uncovered(&self, row: usize, index: usize) -> bool {
        row + 1 == ROW_NUM
            || (self.rows[row + 1][index].is_none() && self.rows[row + 1][index + 1].is_none())
    }

    #[inline]
    fn is_playable(&self, row: usize, index: usize) -> bool {
        self.rows[row][index].is_some() && self.is_uncovered(row, index)
    }

    #[inline]
    fn adjacent(a: Card, b: Card) -> bool {
        let d = a.rank().abs_diff(b.rank());
        d == 1 || d + 1 == RANK_NUM
    }

    fn occupancy(&self) -> u64 {
        let mut mask = 0u64;
        for (r, row) in self.rows.iter().enumerate() {
            for (i, slot) in row.iter().enumerate() {
                if slot.is_some() {
                    mask |= 1 << (r * ROW_MAX + i);
                }
            }
        }
        mask
    }

    /// Describe a move against the board it is about to be applied to.
    pub fn describe(&self, mv: PeaksMove) -> String {
        if mv.is_draw() {
            match self.stock.get(mv.index()) {
                Some(card) => format!("{card} <- stock"),
                None => "?? <- stock".to_string(),
            }
        } else {
            match self.rows[mv.pile()][mv.index()] {
                Some(card) => format!("{card} -> waste"),
                None => "?? -> waste".to_string(),
            }
        }
    }

    /// Layout-file lines. Only meaningful for a board nothing was played on.
    pub fn layout_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .rows
            .iter()
            .map(|row| format_pile(row.iter().flatten()))
            .collect();
        lines.push(format_pile(self.stock.iter()));
        lines
    }
}

impl fmt::Display for Peaks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.rows.iter().enumerate() {
            write!(f, "{:width$}", "", width = ROW_NUM - 1 - r)?;
            for slot in &row[..ROW_LEN[r]] {
                match slot {
                    Some(c) => write!(f, "{c} ")?,
                    None => write!(f, ".. ")?,
                }
            }
            writeln!(f)?;
        }
        writeln!(
            f,
            "stock: {} | waste: {}",
            format_pile(&self.stock[..self.pointer]),
            format_pile(&self.stock[self.pointer..])
        )
    }
}

impl Game for Peaks {
    type Move = PeaksMove;

    /// Order: the stock draw (if any card is left), then playable peak cards
    /// row by row.
    fn legal_moves(&self, out: &mut Vec<PeaksMove>) {
        let top = self.waste_top();
        if self.pointer > 0 {
            out.push(PeaksMove::draw(self.pointer - 1));
        }
        for row in 0..ROW_NUM {
            for index in 0..ROW_LEN[row] {
                if !self.is_playable(row, index) {
                    continue;
                }
                if let Some(card) = self.rows[row][index] {
                    if Self::adjacent(card, top) {
                        out.push(PeaksMove::play(row, index));
                    }
                }
            }
        }
    }

    fn apply(&mut self, mv: PeaksMove) {
        let index = mv.index();
        if mv.is_draw() {
            assert!(
                self.pointer == index + 1,
                "tripeaks: draw {mv} with stock pointer at {}",
                self.pointer
            );
            self.pointer -= 1;
        } else {
            let card = match self.rows[mv.pile()][index].take() {
                Some(c) => c,
                None => panic!("tripeaks: play {mv} from an empty slot"),
            };
            self.stock.insert(self.pointer, card);
        }
    }

    fn undo(&mut self, mv: PeaksMove) {
        let index = mv.index();
        if mv.is_draw() {
            assert!(
                self.pointer == index,
                "tripeaks: undo draw {mv} with stock pointer at {}",
                self.pointer
            );
            self.pointer += 1;
        } else {
            let slot = &mut self.rows[mv.pile()][index];
            assert!(slot.is_none(), "tripeaks: undo {mv} onto an occupied slot");
            *slot = Some(self.stock.remove(self.pointer));
        }
    }

    fn is_victory(&self) -> bool {
        self.rows[0].iter().all(Option::is_none)
    }

    fn dedup_key(&self) -> DedupKey {
        let fine = u128::from(self.occupancy()) | (u128::from(self.waste_top().id()) << 64);
        DedupKey::new(self.pointer as u32, fine)
    }

    /// Fewer stock cards consumed is better.
    fn split_score(&self) -> i32 {
        self.pointer as i32
    }

    /// Clearing the tops takes every peak card off the board.
    #[inline]
    fn min_moves_left(&self) -> usize {
        self.remaining_peak_cards()
    }
}

impl Scored for Peaks {
    #[inline]
    fn is_draw(mv: PeaksMove) -> bool {
        mv.is_draw()
    }

    fn terminal_bonus(&self) -> i64 {
        PEAK_TOP_BONUS * self.cleared_tops() as i64
    }
}
