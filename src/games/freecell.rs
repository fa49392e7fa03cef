//! FreeCell: eight cascades, four single-card cells, four foundations.
//!
//! Cascades are built down in alternating colours, foundations up by suit
//! from the ace. The game is won once every card sits on a foundation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::{check_full_deck, format_pile, parse_pile};
use crate::error::DealError;
use crate::hash::{DedupKey, Fingerprint};
use crate::rng::DealRng;
use crate::state::Game;
use crate::types::{Card, Suit, CARD_NUM, RANK_NUM};

pub const PILE_NUM: usize = 8;
pub const CELL_NUM: usize = 4;
pub const BASE_NUM: usize = 4;
pub const DESK_SIZE: usize = PILE_NUM + CELL_NUM + BASE_NUM;

pub const PILE_START: usize = 0;
pub const PILE_END: usize = PILE_START + PILE_NUM;
pub const CELL_START: usize = PILE_END;
pub const CELL_END: usize = CELL_START + CELL_NUM;
pub const BASE_START: usize = CELL_END;
pub const BASE_END: usize = BASE_START + BASE_NUM;

/// Role of a pile index on the desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Cascade(u8),
    Cell(u8),
    Foundation(Suit),
}

impl Slot {
    #[inline]
    pub fn of(idx: usize) -> Slot {
        debug_assert!(idx < DESK_SIZE);
        if idx < PILE_END {
            Slot::Cascade((idx - PILE_START) as u8)
        } else if idx < CELL_END {
            Slot::Cell((idx - CELL_START) as u8)
        } else {
            Slot::Foundation(Suit::from_index((idx - BASE_START) as u8))
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Slot::Cascade(i) => PILE_START + i as usize,
            Slot::Cell(i) => CELL_START + i as usize,
            Slot::Foundation(s) => BASE_START + s.index() as usize,
        }
    }
}

/// A single-card move encoded as `src * 16 + dst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FreecellMove(u8);

impl FreecellMove {
    #[inline]
    pub fn new(src: Slot, dst: Slot) -> Self {
        let (s, d) = (src.index(), dst.index());
        debug_assert!(s != d, "move onto the same pile");
        FreecellMove((s * DESK_SIZE + d) as u8)
    }

    #[inline]
    fn between(src: usize, dst: usize) -> Self {
        FreecellMove((src * DESK_SIZE + dst) as u8)
    }

    #[inline]
    pub fn from_code(code: u8) -> Self {
        FreecellMove(code)
    }

    #[inline]
    pub fn code(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn src(self) -> usize {
        self.0 as usize / DESK_SIZE
    }

    #[inline]
    pub fn dst(self) -> usize {
        self.0 as usize % DESK_SIZE
    }
}

impl fmt::Display for FreecellMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.src(), self.dst())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desk {
    piles: [Vec<Card>; DESK_SIZE],
}

impl Default for Desk {
    fn default() -> Self {
        Self {
            piles: std::array::from_fn(|_| Vec::new()),
        }
    }
}

impl Desk {
    /// Deal by number: the LCG picks each card round-robin over the cascades.
    pub fn deal(seed: u64) -> Result<Self, DealError> {
        let cascades = DealRng::new(seed)?.deal_round_robin(PILE_NUM);
        let mut desk = Desk::default();
        for (dst, src) in desk.piles[PILE_START..PILE_END].iter_mut().zip(cascades) {
            *dst = src;
        }
        Ok(desk)
    }

    /// Build from eight cascade lines such as `"JDKD2S4C3S6D6S"`.
    pub fn from_layout<S: AsRef<str>>(lines: &[S]) -> Result<Self, DealError> {
        if lines.len() != PILE_NUM {
            return Err(DealError::PileCount {
                expected: PILE_NUM,
                found: lines.len(),
            });
        }
        let mut desk = Desk::default();
        for (i, line) in lines.iter().enumerate() {
            desk.piles[PILE_START + i] = parse_pile(line.as_ref())?;
        }
        check_full_deck(desk.piles.iter().map(Vec::as_slice))?;
        Ok(desk)
    }

    /// Build from all sixteen piles, validating every desk invariant.
    pub fn from_piles(piles: [Vec<Card>; DESK_SIZE]) -> Result<Self, DealError> {
        check_full_deck(piles.iter().map(Vec::as_slice))?;
        for (i, pile) in piles.iter().enumerate().take(CELL_END).skip(CELL_START) {
            if pile.len() > 1 {
                return Err(DealError::CellOverfull { pile: i, found: pile.len() });
            }
        }
        for suit in Suit::all() {
            let idx = Slot::Foundation(suit).index();
            for (rank, &card) in piles[idx].iter().enumerate() {
                if card != Card::new(suit, rank as u8) {
                    return Err(DealError::Foundation { pile: idx, card });
                }
            }
        }
        Ok(Self { piles })
    }

    /// The cleared desk: all four foundations complete.
    pub fn solved() -> Self {
        let mut desk = Desk::default();
        for suit in Suit::all() {
            desk.piles[Slot::Foundation(suit).index()] =
                (0..RANK_NUM).map(|r| Card::new(suit, r)).collect();
        }
        desk
    }

    #[inline]
    pub fn pile(&self, idx: usize) -> &[Card] {
        &self.piles[idx]
    }

    #[inline]
    pub fn top(&self, idx: usize) -> Option<Card> {
        self.piles[idx].last().copied()
    }

    #[inline]
    fn base_height(&self, suit: Suit) -> u8 {
        self.piles[Slot::Foundation(suit).index()].len() as u8
    }

    fn first_empty(&self, from: usize, to: usize) -> Option<usize> {
        (from..to).find(|&i| self.piles[i].is_empty())
    }

    /// Empty cascades plus empty cells.
    pub fn count_empty(&self) -> usize {
        self.piles[PILE_START..CELL_END].iter().filter(|p| p.is_empty()).count()
    }

    pub fn count_base_cards(&self) -> usize {
        self.piles[BASE_START..BASE_END].iter().map(Vec::len).sum()
    }

    /// Disorder measure: for every pair of cards in a cascade where a card
    /// sits beneath a higher-ranked one, add the rank gap.
    pub fn disorder(&self) -> i32 {
        let mut n = 0i32;
        for pile in &self.piles[PILE_START..PILE_END] {
            for (a, lower) in pile.iter().enumerate() {
                for upper in &pile[a + 1..] {
                    if lower.rank() < upper.rank() {
                        n += i32::from(upper.rank() - lower.rank());
                    }
                }
            }
        }
        n
    }

    /// Foundation heights as a base-13 number in suit order.
    pub fn base_key(&self) -> u32 {
        Suit::all()
            .iter()
            .fold(0u32, |acc, &s| acc * u32::from(RANK_NUM) + u32::from(self.base_height(s)))
    }

    /// Fingerprint of the cascades with their order normalised.
    pub fn cascade_key(&self) -> u128 {
        let mut cascades: Vec<&[Card]> =
            self.piles[PILE_START..PILE_END].iter().map(Vec::as_slice).collect();
        cascades.sort_unstable();
        let mut fp = Fingerprint::new();
        let mut buf = Vec::with_capacity(64);
        for pile in cascades {
            buf.clear();
            buf.extend(pile.iter().map(|c| c.id()));
            fp.write_bytes(&buf);
        }
        fp.finish()
    }

    /// Safe to send `card` home: it fits its foundation and neither
    /// opposite-colour foundation is more than one rank behind.
    fn is_safe_home(&self, card: Card) -> bool {
        let rank = card.rank();
        if rank != self.base_height(card.suit()) {
            return false;
        }
        let [x, y] = card.suit().opposite_colour();
        rank < self.base_height(x) + 2 && rank < self.base_height(y) + 2
    }

    fn move_card(&mut self, src: usize, dst: usize) {
        let card = match self.piles[src].pop() {
            Some(c) => c,
            None => panic!("freecell: move {src}->{dst} from an empty pile"),
        };
        self.piles[dst].push(card);
    }

    /// Describe a move against the board it is about to be applied to,
    /// e.g. `"7H -> BASE"`, `"QS -> cell"`, `"3D -> 4C"`.
    pub fn describe(&self, mv: FreecellMove) -> String {
        let card = self
            .top(mv.src())
            .map_or_else(|| "??".to_string(), |c| c.to_string());
        let dest = match Slot::of(mv.dst()) {
            Slot::Foundation(_) => "BASE".to_string(),
            Slot::Cell(_) => "cell".to_string(),
            Slot::Cascade(_) => self
                .top(mv.dst())
                .map_or_else(|| "pile".to_string(), |c| c.to_string()),
        };
        format!("{card} -> {dest}")
    }

    /// Cascade lines in the layout-file format.
    pub fn layout_lines(&self) -> Vec<String> {
        self.piles[PILE_START..PILE_END].iter().map(format_pile).collect()
    }
}

impl fmt::Display for Desk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pile) in self.piles.iter().enumerate() {
            let label = match Slot::of(i) {
                Slot::Cascade(n) => format!("pile{n}"),
                Slot::Cell(n) => format!("cell{n}"),
                Slot::Foundation(s) => format!("base{}", s.index()),
            };
            writeln!(f, "{label:>6}: {}", format_pile(pile))?;
        }
        Ok(())
    }
}

impl Game for Desk {
    type Move = FreecellMove;

    /// Order: for each cascade then cell with a top card, the foundation
    /// move, tableau moves by destination, then first empty cell and first
    /// empty cascade (only when the source has more than one card).
    fn legal_moves(&self, out: &mut Vec<FreecellMove>) {
        let empty_pile = self.first_empty(PILE_START, PILE_END);
        let empty_cell = self.first_empty(CELL_START, CELL_END);

        for i in PILE_START..CELL_END {
            let len = self.piles[i].len();
            let Some(card) = self.top(i) else { continue };

            if self.base_height(card.suit()) == card.rank() {
                out.push(FreecellMove::between(i, Slot::Foundation(card.suit()).index()));
            }

            for j in PILE_START..PILE_END {
                let Some(under) = self.top(j) else { continue };
                if under.rank() == card.rank() + 1 && under.is_red() != card.is_red() {
                    out.push(FreecellMove::between(i, j));
                }
            }

            if len > 1 {
                if let Some(c) = empty_cell {
                    out.push(FreecellMove::between(i, c));
                }
                if let Some(p) = empty_pile {
                    out.push(FreecellMove::between(i, p));
                }
            }
        }
    }

    #[inline]
    fn apply(&mut self, mv: FreecellMove) {
        let (src, dst) = (mv.src(), mv.dst());
        assert!(
            !matches!(Slot::of(dst), Slot::Cell(_)) || self.piles[dst].is_empty(),
            "freecell: move {mv} into occupied cell"
        );
        self.move_card(src, dst);
    }

    #[inline]
    fn undo(&mut self, mv: FreecellMove) {
        self.move_card(mv.dst(), mv.src());
    }

    fn is_victory(&self) -> bool {
        self.piles[PILE_START..CELL_END].iter().all(Vec::is_empty)
    }

    fn dedup_key(&self) -> DedupKey {
        DedupKey::new(self.base_key(), self.cascade_key())
    }

    fn split_score(&self) -> i32 {
        self.count_empty() as i32 - self.disorder()
    }

    /// Every card off the foundations still needs its move home.
    #[inline]
    fn min_moves_left(&self) -> usize {
        CARD_NUM - self.count_base_cards()
    }

    fn auto_complete(&mut self, moves: &mut Vec<FreecellMove>) {
        let mut progressed = true;
        while progressed {
            progressed = false;
            for i in PILE_START..CELL_END {
                let Some(card) = self.top(i) else { continue };
                if self.is_safe_home(card) {
                    let mv = FreecellMove::between(i, Slot::Foundation(card.suit()).index());
                    self.move_card(i, mv.dst());
                    moves.push(mv);
                    progressed = true;
                }
            }
        }
    }
}
