use crate::error::DealError;
use crate::types::{Card, CARD_NUM};

const LCG_M: u64 = 1 << 31;
const LCG_A: u64 = 1_103_515_245;
const LCG_C: u64 = 12_345;

/// Deterministic deal generator.
///
/// Implementation detail:
/// - Linear congruential step `n = (a * n + c) mod 2^31` with the classic
///   `a = 1103515245`, `c = 12345` constants.
/// - Each draw removes `deck[n % deck.len()]` from an ordered deck, so the
///   same seed always yields the same card sequence.
#[derive(Debug, Clone)]
pub struct DealRng {
    state: u64,
    deck: Vec<Card>,
}

impl DealRng {
    pub fn new(seed: u64) -> Result<Self, DealError> {
        if seed >= LCG_M {
            return Err(DealError::SeedOutOfRange(seed));
        }
        Ok(Self {
            state: seed,
            deck: Card::deck().collect(),
        })
    }

    #[inline]
    fn step(&mut self) -> u64 {
        self.state = (LCG_A * self.state + LCG_C) % LCG_M;
        self.state
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.deck.len()
    }

    /// Take the next card out of the deck; `None` once all 52 are dealt.
    pub fn draw(&mut self) -> Option<Card> {
        if self.deck.is_empty() {
            return None;
        }
        let n = self.step();
        let idx = (n % self.deck.len() as u64) as usize;
        Some(self.deck.remove(idx))
    }

    /// Deal round-robin into `piles` piles until the deck runs out.
    pub fn deal_round_robin(mut self, piles: usize) -> Vec<Vec<Card>> {
        let mut out = vec![Vec::with_capacity(CARD_NUM / piles + 1); piles];
        'deal: loop {
            for pile in out.iter_mut() {
                match self.draw() {
                    Some(card) => pile.push(card),
                    None => break 'deal,
                }
            }
        }
        out
    }

    /// Deal piles of the given sizes one after the other.
    pub fn deal_sized(mut self, sizes: &[usize]) -> Vec<Vec<Card>> {
        sizes
            .iter()
            .map(|&n| (0..n).map_while(|_| self.draw()).collect())
            .collect()
    }
}
