use std::marker::PhantomData;

use log::info;

use crate::solver::Solution;
use crate::state::{Game, Scored};

/// How a sequence offered to a policy ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// The board is cleared.
    Cleared,
    /// Not cleared and no legal move is left.
    Stuck,
}

/// Decides which terminal sequence is reported and when the search may stop.
pub trait SelectionPolicy<G: Game> {
    /// True if a sequence that needs at least `bound` moves in total can no
    /// longer beat the current best and should not be inspected or expanded.
    fn prune(&self, bound: usize) -> bool;

    /// Consider a terminal sequence; `state` is the board after it.
    fn offer(&mut self, state: &G, moves: &[G::Move], finish: Finish);

    /// Once settled, the engine stops when the live frontier drains and
    /// abandons any stored checkpoints.
    fn settled(&self) -> bool;

    fn best(&self) -> Option<&Solution<G::Move>>;

    fn into_solution(self) -> Option<Solution<G::Move>>;
}

/// Accept a clear only when strictly shorter than the best one so far.
///
/// The default policy is exhaustive: after a clear it keeps resuming
/// checkpoints, since a deferred slice may still hold a shorter one, and
/// relies on `prune` to drop everything that cannot beat it.
/// [`ShortestSequence::first_clear`] instead settles on the shortest clear
/// of the generation where the first one shows up, leaving deferred work
/// unexplored.
#[derive(Debug, Clone)]
pub struct ShortestSequence<G: Game> {
    best: Option<Solution<G::Move>>,
    stop_at_first: bool,
}

impl<G: Game> Default for ShortestSequence<G> {
    fn default() -> Self {
        Self {
            best: None,
            stop_at_first: false,
        }
    }
}

impl<G: Game> ShortestSequence<G> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn first_clear() -> Self {
        Self {
            best: None,
            stop_at_first: true,
        }
    }

    #[inline]
    pub fn stops_at_first(&self) -> bool {
        self.stop_at_first
    }
}

impl<G: Game> SelectionPolicy<G> for ShortestSequence<G> {
    #[inline]
    fn prune(&self, bound: usize) -> bool {
        self.best.as_ref().is_some_and(|b| bound >= b.moves.len())
    }

    fn offer(&mut self, _state: &G, moves: &[G::Move], finish: Finish) {
        if finish != Finish::Cleared || self.prune(moves.len()) {
            return;
        }
        info!("found {} moves solution", moves.len());
        self.best = Some(Solution {
            moves: moves.to_vec(),
            cleared: true,
            score: None,
        });
    }

    #[inline]
    fn settled(&self) -> bool {
        self.stop_at_first && self.best.is_some()
    }

    #[inline]
    fn best(&self) -> Option<&Solution<G::Move>> {
        self.best.as_ref()
    }

    fn into_solution(self) -> Option<Solution<G::Move>> {
        self.best
    }
}

/// Keep the highest-scoring sequence, preferring clears over stuck boards.
///
/// Score = run bonus + [`Scored::terminal_bonus`]. Each non-draw move earns
/// the current run value, which starts at `run_base` and grows by `run_step`
/// per consecutive non-draw move; a draw resets it. Ties go to the shorter
/// sequence, then to the first one found.
#[derive(Debug, Clone)]
pub struct HighestScore<G: Scored> {
    run_base: i64,
    run_step: i64,
    best: Option<Solution<G::Move>>,
    _game: PhantomData<fn() -> G>,
}

impl<G: Scored> Default for HighestScore<G> {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl<G: Scored> HighestScore<G> {
    #[inline]
    pub fn new(run_base: i64, run_step: i64) -> Self {
        Self {
            run_base,
            run_step,
            best: None,
            _game: PhantomData,
        }
    }

    /// Sum of run values over a sequence.
    pub fn run_bonus(&self, moves: &[G::Move]) -> i64 {
        let mut run = self.run_base;
        let mut total = 0i64;
        for &mv in moves {
            if G::is_draw(mv) {
                run = self.run_base;
            } else {
                total += run;
                run += self.run_step;
            }
        }
        total
    }

    #[inline]
    pub fn score(&self, state: &G, moves: &[G::Move]) -> i64 {
        self.run_bonus(moves) + state.terminal_bonus()
    }

    fn beats(candidate: &Solution<G::Move>, best: &Solution<G::Move>) -> bool {
        let key = |s: &Solution<G::Move>| (s.cleared, s.score.unwrap_or(i64::MIN));
        match key(candidate).cmp(&key(best)) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => candidate.moves.len() < best.moves.len(),
        }
    }
}

impl<G: Scored> SelectionPolicy<G> for HighestScore<G> {
    #[inline]
    fn prune(&self, _bound: usize) -> bool {
        false
    }

    fn offer(&mut self, state: &G, moves: &[G::Move], finish: Finish) {
        let candidate = Solution {
            moves: moves.to_vec(),
            cleared: finish == Finish::Cleared,
            score: Some(self.score(state, moves)),
        };
        let better = match &self.best {
            None => true,
            Some(best) => Self::beats(&candidate, best),
        };
        if better {
            if candidate.cleared {
                info!(
                    "found clearing sequence: {} moves, score {}",
                    candidate.moves.len(),
                    candidate.score.unwrap_or_default()
                );
            }
            self.best = Some(candidate);
        }
    }

    #[inline]
    fn settled(&self) -> bool {
        self.best.as_ref().is_some_and(|b| b.cleared)
    }

    #[inline]
    fn best(&self) -> Option<&Solution<G::Move>> {
        self.best.as_ref()
    }

    fn into_solution(self) -> Option<Solution<G::Move>> {
        self.best
    }
}
