use std::fmt::Debug;

use crate::hash::DedupKey;

/// A single-player card game the solver can search.
///
/// Implementors own one mutable board. Every method except `apply`/`undo`
/// and `auto_complete` is a pure read. `apply` followed by `undo` of the same
/// move must restore the exact previous value; the engine relies on this to
/// explore branches without cloning the board.
pub trait Game: Clone {
    /// Compact move encoding. Moves never carry the card itself; it is read
    /// off the board when the move is applied.
    type Move: Copy + Eq + Debug;

    /// Append every legal move to `out` in a deterministic order.
    fn legal_moves(&self, out: &mut Vec<Self::Move>);

    /// Perform a move produced by `legal_moves` on this board.
    ///
    /// # Panics
    /// If the move's preconditions do not hold. That is a move generator
    /// defect and the board can no longer be trusted.
    fn apply(&mut self, mv: Self::Move);

    /// Exact inverse of [`Game::apply`].
    ///
    /// # Panics
    /// If `mv` was not the last move applied.
    fn undo(&mut self, mv: Self::Move);

    fn is_victory(&self) -> bool;

    fn dedup_key(&self) -> DedupKey;

    /// Splitter heuristic; higher means closer to a clear.
    fn split_score(&self) -> i32;

    /// Lower bound on the moves still needed to clear the board. Must never
    /// overestimate; the default of 0 is always safe.
    fn min_moves_left(&self) -> usize {
        0
    }

    /// Apply forced or always-safe moves after a sequence, appending each to
    /// `moves`. The default performs none.
    fn auto_complete(&mut self, moves: &mut Vec<Self::Move>) {
        let _ = moves;
    }
}

/// Games that can be ranked by the score-maximising policy.
pub trait Scored: Game {
    /// Whether a move draws from the stock, which resets the run bonus.
    fn is_draw(mv: Self::Move) -> bool;

    /// Bonus for the board left at the end of a sequence.
    fn terminal_bonus(&self) -> i64;
}

/// Returns ordered legal moves for the given board.
#[inline]
pub fn legal_moves<G: Game>(state: &G) -> Vec<G::Move> {
    let mut out = Vec::new();
    state.legal_moves(&mut out);
    out
}

#[inline]
pub fn is_victory<G: Game>(state: &G) -> bool {
    state.is_victory()
}
