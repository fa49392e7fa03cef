use std::ops::Deref;

use crate::state::Game;

/// Apply `moves` front to back.
#[inline]
pub fn apply_all<G: Game>(state: &mut G, moves: &[G::Move]) {
    for &mv in moves {
        state.apply(mv);
    }
}

/// Undo `moves` back to front, restoring the board as it was before
/// `apply_all(state, moves)`.
#[inline]
pub fn undo_all<G: Game>(state: &mut G, moves: &[G::Move]) {
    let mut i = moves.len();
    while i > 0 {
        i -= 1;
        state.undo(moves[i]);
    }
}

/// Replay a sequence against a copy of `initial` and return the final board.
pub fn replay<G: Game>(initial: &G, moves: &[G::Move]) -> G {
    let mut s = initial.clone();
    apply_all(&mut s, moves);
    s
}

/// A move sequence temporarily applied to the shared board.
///
/// Entering applies the sequence plus the game's automatic moves (which are
/// appended to the sequence); dropping the handle undoes all of it. While the
/// handle lives it holds the only borrow of the board, so nothing else can
/// observe or mutate it mid-branch.
pub struct Applied<'a, G: Game> {
    state: &'a mut G,
    moves: &'a mut Vec<G::Move>,
}

impl<'a, G: Game> Applied<'a, G> {
    pub fn enter(state: &'a mut G, moves: &'a mut Vec<G::Move>) -> Self {
        apply_all(state, moves.as_slice());
        state.auto_complete(moves);
        Self { state, moves }
    }

    /// The full sequence, including automatic moves added on entry.
    #[inline]
    pub fn moves(&self) -> &[G::Move] {
        self.moves.as_slice()
    }
}

impl<G: Game> Deref for Applied<'_, G> {
    type Target = G;

    #[inline]
    fn deref(&self) -> &G {
        &*self.state
    }
}

impl<G: Game> Drop for Applied<'_, G> {
    fn drop(&mut self) {
        undo_all(self.state, self.moves.as_slice());
    }
}
