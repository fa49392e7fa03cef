use std::collections::BTreeMap;

use crate::engine::apply::Applied;
use crate::state::Game;

/// A frontier divided into the part explored now and the part deferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResult<M> {
    pub kept: Vec<Vec<M>>,
    pub deferred: Vec<Vec<M>>,
}

/// Partition `frontier` by the game's split heuristic.
///
/// Sequences are bucketed by [`Game::split_score`] of the board they lead to.
/// Whole buckets are kept best first until at least `min_keep` sequences are
/// kept, except that the kept set never grows beyond `max_keep`: the bucket
/// that would cross it is cut, its earliest sequences kept. Everything else
/// is deferred. Both halves keep the original frontier order, so every input
/// sequence lands in exactly one of them.
///
/// Sequences may grow: entering one appends the game's automatic moves.
pub fn split_frontier<G: Game>(
    state: &mut G,
    mut frontier: Vec<Vec<G::Move>>,
    min_keep: usize,
    max_keep: usize,
) -> SplitResult<G::Move> {
    debug_assert!(min_keep <= max_keep);
    let mut buckets: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (i, seq) in frontier.iter_mut().enumerate() {
        let board = Applied::enter(state, seq);
        buckets.entry(board.split_score()).or_default().push(i);
    }

    let mut keep = vec![false; frontier.len()];
    let mut kept_count = 0usize;
    for indices in buckets.values().rev() {
        if kept_count >= min_keep {
            break;
        }
        let room = max_keep.saturating_sub(kept_count);
        for &i in indices.iter().take(room) {
            keep[i] = true;
        }
        kept_count += indices.len().min(room);
    }

    let mut kept = Vec::with_capacity(kept_count);
    let mut deferred = Vec::with_capacity(frontier.len() - kept_count);
    for (seq, take) in frontier.into_iter().zip(keep) {
        if take {
            kept.push(seq);
        } else {
            deferred.push(seq);
        }
    }
    SplitResult { kept, deferred }
}
