use patience::solver::{split_frontier, SplitResult};
use patience::{legal_moves, Applied, Desk, Game, Peaks, PeaksMove};

/// All two-move sequences from the seed 1 TriPeaks deal.
fn two_ply_frontier(peaks: &mut Peaks) -> Vec<Vec<PeaksMove>> {
    let mut out = Vec::new();
    for first in legal_moves(peaks) {
        peaks.apply(first);
        for second in legal_moves(peaks) {
            out.push(vec![first, second]);
        }
        peaks.undo(first);
    }
    out
}

fn score_of<G: Game>(state: &mut G, seq: &[G::Move]) -> i32 {
    let mut seq = seq.to_vec();
    let board = Applied::enter(state, &mut seq);
    board.split_score()
}

#[test]
fn split_partitions_by_heuristic() {
    let mut peaks = Peaks::deal(1).unwrap();
    let frontier = two_ply_frontier(&mut peaks);
    assert!(frontier.len() >= 4);

    for min_keep in [1, 3, frontier.len() - 1] {
        let SplitResult { kept, deferred } =
            split_frontier(&mut peaks, frontier.clone(), min_keep, frontier.len());
        assert_eq!(kept.len() + deferred.len(), frontier.len());
        assert!(kept.len() >= min_keep);

        // Both halves preserve the input order.
        let mut rest = frontier.iter();
        for seq in &kept {
            assert!(rest.any(|s| s == seq), "kept order broken at {seq:?}");
        }
        let mut rest = frontier.iter();
        for seq in &deferred {
            assert!(rest.any(|s| s == seq), "deferred order broken at {seq:?}");
        }

        let worst_kept = kept.iter().map(|s| score_of(&mut peaks, s)).min().unwrap();
        let best_deferred = deferred.iter().map(|s| score_of(&mut peaks, s)).max();
        if let Some(best_deferred) = best_deferred {
            assert!(worst_kept > best_deferred);
        }
    }
    assert_eq!(peaks, Peaks::deal(1).unwrap(), "split must leave the board untouched");
}

#[test]
fn min_keep_at_least_the_frontier_keeps_everything() {
    let mut peaks = Peaks::deal(1).unwrap();
    let frontier = two_ply_frontier(&mut peaks);
    let split = split_frontier(&mut peaks, frontier.clone(), frontier.len(), frontier.len());
    assert_eq!(split.kept, frontier);
    assert!(split.deferred.is_empty());
}

#[test]
fn whole_buckets_are_kept_together() {
    // Ties share a bucket: all top-scoring sequences stay even with min_keep 1.
    let mut desk = Desk::deal(1).unwrap();
    let frontier: Vec<_> = legal_moves(&desk).into_iter().map(|m| vec![m]).collect();
    let scores: Vec<i32> = frontier.iter().map(|s| score_of(&mut desk, s)).collect();
    let top = *scores.iter().max().unwrap();
    let tied = scores.iter().filter(|&&s| s == top).count();

    let split = split_frontier(&mut desk, frontier.clone(), 1, frontier.len());
    assert_eq!(split.kept.len(), tied);
    assert_eq!(split.deferred.len(), frontier.len() - tied);
}

#[test]
fn max_keep_cuts_the_last_bucket() {
    let mut desk = Desk::deal(1).unwrap();
    let frontier: Vec<_> = legal_moves(&desk).into_iter().map(|m| vec![m]).collect();
    let tied = split_frontier(&mut desk, frontier.clone(), 1, frontier.len()).kept;
    assert!(!tied.is_empty());

    for cap in 1..=tied.len() {
        let split = split_frontier(&mut desk, frontier.clone(), 1, cap);
        assert_eq!(split.kept, tied[..cap], "earliest ties are kept first");
        assert_eq!(split.kept.len() + split.deferred.len(), frontier.len());
        for seq in &tied[cap..] {
            assert!(split.deferred.contains(seq));
        }
    }
}

#[test]
fn kept_set_stays_within_max_keep() {
    let mut peaks = Peaks::deal(1).unwrap();
    let frontier = two_ply_frontier(&mut peaks);
    for (min_keep, max_keep) in [(1, 1), (1, 2), (2, 3), (3, frontier.len() - 1)] {
        let split = split_frontier(&mut peaks, frontier.clone(), min_keep, max_keep);
        assert!(split.kept.len() >= min_keep);
        assert!(split.kept.len() <= max_keep, "{} > {max_keep}", split.kept.len());
        assert_eq!(split.kept.len() + split.deferred.len(), frontier.len());
    }
}
