use serde::{Deserialize, Serialize};

use crate::engine::score::{HighestScore, ShortestSequence};
use crate::error::SolveError;
use crate::state::{Game, Scored};

pub mod checkpoint;
pub mod dedup;
pub mod search;
pub mod spill;
pub mod split;

pub use checkpoint::{Checkpoint, CheckpointStore, MemoryStack};
pub use dedup::DedupTable;
pub use search::{Frontier, Search, SearchObserver};
pub use spill::{SpillCompression, SpillStack};
pub use split::{split_frontier, SplitResult};

/// Frontier thresholds and the optional generation budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    /// Split once the live frontier grows beyond this many sequences. A
    /// split never keeps more than this.
    pub max_frontier: usize,
    /// A split keeps at least this many sequences (whole heuristic buckets,
    /// the last one cut at `max_frontier`).
    pub min_frontier: usize,
    /// Stop after this many generations, reporting the best answer so far.
    pub max_generations: Option<u64>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::freecell()
    }
}

impl SearchLimits {
    #[inline]
    pub const fn new(max_frontier: usize, min_frontier: usize) -> Self {
        Self {
            max_frontier,
            min_frontier,
            max_generations: None,
        }
    }

    #[inline]
    pub const fn freecell() -> Self {
        Self::new(8000, 2000)
    }

    #[inline]
    pub const fn tripeaks() -> Self {
        Self::new(10_000, 1000)
    }

    #[inline]
    pub const fn with_max_generations(mut self, generations: u64) -> Self {
        self.max_generations = Some(generations);
        self
    }

    pub fn validate(&self) -> Result<(), SolveError> {
        if self.min_frontier == 0 {
            return Err(SolveError::InvalidLimits {
                reason: "min_frontier must be at least 1".into(),
            });
        }
        if self.min_frontier > self.max_frontier {
            return Err(SolveError::InvalidLimits {
                reason: format!(
                    "min_frontier {} exceeds max_frontier {}",
                    self.min_frontier, self.max_frontier
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub generations: u64,
    /// Sequences whose children were generated.
    pub expanded: u64,
    pub duplicates: u64,
    /// Sequences dropped because they could not beat the best answer.
    pub pruned: u64,
    /// Cleared or stuck boards offered to the policy.
    pub terminals: u64,
    pub splits: u64,
    pub resumes: u64,
    pub peak_frontier: usize,
    /// Checkpoints still stored when the search stopped.
    pub checkpoints_left: usize,
}

/// The reported answer: a replayable move list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution<M> {
    pub moves: Vec<M>,
    /// Whether replaying `moves` clears the board.
    pub cleared: bool,
    /// Score under the score-maximising policy; `None` otherwise.
    pub score: Option<i64>,
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exit {
    /// The policy settled with the live frontier drained; stored
    /// checkpoints were abandoned.
    Settled,
    /// Frontier and checkpoint stack are both empty. The answer, if any,
    /// could not be improved by further search.
    Exhausted,
    /// The generation budget ran out.
    Truncated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome<M> {
    pub solution: Option<Solution<M>>,
    pub stats: SearchStats,
    pub exit: Exit,
}

impl<M> Outcome<M> {
    /// The move list if the answer clears the board.
    pub fn clearing_moves(&self) -> Option<&[M]> {
        self.solution
            .as_ref()
            .filter(|s| s.cleared)
            .map(|s| s.moves.as_slice())
    }
}

/// Exhaustive shortest-sequence search with in-memory checkpoints.
pub fn solve<G: Game>(initial: &G, limits: SearchLimits) -> Result<Outcome<G::Move>, SolveError> {
    Search::new(initial.clone(), limits)?.run()
}

/// Shortest clear of the first generation that finds one; deferred
/// checkpoints are abandoned once it is found.
pub fn solve_first_clear<G: Game>(
    initial: &G,
    limits: SearchLimits,
) -> Result<Outcome<G::Move>, SolveError> {
    Search::new(initial.clone(), limits)?
        .with_policy(ShortestSequence::first_clear())
        .run()
}

/// Highest-score search with in-memory checkpoints and the default run bonus.
pub fn solve_for_score<G: Scored>(
    initial: &G,
    limits: SearchLimits,
) -> Result<Outcome<G::Move>, SolveError> {
    Search::new(initial.clone(), limits)?
        .with_policy(HighestScore::default())
        .run()
}
