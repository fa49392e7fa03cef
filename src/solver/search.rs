use log::{debug, info};

use crate::engine::apply::Applied;
use crate::engine::score::{Finish, SelectionPolicy, ShortestSequence};
use crate::error::SolveError;
use crate::solver::checkpoint::{Checkpoint, CheckpointStore, MemoryStack};
use crate::solver::dedup::DedupTable;
use crate::solver::split::{split_frontier, SplitResult};
use crate::solver::{Exit, Outcome, SearchLimits, SearchStats};
use crate::state::Game;

/// One generation of move sequences, each measured from the initial board.
pub type Frontier<M> = Vec<Vec<M>>;

/// Progress hooks. All methods default to doing nothing.
pub trait SearchObserver {
    /// Called after each generation with the size of the next frontier.
    fn on_generation(&mut self, frontier: usize, stats: &SearchStats) {
        let _ = (frontier, stats);
    }

    fn on_split(&mut self, kept: usize, deferred: usize, stats: &SearchStats) {
        let _ = (kept, deferred, stats);
    }

    fn on_resume(&mut self, frontier: usize, stats: &SearchStats) {
        let _ = (frontier, stats);
    }
}

/// Bounded-memory breadth-first search over one shared board.
///
/// Every generation replays each sequence on the board, inspects the result
/// and undoes it again, so only one board exists no matter how wide the
/// frontier grows. When the frontier exceeds `max_frontier` the splitter
/// keeps the most promising part and pushes the rest, together with a copy
/// of the visited table, onto the checkpoint store. Once the live frontier
/// drains without the policy being settled, the newest checkpoint is
/// resumed. Sequences that cannot beat the best clear, counting the game's
/// lower bound on the moves still needed, are dropped without expansion.
pub struct Search<G: Game, P = ShortestSequence<G>, S = MemoryStack<<G as Game>::Move>> {
    state: G,
    limits: SearchLimits,
    policy: P,
    store: S,
    observer: Option<Box<dyn SearchObserver>>,
    stats: SearchStats,
    moves: Vec<G::Move>,
}

impl<G: Game> Search<G> {
    /// Shortest-sequence search with an in-memory checkpoint stack.
    pub fn new(initial: G, limits: SearchLimits) -> Result<Self, SolveError> {
        limits.validate()?;
        Ok(Self {
            state: initial,
            limits,
            policy: ShortestSequence::new(),
            store: MemoryStack::new(),
            observer: None,
            stats: SearchStats::default(),
            moves: Vec::new(),
        })
    }
}

impl<G, P, S> Search<G, P, S>
where
    G: Game,
    P: SelectionPolicy<G>,
    S: CheckpointStore<G::Move>,
{
    pub fn with_policy<Q: SelectionPolicy<G>>(self, policy: Q) -> Search<G, Q, S> {
        Search {
            state: self.state,
            limits: self.limits,
            policy,
            store: self.store,
            observer: self.observer,
            stats: self.stats,
            moves: self.moves,
        }
    }

    pub fn with_store<T: CheckpointStore<G::Move>>(self, store: T) -> Search<G, P, T> {
        Search {
            state: self.state,
            limits: self.limits,
            policy: self.policy,
            store,
            observer: self.observer,
            stats: self.stats,
            moves: self.moves,
        }
    }

    pub fn with_observer<O: SearchObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    #[inline]
    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    /// Run to completion.
    ///
    /// Store errors abort the search. Running out of sequences, or of
    /// generations, is reported through [`Outcome::exit`].
    pub fn run(mut self) -> Result<Outcome<G::Move>, SolveError> {
        let mut frontier: Frontier<G::Move> = vec![Vec::new()];
        let mut seen = DedupTable::new();

        let exit = 'search: loop {
            while !frontier.is_empty() {
                if self
                    .limits
                    .max_generations
                    .is_some_and(|cap| self.stats.generations >= cap)
                {
                    info!(
                        "generation budget of {} reached",
                        self.stats.generations
                    );
                    break 'search Exit::Truncated;
                }
                debug!(
                    "generation {}: {} sequences",
                    self.stats.generations,
                    frontier.len()
                );
                if frontier.len() > self.limits.max_frontier {
                    frontier = self.split(frontier, &seen)?;
                }
                self.stats.peak_frontier = self.stats.peak_frontier.max(frontier.len());

                let (next, next_seen) = self.expand(frontier, seen);
                frontier = next;
                seen = next_seen;
                self.stats.generations += 1;
                if let Some(obs) = self.observer.as_mut() {
                    obs.on_generation(frontier.len(), &self.stats);
                }
            }

            if self.policy.settled() {
                break Exit::Settled;
            }
            match self.store.pop().map_err(Into::<SolveError>::into)? {
                Some(checkpoint) => {
                    self.stats.resumes += 1;
                    info!(
                        "step back to split #{} ({} sequences)",
                        self.store.len() + 1,
                        checkpoint.frontier.len()
                    );
                    frontier = checkpoint.frontier;
                    seen = checkpoint.seen;
                    if let Some(obs) = self.observer.as_mut() {
                        obs.on_resume(frontier.len(), &self.stats);
                    }
                }
                None => break Exit::Exhausted,
            }
        };

        self.stats.checkpoints_left = self.store.len();
        debug!("search finished ({exit:?}): {:?}", self.stats);
        Ok(Outcome {
            solution: self.policy.into_solution(),
            stats: self.stats,
            exit,
        })
    }

    /// Keep the best part of an oversized frontier; defer the rest.
    fn split(
        &mut self,
        frontier: Frontier<G::Move>,
        seen: &DedupTable,
    ) -> Result<Frontier<G::Move>, SolveError> {
        let total = frontier.len();
        let SplitResult { kept, deferred } = split_frontier(
            &mut self.state,
            frontier,
            self.limits.min_frontier,
            self.limits.max_frontier,
        );
        if deferred.is_empty() {
            debug!("split of {total} sequences kept everything");
            return Ok(kept);
        }

        let deferred_len = deferred.len();
        self.store
            .push(Checkpoint {
                frontier: deferred,
                seen: seen.clone(),
            })
            .map_err(Into::<SolveError>::into)?;
        self.stats.splits += 1;
        info!(
            "split #{} -> {}+{deferred_len} of {total}",
            self.store.len(),
            kept.len()
        );
        if let Some(obs) = self.observer.as_mut() {
            obs.on_split(kept.len(), deferred_len, &self.stats);
        }
        Ok(kept)
    }

    /// Inspect every sequence of one generation and collect the next.
    ///
    /// `previous` is the visited table of the generation that produced
    /// `frontier`; its buckets move into the returned table as they are
    /// touched and the rest are dropped with it.
    fn expand(
        &mut self,
        frontier: Frontier<G::Move>,
        mut previous: DedupTable,
    ) -> (Frontier<G::Move>, DedupTable) {
        let mut next = Vec::new();
        let mut seen = DedupTable::new();

        for mut seq in frontier {
            let board = Applied::enter(&mut self.state, &mut seq);
            let len = board.moves().len();

            if self.policy.prune(len + board.min_moves_left()) {
                self.stats.pruned += 1;
                continue;
            }
            if board.is_victory() {
                self.stats.terminals += 1;
                self.policy.offer(&board, board.moves(), Finish::Cleared);
                continue;
            }
            if !seen.insert_inherit(board.dedup_key(), &mut previous) {
                self.stats.duplicates += 1;
                continue;
            }

            self.moves.clear();
            board.legal_moves(&mut self.moves);
            if self.moves.is_empty() {
                self.stats.terminals += 1;
                self.policy.offer(&board, board.moves(), Finish::Stuck);
                continue;
            }

            self.stats.expanded += 1;
            for &mv in &self.moves {
                let mut child = Vec::with_capacity(len + 1);
                child.extend_from_slice(board.moves());
                child.push(mv);
                next.push(child);
            }
        }

        (next, seen)
    }
}
