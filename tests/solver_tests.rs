use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use patience::engine::score::HighestScore;
use patience::solver::{SpillCompression, SpillStack};
use patience::{
    replay, solve, solve_first_clear, solve_for_score, DedupKey, Desk, Exit, Game, Peaks,
    PeaksMove, Scored, Search, SearchLimits, SearchObserver, SearchStats, ShortestSequence,
    Solution, SolveError,
};

/// Toy game: climb a ladder one or two rungs at a time.
#[derive(Debug, Clone, PartialEq)]
struct Ladder {
    rung: u8,
    top: u8,
    goal: Option<u8>,
}

impl Ladder {
    fn new(top: u8, goal: Option<u8>) -> Self {
        Self { rung: 0, top, goal }
    }
}

impl Game for Ladder {
    type Move = u8;

    fn legal_moves(&self, out: &mut Vec<u8>) {
        for step in [1, 2] {
            if self.rung + step <= self.top {
                out.push(step);
            }
        }
    }

    fn apply(&mut self, mv: u8) {
        self.rung += mv;
    }

    fn undo(&mut self, mv: u8) {
        self.rung -= mv;
    }

    fn is_victory(&self) -> bool {
        self.goal == Some(self.rung)
    }

    fn dedup_key(&self) -> DedupKey {
        DedupKey::new(0, u128::from(self.rung))
    }

    fn split_score(&self) -> i32 {
        i32::from(self.rung)
    }
}

/// Toy game with two corridors: `LONG` scores high with the splitter but
/// clears after six moves, `SHORT` scores low and clears after three.
#[derive(Debug, Clone, PartialEq, Default)]
struct Fork {
    path: Vec<u8>,
}

const LONG: u8 = 0;
const SHORT: u8 = 1;
const STEP: u8 = 2;

impl Game for Fork {
    type Move = u8;

    fn legal_moves(&self, out: &mut Vec<u8>) {
        if self.path.is_empty() {
            out.extend([LONG, SHORT]);
        } else if !self.is_victory() {
            out.push(STEP);
        }
    }

    fn apply(&mut self, mv: u8) {
        self.path.push(mv);
    }

    fn undo(&mut self, mv: u8) {
        assert_eq!(self.path.pop(), Some(mv));
    }

    fn is_victory(&self) -> bool {
        match self.path.first() {
            Some(&LONG) => self.path.len() == 6,
            Some(&SHORT) => self.path.len() == 3,
            _ => false,
        }
    }

    fn dedup_key(&self) -> DedupKey {
        let corridor = self.path.first().map_or(0, |&c| u32::from(c) + 1);
        DedupKey::new(corridor, self.path.len() as u128)
    }

    fn split_score(&self) -> i32 {
        match self.path.first() {
            Some(&LONG) => 10,
            _ => 0,
        }
    }
}

impl Scored for Ladder {
    fn is_draw(_mv: u8) -> bool {
        false
    }

    fn terminal_bonus(&self) -> i64 {
        i64::from(self.rung)
    }
}

#[derive(Default)]
struct Counts {
    generations: Cell<u64>,
    splits: Cell<u64>,
    resumes: Cell<u64>,
}

struct Counting(Rc<Counts>);

impl SearchObserver for Counting {
    fn on_generation(&mut self, _frontier: usize, _stats: &SearchStats) {
        self.0.generations.set(self.0.generations.get() + 1);
    }

    fn on_split(&mut self, _kept: usize, _deferred: usize, _stats: &SearchStats) {
        self.0.splits.set(self.0.splits.get() + 1);
    }

    fn on_resume(&mut self, _frontier: usize, _stats: &SearchStats) {
        self.0.resumes.set(self.0.resumes.get() + 1);
    }
}

#[test]
fn freecell_seed_1_is_solved() {
    let deal = Desk::deal(1).unwrap();
    let outcome = solve_first_clear(&deal, SearchLimits::freecell()).expect("search runs");
    assert_eq!(outcome.exit, Exit::Settled);
    let moves = outcome.clearing_moves().expect("seed 1 has a solution");
    let end = replay(&deal, moves);
    assert!(end.is_victory(), "replaying the solution must clear the desk");
    assert_eq!(end.count_base_cards(), 52);
    let homes = moves.iter().filter(|m| m.dst() >= 12).count();
    assert_eq!(homes, 52, "every card reaches a foundation exactly once");
    assert!(outcome.stats.expanded > 0);
}

#[test]
fn solved_desk_yields_empty_solution_without_expanding() {
    let outcome = solve(&Desk::solved(), SearchLimits::freecell()).unwrap();
    assert_eq!(
        outcome.solution,
        Some(Solution {
            moves: vec![],
            cleared: true,
            score: None,
        })
    );
    assert_eq!(outcome.stats.expanded, 0);
    assert_eq!(outcome.stats.generations, 1);
    assert_eq!(outcome.exit, Exit::Exhausted);

    let quick = solve_first_clear(&Desk::solved(), SearchLimits::freecell()).unwrap();
    assert_eq!(quick.exit, Exit::Settled);
    assert_eq!(quick.solution, outcome.solution);
}

#[test]
fn invalid_limits_are_rejected_before_searching() {
    let deal = Desk::deal(1).unwrap();
    for limits in [SearchLimits::new(100, 0), SearchLimits::new(100, 101)] {
        match solve(&deal, limits) {
            Err(SolveError::InvalidLimits { .. }) => {}
            other => panic!("expected InvalidLimits for {limits:?}, got {other:?}"),
        }
    }
    assert!(SearchLimits::new(100, 100).validate().is_ok());
    assert_eq!(SearchLimits::default(), SearchLimits::freecell());
}

#[test]
fn generation_budget_truncates() {
    let deal = Desk::deal(1).unwrap();
    let outcome = solve(&deal, SearchLimits::freecell().with_max_generations(3)).unwrap();
    assert_eq!(outcome.exit, Exit::Truncated);
    assert_eq!(outcome.stats.generations, 3);
    assert_eq!(outcome.solution, None);
}

#[test]
fn tripeaks_is_deterministic() {
    let deal = Peaks::deal(1).unwrap();
    let a = solve_first_clear(&deal, SearchLimits::tripeaks()).unwrap();
    let b = solve_first_clear(&Peaks::deal(1).unwrap(), SearchLimits::tripeaks()).unwrap();
    assert_eq!(a, b, "identical inputs must give identical outcomes");
    let moves = a.clearing_moves().expect("seed 1 clears");
    assert!(replay(&deal, moves).is_victory());
}

#[test]
fn tripeaks_score_policy_reports_a_scored_clear() {
    for seed in [1, 2] {
        let deal = Peaks::deal(seed).unwrap();
        let outcome = solve_for_score(&deal, SearchLimits::tripeaks()).unwrap();
        let solution = outcome.solution.expect("a clear is reachable");
        assert!(solution.cleared);
        let end = replay(&deal, &solution.moves);
        assert!(end.is_victory());
        assert_eq!(end.cleared_tops(), 3);
        let expected = HighestScore::<Peaks>::default().score(&end, &solution.moves);
        assert_eq!(solution.score, Some(expected));
        assert!(expected >= 45, "three cleared tops are worth 45 on their own");
    }
}

#[test]
fn small_frontier_resumes_checkpoints_and_still_clears() {
    let deal = Peaks::deal(24).unwrap();
    let counts = Rc::new(Counts::default());
    let outcome = Search::new(deal.clone(), SearchLimits::new(20, 5))
        .unwrap()
        .with_policy(ShortestSequence::first_clear())
        .with_observer(Counting(Rc::clone(&counts)))
        .run()
        .unwrap();
    assert!(outcome.stats.splits > 0);
    assert!(outcome.stats.resumes > 0, "the first dive should dead-end");
    assert_eq!(counts.generations.get(), outcome.stats.generations);
    assert_eq!(counts.splits.get(), outcome.stats.splits);
    assert_eq!(counts.resumes.get(), outcome.stats.resumes);
    assert!(
        outcome.stats.peak_frontier <= 20,
        "a split never keeps more than max_frontier, got {}",
        outcome.stats.peak_frontier
    );
    let moves = outcome.clearing_moves().expect("seed 24 clears");
    assert!(replay(&deal, moves).is_victory());
}

#[test]
fn spilled_checkpoints_match_in_memory_checkpoints() {
    let deal = Peaks::deal(24).unwrap();
    let limits = SearchLimits::new(20, 5);
    let memory = solve_first_clear(&deal, limits).unwrap();
    assert!(memory.stats.resumes > 0);

    for compression in [SpillCompression::None, SpillCompression::Lz4] {
        let dir = tempfile::tempdir().unwrap();
        let store = SpillStack::<PeaksMove>::create(dir.path(), compression).unwrap();
        let spilled = Search::new(deal.clone(), limits)
            .unwrap()
            .with_policy(ShortestSequence::first_clear())
            .with_store(store)
            .run()
            .unwrap();
        assert_eq!(spilled.solution, memory.solution);
        assert_eq!(spilled.stats, memory.stats);
        let left = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(left, 0, "spill files must be cleaned up");
    }
}

#[derive(Clone)]
struct Recording {
    inner: Peaks,
    expanded: Rc<RefCell<HashSet<DedupKey>>>,
    repeats: Rc<Cell<usize>>,
}

impl Game for Recording {
    type Move = PeaksMove;

    fn legal_moves(&self, out: &mut Vec<PeaksMove>) {
        if !self.expanded.borrow_mut().insert(self.inner.dedup_key()) {
            self.repeats.set(self.repeats.get() + 1);
        }
        self.inner.legal_moves(out);
    }

    fn apply(&mut self, mv: PeaksMove) {
        self.inner.apply(mv);
    }

    fn undo(&mut self, mv: PeaksMove) {
        self.inner.undo(mv);
    }

    fn is_victory(&self) -> bool {
        self.inner.is_victory()
    }

    fn dedup_key(&self) -> DedupKey {
        self.inner.dedup_key()
    }

    fn split_score(&self) -> i32 {
        self.inner.split_score()
    }
}

#[test]
fn unsplit_search_never_expands_a_state_twice() {
    let game = Recording {
        inner: Peaks::deal(1).unwrap(),
        expanded: Rc::new(RefCell::new(HashSet::new())),
        repeats: Rc::new(Cell::new(0)),
    };
    let expanded = Rc::clone(&game.expanded);
    let repeats = Rc::clone(&game.repeats);
    let outcome = Search::new(game, SearchLimits::new(10_000_000, 1).with_max_generations(15))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(outcome.stats.splits, 0);
    assert!(expanded.borrow().len() > 1000);
    assert_eq!(repeats.get(), 0);
}

#[test]
fn ladder_shortest_path() {
    let outcome = solve(&Ladder::new(12, Some(7)), SearchLimits::new(100, 10)).unwrap();
    let moves = outcome.clearing_moves().unwrap();
    assert_eq!(moves.len(), 4);
    assert_eq!(moves.iter().map(|&m| u32::from(m)).sum::<u32>(), 7);
}

#[test]
fn deferred_checkpoint_with_a_shorter_clear_wins() {
    let outcome = solve(&Fork::default(), SearchLimits::new(1, 1)).unwrap();
    assert_eq!(outcome.exit, Exit::Exhausted);
    assert_eq!(outcome.clearing_moves().unwrap(), &[SHORT, STEP, STEP]);
    assert_eq!(outcome.stats.resumes, 1);
    assert_eq!(outcome.stats.checkpoints_left, 0);

    let quick = solve_first_clear(&Fork::default(), SearchLimits::new(1, 1)).unwrap();
    assert_eq!(quick.exit, Exit::Settled);
    assert_eq!(quick.clearing_moves().unwrap().len(), 6);
    assert_eq!(quick.stats.checkpoints_left, 1);
}

#[test]
fn exhaustive_search_beats_the_first_clear_on_a_split_deal() {
    let deal = Peaks::deal(24).unwrap();
    let quick = solve_first_clear(&deal, SearchLimits::new(20, 5)).unwrap();
    let quick_len = quick.clearing_moves().expect("seed 24 clears").len();

    let exact = solve(&deal, SearchLimits::tripeaks()).unwrap();
    assert_eq!(exact.exit, Exit::Exhausted);
    assert!(exact.stats.resumes > 0);
    let moves = exact.clearing_moves().expect("seed 24 clears");
    assert!(replay(&deal, moves).is_victory());
    assert!(moves.len() <= quick_len);
    assert_eq!(moves.len(), 43);
}

#[test]
fn unreachable_goal_exhausts_every_checkpoint() {
    let outcome = solve(&Ladder::new(12, None), SearchLimits::new(2, 1)).unwrap();
    assert_eq!(outcome.exit, Exit::Exhausted);
    assert_eq!(outcome.solution, None);
    assert!(outcome.stats.splits > 0);
    assert_eq!(outcome.stats.resumes, outcome.stats.splits);
    assert_eq!(outcome.stats.checkpoints_left, 0);
}

#[test]
fn score_policy_falls_back_to_the_best_stuck_board() {
    let outcome = solve_for_score(&Ladder::new(10, None), SearchLimits::new(100, 10)).unwrap();
    assert_eq!(outcome.exit, Exit::Exhausted);
    let best = outcome.solution.expect("stuck boards are reported");
    assert!(!best.cleared);
    // Five two-rung steps: run bonus 1+2+3+4+5 plus the rung reached.
    assert_eq!(best.moves.len(), 5);
    assert_eq!(best.score, Some(15 + 10));
}
