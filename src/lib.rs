#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // may be revisited
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod types;
pub mod cards;
pub mod error;
pub mod hash;
pub mod logging;
pub mod rng;
pub mod state;

pub mod engine {
    pub mod apply;
    pub mod score;
}

pub mod games;
pub mod solver;

// Re-exports: stable minimal API surface for external callers
pub use crate::engine::apply::{replay, Applied};
pub use crate::engine::score::{Finish, HighestScore, SelectionPolicy, ShortestSequence};
pub use crate::error::{DealError, SolveError, SpillError};
pub use crate::games::{Desk, FreecellMove, Peaks, PeaksMove};
pub use crate::hash::DedupKey;
pub use crate::solver::{
    solve, solve_first_clear, solve_for_score, Exit, Outcome, Search, SearchLimits,
    SearchObserver, SearchStats, Solution,
};
pub use crate::state::{is_victory, legal_moves, Game, Scored};
pub use crate::types::{Card, Suit};
