use std::convert::Infallible;
use std::fmt;

use crate::types::Card;

/// Rejections raised while building a deal, before any search work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DealError {
    /// A layout had the wrong number of piles.
    PileCount { expected: usize, found: usize },
    /// A pile held the wrong number of cards for its role.
    PileSize { pile: usize, expected: usize, found: usize },
    /// The whole layout did not hold exactly 52 cards.
    CardCount { found: usize },
    DuplicateCard(Card),
    /// A two-character token did not name a card.
    UnknownCard(String),
    SeedOutOfRange(u64),
    /// A foundation pile is not its suit built up from the ace.
    Foundation { pile: usize, card: Card },
    /// A cell held more than one card.
    CellOverfull { pile: usize, found: usize },
}

impl fmt::Display for DealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DealError::PileCount { expected, found } => {
                write!(f, "expected {expected} piles, found {found}")
            }
            DealError::PileSize { pile, expected, found } => {
                write!(f, "pile {pile}: expected {expected} cards, found {found}")
            }
            DealError::CardCount { found } => write!(f, "expected 52 cards, found {found}"),
            DealError::DuplicateCard(card) => write!(f, "duplicate card {card}"),
            DealError::UnknownCard(tok) => write!(f, "unknown card '{tok}'"),
            DealError::SeedOutOfRange(seed) => {
                write!(f, "seed {seed} out of range (must be below 2^31)")
            }
            DealError::Foundation { pile, card } => {
                write!(f, "foundation {pile}: card {card} out of sequence")
            }
            DealError::CellOverfull { pile, found } => {
                write!(f, "cell {pile} holds {found} cards")
            }
        }
    }
}

impl std::error::Error for DealError {}

/// Failures of the on-disk checkpoint store.
#[derive(Debug)]
pub enum SpillError {
    Io {
        stage: &'static str,
        path: String,
        error: std::io::Error,
    },
    Codec { stage: &'static str, error: String },
    /// A frame failed its magic, version, length or checksum checks.
    Corrupt { path: String, reason: String },
}

impl fmt::Display for SpillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpillError::Io { stage, path, error } => {
                write!(f, "spill i/o error at {stage} ({path}): {error}")
            }
            SpillError::Codec { stage, error } => write!(f, "spill codec error at {stage}: {error}"),
            SpillError::Corrupt { path, reason } => write!(f, "corrupt spill frame {path}: {reason}"),
        }
    }
}

impl std::error::Error for SpillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpillError::Io { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Errors that stop a search before or while it runs. Running out of
/// frontier is not one of them; that is a normal [`crate::solver::Outcome`].
#[derive(Debug)]
pub enum SolveError {
    InvalidLimits { reason: String },
    Spill(SpillError),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::InvalidLimits { reason } => write!(f, "invalid search limits: {reason}"),
            SolveError::Spill(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolveError::Spill(e) => Some(e),
            SolveError::InvalidLimits { .. } => None,
        }
    }
}

impl From<SpillError> for SolveError {
    fn from(e: SpillError) -> Self {
        SolveError::Spill(e)
    }
}

impl From<Infallible> for SolveError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
