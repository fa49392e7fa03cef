use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::error::SolveError;
use crate::solver::dedup::DedupTable;

/// A deferred frontier plus the visited table it was split under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint<M> {
    pub frontier: Vec<Vec<M>>,
    pub seen: DedupTable,
}

/// LIFO storage for checkpoints. The most recent split is resumed first.
pub trait CheckpointStore<M> {
    type Error: Into<SolveError>;

    fn push(&mut self, checkpoint: Checkpoint<M>) -> Result<(), Self::Error>;

    fn pop(&mut self) -> Result<Option<Checkpoint<M>>, Self::Error>;

    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checkpoints held in memory.
#[derive(Debug, Clone)]
pub struct MemoryStack<M> {
    stack: Vec<Checkpoint<M>>,
}

impl<M> Default for MemoryStack<M> {
    fn default() -> Self {
        Self { stack: Vec::new() }
    }
}

impl<M> MemoryStack<M> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deferred sequences across all stored checkpoints.
    pub fn deferred_sequences(&self) -> usize {
        self.stack.iter().map(|c| c.frontier.len()).sum()
    }
}

impl<M> CheckpointStore<M> for MemoryStack<M> {
    type Error = Infallible;

    #[inline]
    fn push(&mut self, checkpoint: Checkpoint<M>) -> Result<(), Infallible> {
        self.stack.push(checkpoint);
        Ok(())
    }

    #[inline]
    fn pop(&mut self) -> Result<Option<Checkpoint<M>>, Infallible> {
        Ok(self.stack.pop())
    }

    #[inline]
    fn len(&self) -> usize {
        self.stack.len()
    }
}
