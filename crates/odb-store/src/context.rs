//! Cooperative cancellation for repository and resolver calls.
//!
//! A [`Context`] is threaded through every operation. Long dereference chains
//! and large payload copies poll [`Context::check`] between steps and bail
//! out with [`StoreError::Cancelled`] once the context is cancelled or its
//! deadline has passed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{StoreError, StoreResult};

/// Execution context carrying a cancellation flag and optional deadline.
///
/// Clones share the same flag: cancelling any clone cancels all of them.
#[derive(Clone, Debug, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled unless [`cancel`](Self::cancel) is called.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    ///
    /// A timeout too large to represent as an [`Instant`] means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// A child context sharing this one's flag, with a deadline no later than
    /// both the parent's and `timeout` from now.
    ///
    /// If `timeout` overflows, the child inherits the parent's deadline as is.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(parent), Some(candidate)) => Some(parent.min(candidate)),
            (parent, candidate) => parent.or(candidate),
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline,
        }
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` once cancelled or past the deadline.
    pub fn is_done(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail with [`StoreError::Cancelled`] if the context is done.
    pub fn check(&self) -> StoreResult<()> {
        if self.is_done() {
            return Err(StoreError::Cancelled);
        }
        Ok(())
    }
}
