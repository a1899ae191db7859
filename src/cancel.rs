//! Caller-owned cancellation handle.
//!
//! Every operation that talks to the store takes a `&CancellationToken`. The
//! token is checked before each store round-trip; requests already in flight
//! are allowed to finish. There is no internal timer: deadlines come from the
//! token itself.

use crate::error::{GeoKvError, Result};
use std::time::{Duration, Instant};

/// A [`tokio_util::sync::CancellationToken`] with an optional deadline.
///
/// Clones observe the same signal, so a token handed to a query can be
/// cancelled from another thread. No async runtime is needed.
///
/// ```rust
/// use geokv::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    token: tokio_util::sync::CancellationToken,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// A token that is only cancelled by an explicit [`cancel`](Self::cancel).
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also counts as cancelled once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: tokio_util::sync::CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Attach an existing token, e.g. one shared with async request handlers.
    pub fn from_token(token: tokio_util::sync::CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Same signal with a deadline; an earlier existing deadline wins.
    pub fn and_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |own| own.min(deadline)));
        self
    }

    /// A token that fires with `self` but can also be cancelled on its own
    /// without affecting `self`. The deadline is inherited.
    pub fn child_token(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// `Err(GeoKvError::Cancelled)` once the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(GeoKvError::Cancelled);
        }
        Ok(())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The underlying signal, for awaiting cancellation in async code.
    pub fn token(&self) -> &tokio_util::sync::CancellationToken {
        &self.token
    }
}

impl From<tokio_util::sync::CancellationToken> for CancellationToken {
    fn from(token: tokio_util::sync::CancellationToken) -> Self {
        Self::from_token(token)
    }
}
