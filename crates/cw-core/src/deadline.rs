//! Caller-supplied deadline and cancellation signal.
//!
//! Services never create or extend a [`Deadline`]; they pass the caller's
//! value to every repository call. Repositories call [`Deadline::check`]
//! before touching storage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{RepoError, RepoResult};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Bounds a request: an optional expiry instant and an optional cancel token.
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    expires_at: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl Deadline {
    /// No expiry and no cancellation.
    pub fn none() -> Self {
        Self::default()
    }

    /// Expires `timeout` from now.
    pub fn within(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }

    /// Expires at `instant`.
    pub fn at(instant: Instant) -> Self {
        Self {
            expires_at: Some(instant),
            cancel: None,
        }
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Time left before expiry; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Whether the request has been cancelled or has run out of time.
    pub fn is_done(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
            || self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Fails with [`RepoError::Cancelled`] once the request is done.
    pub fn check(&self) -> RepoResult<()> {
        if self.is_done() {
            return Err(RepoError::Cancelled);
        }
        Ok(())
    }
}
