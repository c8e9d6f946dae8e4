//! Cooperative cancellation for long-running operations.
//!
//! The project-wide reference search (and snapshot indexing before it) can be
//! long-running on large workspaces, so every suspending step threads a
//! [`CancellationToken`] through and checks it at natural boundaries
//! (per-document, never mid-edit). Cancellation is always cooperative; there
//! is no thread interruption anywhere in the engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// The operation observed a tripped cancellation token and stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// A shared, cloneable cancellation flag.
///
/// Cloning produces a handle to the same underlying flag: cancelling any
/// clone cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, untripped token.
    pub fn new() -> Self {
        CancellationToken::default()
    }

    /// Trip the token. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether the token has been tripped.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Return `Err(Cancelled)` if the token has been tripped.
    ///
    /// Call sites use this with `?` at document boundaries.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
