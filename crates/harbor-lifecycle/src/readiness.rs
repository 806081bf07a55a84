//! Readiness gate: joins the backend and frontend readiness branches.
//!
//! The gate is a structural wait-for-both. A failed branch still settles and
//! counts toward the join; only a branch that never settles holds it back.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

/// One of the two readiness branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Backend,
    Frontend,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Backend => f.write_str("backend"),
            Branch::Frontend => f.write_str("frontend"),
        }
    }
}

/// How a branch settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    Ready,
    Failed(String),
}

impl BranchOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, BranchOutcome::Ready)
    }
}

/// Settled outcomes of both branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessJoin {
    pub backend: BranchOutcome,
    pub frontend: BranchOutcome,
}

impl ReadinessJoin {
    pub fn all_ready(&self) -> bool {
        self.backend.is_ready() && self.frontend.is_ready()
    }
}

/// Single-use join point for the two readiness branches.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    used: AtomicBool,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until both branches have settled.
    ///
    /// Returns `None` without polling either branch if the gate has already
    /// been used in this run.
    pub async fn join<B, F>(&self, backend: B, frontend: F) -> Option<ReadinessJoin>
    where
        B: Future<Output = BranchOutcome>,
        F: Future<Output = BranchOutcome>,
    {
        if self
            .used
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("readiness gate already used, ignoring second join");
            return None;
        }

        let (backend, frontend) = tokio::join!(backend, frontend);
        tracing::info!(
            backend_ready = backend.is_ready(),
            frontend_ready = frontend.is_ready(),
            "readiness branches joined"
        );
        Some(ReadinessJoin { backend, frontend })
    }

    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }
}
