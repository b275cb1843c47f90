use rand::Rng;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Candidate-selection strategy, one method wide on purpose: the pipeline
/// commits to the boundary, not to any particular algorithm.
///
/// `select` returns `None` only for an empty candidate slice; callers turn
/// that into a discovery failure.
pub trait LoadBalancer: Send + Sync {
    fn select(&self, candidates: &[SocketAddr]) -> Option<SocketAddr>;
}

/// Cycles through candidates with a shared atomic cursor.
///
/// The cursor is global to the balancer rather than per service list, which
/// keeps selection fair enough without tracking list identity.
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundRobin {
    pub fn new() -> Self {
        Self {
            cursor: AtomicUsize::new(0),
        }
    }
}

impl LoadBalancer for RoundRobin {
    fn select(&self, candidates: &[SocketAddr]) -> Option<SocketAddr> {
        if candidates.is_empty() {
            return None;
        }
        let turn = self.cursor.fetch_add(1, Ordering::Relaxed);
        Some(candidates[turn % candidates.len()])
    }
}

/// Uniform random selection.
pub struct Random;

impl LoadBalancer for Random {
    fn select(&self, candidates: &[SocketAddr]) -> Option<SocketAddr> {
        if candidates.is_empty() {
            return None;
        }
        let idx = rand::rng().random_range(0..candidates.len());
        Some(candidates[idx])
    }
}
