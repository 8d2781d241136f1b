//! Injected random source.
//!
//! Content fairness (weighted prize tables, ambient chance rolls) runs
//! through one shared handle so tests can pin the seed and replay outcomes.

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

#[derive(Clone)]
pub struct GameRng {
    inner: Arc<Mutex<SmallRng>>,
}

impl GameRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SmallRng::seed_from_u64(seed))),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SmallRng::from_rng(&mut rand::rng()))),
        }
    }

    /// One uniform draw out of 1000
    pub fn chance(&self, permille: u32) -> bool {
        if permille >= 1000 {
            return true;
        }
        self.inner.lock().random_range(0..1000u32) < permille
    }

    /// One integer from the half-open range `[min, max)`; a degenerate
    /// range yields `min`
    pub fn range(&self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.inner.lock().random_range(min..max)
    }

    pub fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.inner.lock().random_range(0..len))
    }

    /// Cumulative-weight draw; `None` when every weight is zero
    pub fn weighted(&self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|&w| w as u64).sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.inner.lock().random_range(0..total);
        for (i, &w) in weights.iter().enumerate() {
            let w = w as u64;
            if roll < w {
                return Some(i);
            }
            roll -= w;
        }
        None
    }
}
