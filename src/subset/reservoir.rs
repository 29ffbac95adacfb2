//! Reservoir sampling (Algorithm R) for the seed phase.

use rand::Rng;
use rand::RngExt;

/// Fixed-capacity uniform sampler over a stream.
///
/// Every item seen has equal probability of ending up in the reservoir.
/// Selection depends only on the RNG state and the stream, so a seeded RNG
/// makes the draw reproducible.
#[derive(Debug)]
pub struct Reservoir<T, R: Rng> {
    capacity: usize,
    seen: usize,
    items: Vec<T>,
    rng: R,
}

impl<T, R: Rng> Reservoir<T, R> {
    pub fn new(capacity: usize, rng: R) -> Self {
        Self {
            capacity,
            seen: 0,
            items: Vec::with_capacity(capacity),
            rng,
        }
    }

    /// Consider one stream item for inclusion.
    pub fn consider(&mut self, item: T) {
        self.seen += 1;
        if self.items.len() < self.capacity {
            self.items.push(item);
        } else {
            let slot = self.rng.random_range(0..self.seen);
            if slot < self.capacity {
                self.items[slot] = item;
            }
        }
    }

    /// Total items seen so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Consume the reservoir and return the sampled items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
