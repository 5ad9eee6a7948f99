//! Deterministic random number generation for synthetic ticket batches.
//!
//! RULE: Nothing in the core may call a platform RNG.
//! All randomness flows through `BatchRng` streams derived from one seed.
//!
//! Each stream is seeded from (seed XOR stream index). Adding a new stream
//! never changes the draws of an existing one.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for one stream of a synthetic batch.
pub struct BatchRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl BatchRng {
    /// The stream index must never change once assigned.
    pub fn new(seed: u64, stream: BatchStream) -> Self {
        let derived_seed = seed ^ (stream as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            name: stream.name(),
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll in [0, n). `n == 0` yields 0.
    pub fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Simplified Pareto draw; a few customers end up with most tickets.
    pub fn pareto(&mut self, x_min: f64, alpha: f64) -> f64 {
        let u = self.next_f64().max(1e-10);
        x_min * u.powf(-1.0 / alpha)
    }

    pub fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.get(self.below(items.len() as u64) as usize)
    }
}

/// Stable stream assignments.
/// NEVER reorder or remove entries, only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum BatchStream {
    Identity = 0,
    Customer = 1,
    Agent    = 2,
    Timing   = 3,
    Handling = 4,
}

impl BatchStream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Customer => "customer",
            Self::Agent    => "agent",
            Self::Timing   => "timing",
            Self::Handling => "handling",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = BatchRng::new(7, BatchStream::Timing);
        let mut b = BatchRng::new(7, BatchStream::Timing);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn streams_diverge() {
        let mut a = BatchRng::new(7, BatchStream::Timing);
        let mut b = BatchRng::new(7, BatchStream::Agent);
        let draws_a: Vec<u64> = (0..4).map(|_| a.next_u64()).collect();
        let draws_b: Vec<u64> = (0..4).map(|_| b.next_u64()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn unit_interval() {
        let mut rng = BatchRng::new(99, BatchStream::Customer);
        for _ in 0..1000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x), "{x} out of range");
        }
    }
}
