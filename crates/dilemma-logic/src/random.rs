//! Seeded pseudo-random number generator
//!
//! Deterministic PRNG for reproducible game execution.
//! Wraps `SmallRng` and keeps the seed around so independent
//! per-player streams can be derived without consuming the parent.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seeded random number generator
///
/// Deterministic: same seed + index = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    seed: [u8; 32],
    inner: SmallRng,
}

impl SeededRng {
    /// Create a new RNG from a 32-byte seed and match index
    pub fn new(seed: &[u8; 32], match_index: u32) -> Self {
        let salt = (match_index as u64).wrapping_mul(0x517cc1b727220a95);
        Self::from_seed(derive_seed(seed, salt))
    }

    /// Create an RNG seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            seed,
            inner: SmallRng::from_seed(seed),
        }
    }

    /// The 32-byte seed this generator was built from
    pub fn seed(&self) -> &[u8; 32] {
        &self.seed
    }

    /// Derive an independent stream, e.g. one per player
    pub fn fork(&self, stream: u32) -> Self {
        let salt = (stream as u64 + 1).wrapping_mul(0x9e3779b97f4a7c15);
        Self::from_seed(derive_seed(&self.seed, salt))
    }

    /// Generate next u64
    pub fn next_u64(&mut self) -> u64 {
        self.inner.random()
    }

    /// Uniform coin flip
    pub fn next_bool(&mut self) -> bool {
        self.inner.random()
    }

    /// `true` with probability `p`; values outside [0, 1] are clamped
    pub fn chance(&mut self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        self.inner.random_bool(p.clamp(0.0, 1.0))
    }

    /// Generate a value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.inner.random_range(0..max)
    }

    /// Pick a uniformly random element
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_range(items.len() as u32) as usize)
    }
}

/// Run each salted seed word through `seed_from_u64` so nearby salts
/// give unrelated xoshiro states
fn derive_seed(seed: &[u8; 32], salt: u64) -> [u8; 32] {
    let mut derived = [0u8; 32];
    for (i, (out, chunk)) in derived.chunks_mut(8).zip(seed.chunks(8)).enumerate() {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        let word = u64::from_le_bytes(word) ^ salt.rotate_left(i as u32 * 16);
        let mut mixer = SmallRng::seed_from_u64(word);
        out.copy_from_slice(&mixer.random::<u64>().to_le_bytes());
    }
    derived
}
