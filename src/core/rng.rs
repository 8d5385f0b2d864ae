//! Deterministic random streams for chance-based effects.
//!
//! Scripts may gate on `roll` ("20% chance on hit"). To keep evaluation a pure
//! function of its context, every firing receives its own forked stream from
//! the engine's seeded RNG, so the same seed and the same event sequence
//! always produce the same rolls.
//!
//! ```
//! use rune_engine::core::EffectRng;
//!
//! let mut a = EffectRng::new(42);
//! let mut b = EffectRng::new(42);
//! assert_eq!(a.fork().roll(), b.fork().roll());
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded, forkable RNG.
///
/// Uses ChaCha8 for speed while keeping streams reproducible across platforms.
#[derive(Clone, Debug)]
pub struct EffectRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl EffectRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Fork an independent stream.
    ///
    /// Each fork produces a different but deterministic sequence.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self.seed.wrapping_add(self.fork_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self {
            inner: ChaCha8Rng::seed_from_u64(fork_seed),
            seed: fork_seed,
            fork_counter: 0,
        }
    }

    /// Uniform sample in `[0, 1)`.
    pub fn roll(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// The seed this stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}
