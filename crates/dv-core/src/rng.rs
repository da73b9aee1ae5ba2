//! Number source helpers
//!
//! The generator draws through [`NumberSource`] only. This module adds the
//! derived draws it needs (shuffles, percentage rolls) and a ChaCha8-backed
//! source for callers that prefer it over ISAAC64.

use dv_rng::NumberSource;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Draws derived from `next`.
pub trait NumberSourceExt: NumberSource {
    /// Fisher-Yates shuffle in place, walking from the back.
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next(i as u32 + 1) as usize;
            slice.swap(i, j);
        }
    }

    /// True with probability `pct` percent.
    fn percent(&mut self, pct: u32) -> bool {
        self.next(100) < pct
    }

    /// Index into a non-empty collection of `len` items.
    fn pick_index(&mut self, len: usize) -> usize {
        self.next(len as u32) as usize
    }
}

impl<R: NumberSource + ?Sized> NumberSourceExt for R {}

/// ChaCha8 stream seeded from a byte string
#[derive(Debug, Clone)]
pub struct ChaChaSource {
    rng: ChaCha8Rng,
}

impl ChaChaSource {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            rng: ChaCha8Rng::from_seed(fold_seed(bytes)),
        }
    }
}

/// Fold an arbitrary byte string into a 32-byte key. Bytes past the key
/// length wrap around and are xor'd in, and the length is mixed into the
/// last byte so that trailing zero bytes still change the key.
fn fold_seed(bytes: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    for (i, &b) in bytes.iter().enumerate() {
        key[i % 32] ^= b.rotate_left((i / 32) as u32 % 8);
    }
    key[31] ^= bytes.len() as u8;
    key
}

impl Default for ChaChaSource {
    fn default() -> Self {
        Self::from_bytes(&[])
    }
}

impl NumberSource for ChaChaSource {
    fn next(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.rng.gen_range(0..max)
    }

    fn seed(&mut self, bytes: &[u8]) {
        self.rng = ChaCha8Rng::from_seed(fold_seed(bytes));
    }
}
