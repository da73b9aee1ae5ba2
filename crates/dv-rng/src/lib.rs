//! dv-rng: deterministic number source for dungeon generation
//!
//! The generator only ever asks two things of its randomness: the next integer
//! in `[0, max)`, and a way to restart the stream from arbitrary bytes. That
//! contract is the [`NumberSource`] trait. [`Isaac64`] is the default
//! implementation, a port of the ISAAC64 generator that takes its seed as a
//! byte slice so a dungeon name can be fed in directly.

use serde::{Deserialize, Serialize};

/// Size of the ISAAC64 state arrays (2^8 = 256)
const ISAAC64_SZ_LOG: usize = 8;
const ISAAC64_SZ: usize = 1 << ISAAC64_SZ_LOG;
const HALF: usize = ISAAC64_SZ / 2;

/// Golden ratio, the initial value of every mixing lane.
const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C13;

/// Shift amounts used by the seeding mix, lane by lane.
const MIX_SHIFT: [u32; 8] = [9, 9, 23, 15, 14, 20, 17, 14];

/// A source of uniformly distributed bounded integers.
///
/// Generation code never looks past this trait, so any algorithm with
/// uniform output and reseed determinism can drive a build.
pub trait NumberSource {
    /// Next integer in `[0, max)`. Returns 0 when `max` is 0.
    fn next(&mut self, max: u32) -> u32;

    /// Restart the stream from `bytes`. Equal byte strings must yield equal
    /// streams.
    fn seed(&mut self, bytes: &[u8]);
}

impl<T: NumberSource + ?Sized> NumberSource for &mut T {
    fn next(&mut self, max: u32) -> u32 {
        (**self).next(max)
    }

    fn seed(&mut self, bytes: &[u8]) {
        (**self).seed(bytes)
    }
}

impl<T: NumberSource + ?Sized> NumberSource for Box<T> {
    fn next(&mut self, max: u32) -> u32 {
        (**self).next(max)
    }

    fn seed(&mut self, bytes: &[u8]) {
        (**self).seed(bytes)
    }
}

/// One recorded draw, for tracking down where two builds diverge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Sequence number of the raw u64 consumed (0-indexed)
    pub seq: u64,
    /// Requested bound
    pub max: u32,
    /// Value handed back
    pub result: u32,
}

/// ISAAC64 random number generator context
#[derive(Clone, Serialize, Deserialize)]
pub struct Isaac64 {
    /// Results buffer, consumed from the top down
    r: Vec<u64>,
    /// Memory state
    m: Vec<u64>,
    /// Accumulator
    a: u64,
    /// Previous result
    b: u64,
    /// Counter
    c: u64,
    /// Number of results remaining in `r`
    n: usize,
    /// Total number of u64 values consumed
    draws: u64,
    #[serde(skip)]
    tracing: bool,
    #[serde(skip)]
    trace: Vec<TraceEntry>,
}

impl core::fmt::Debug for Isaac64 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Isaac64")
            .field("a", &self.a)
            .field("b", &self.b)
            .field("c", &self.c)
            .field("n", &self.n)
            .field("draws", &self.draws)
            .finish()
    }
}

impl Isaac64 {
    /// Create a generator seeded from an arbitrary byte string.
    pub fn from_bytes(seed: &[u8]) -> Self {
        let mut ctx = Self {
            r: vec![0; ISAAC64_SZ],
            m: vec![0; ISAAC64_SZ],
            a: 0,
            b: 0,
            c: 0,
            n: 0,
            draws: 0,
            tracing: false,
            trace: Vec::new(),
        };
        ctx.init(seed);
        ctx
    }

    /// Create a generator seeded with the little-endian bytes of `seed`.
    pub fn from_u64(seed: u64) -> Self {
        Self::from_bytes(&seed.to_le_bytes())
    }

    fn init(&mut self, seed: &[u8]) {
        self.a = 0;
        self.b = 0;
        self.c = 0;
        self.draws = 0;
        self.r.iter_mut().for_each(|v| *v = 0);
        self.trace.clear();
        self.reseed(seed);
    }

    /// Fold seed bytes into the state and regenerate the result buffer.
    fn reseed(&mut self, seed: &[u8]) {
        let seed = &seed[..seed.len().min(ISAAC64_SZ * 8)];

        // Little-endian words, the last one possibly short.
        for (word, chunk) in seed.chunks(8).enumerate() {
            let val = chunk
                .iter()
                .enumerate()
                .fold(0u64, |acc, (k, &byte)| acc | (byte as u64) << (k * 8));
            self.r[word] ^= val;
        }

        let mut x = [GOLDEN; 8];
        for _ in 0..4 {
            Self::mix(&mut x);
        }

        for pass in 0..2 {
            for i in (0..ISAAC64_SZ).step_by(8) {
                for j in 0..8 {
                    let src = if pass == 0 { self.r[i + j] } else { self.m[i + j] };
                    x[j] = x[j].wrapping_add(src);
                }
                Self::mix(&mut x);
                self.m[i..i + 8].copy_from_slice(&x);
            }
        }

        self.update();
    }

    fn mix(x: &mut [u64; 8]) {
        for i in 0..8 {
            x[i] = x[i].wrapping_sub(x[(i + 4) & 7]);
            let carry = if i % 2 == 0 {
                x[(i + 7) & 7] >> MIX_SHIFT[i]
            } else {
                x[(i + 7) & 7] << MIX_SHIFT[i]
            };
            x[(i + 5) & 7] ^= carry;
            x[(i + 7) & 7] = x[(i + 7) & 7].wrapping_add(x[i]);
        }
    }

    #[inline]
    fn lower_bits(x: u64) -> usize {
        ((x >> 3) & (ISAAC64_SZ as u64 - 1)) as usize
    }

    #[inline]
    fn upper_bits(y: u64) -> usize {
        ((y >> (ISAAC64_SZ_LOG + 3)) & (ISAAC64_SZ as u64 - 1)) as usize
    }

    /// Produce the next block of 256 results.
    fn update(&mut self) {
        let mut a = self.a;
        self.c = self.c.wrapping_add(1);
        let mut b = self.b.wrapping_add(self.c);

        for i in 0..ISAAC64_SZ {
            let stirred = match i % 4 {
                0 => !(a ^ (a << 21)),
                1 => a ^ (a >> 5),
                2 => a ^ (a << 12),
                _ => a ^ (a >> 33),
            };
            a = stirred.wrapping_add(self.m[(i + HALF) % ISAAC64_SZ]);
            let x = self.m[i];
            let y = self.m[Self::lower_bits(x)].wrapping_add(a).wrapping_add(b);
            self.m[i] = y;
            b = self.m[Self::upper_bits(y)].wrapping_add(x);
            self.r[i] = b;
        }

        self.a = a;
        self.b = b;
        self.n = ISAAC64_SZ;
    }

    /// Next raw 64-bit output.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        if self.n == 0 {
            self.update();
        }
        self.n -= 1;
        self.draws += 1;
        self.r[self.n]
    }

    /// Returns a value in `[0, max)`; 0 when `max` is 0.
    pub fn below(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        let raw = self.next_u64();
        let result = (raw % max as u64) as u32;
        if self.tracing {
            self.trace.push(TraceEntry {
                seq: self.draws - 1,
                max,
                result,
            });
        }
        result
    }

    /// Start recording every bounded draw.
    pub fn enable_tracing(&mut self) {
        self.tracing = true;
        self.trace.clear();
    }

    pub fn disable_tracing(&mut self) {
        self.tracing = false;
    }

    /// Draws recorded since tracing was enabled.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Total number of raw u64 values consumed since the last seed.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl NumberSource for Isaac64 {
    fn next(&mut self, max: u32) -> u32 {
        self.below(max)
    }

    fn seed(&mut self, bytes: &[u8]) {
        let tracing = self.tracing;
        self.init(bytes);
        self.tracing = tracing;
    }
}

impl Default for Isaac64 {
    fn default() -> Self {
        Self::from_bytes(&[])
    }
}
