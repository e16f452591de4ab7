//! Fast PRNG for the geometry trials. SplitMix64 exposed through `rand::RngCore` so the
//! sampler can take any `rand::Rng`; tests may inject a different seeded generator.
//! Deterministic: same seed produces the same sequence. Not cryptographically secure.

use rand::{Error, RngCore, SeedableRng};

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

#[derive(Debug, Clone, Copy)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed drawn from OS entropy, for runs that did not pin one.
    pub fn entropy_seed() -> Result<u64, getrandom::Error> {
        let mut buf = [0u8; 8];
        getrandom::getrandom(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    #[inline]
    fn step(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }
}

impl RngCore for SplitMix64 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SplitMix64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

/// Mix a base seed with a bucket's coordinates so every bucket draws an independent stream.
pub fn bucket_seed(seed: u64, hit: usize, ring: usize) -> u64 {
    let mut acc = seed;
    for part in [hit as u64, ring as u64] {
        acc = acc.wrapping_mul(37).wrapping_add(part);
        acc ^= acc >> 29;
        acc = acc.wrapping_mul(SPLITMIX64_M1);
    }
    acc
}
