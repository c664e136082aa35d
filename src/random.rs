//! Random data source for overwrite passes and name obfuscation.
//!
//! The primary source is the OS entropy device. When it fails the source
//! degrades to a seeded pseudo-random generator; the base seed is drawn from
//! a non-deterministic source once per process, and the overwrite kernel
//! reseeds per pass with `seed ^ pass ^ offset` so block fills stay distinct
//! even while degraded.

use log::warn;
use rand::distributions::Alphanumeric;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use std::sync::OnceLock;

static BASE_SEED: OnceLock<u64> = OnceLock::new();

fn base_seed() -> u64 {
    *BASE_SEED.get_or_init(|| {
        let mut seed = [0u8; 8];
        if OsRng.try_fill_bytes(&mut seed).is_ok() {
            u64::from_le_bytes(seed)
        } else {
            // Entropy device unavailable at startup; fall back to the clock.
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x5DEECE66D)
        }
    })
}

pub struct RandomSource {
    fallback: StdRng,
    degraded: bool,
}

impl RandomSource {
    pub fn new() -> Self {
        Self {
            fallback: StdRng::seed_from_u64(base_seed()),
            degraded: false,
        }
    }

    /// Reseed the fallback generator for a (pass, offset) position.
    pub fn reseed(&mut self, pass: u64, offset: u64) {
        self.fallback = StdRng::seed_from_u64(base_seed() ^ pass ^ offset);
    }

    /// Fill `buf` with random bytes, preferring the OS entropy device.
    pub fn fill(&mut self, buf: &mut [u8]) {
        match OsRng.try_fill_bytes(buf) {
            Ok(()) => {}
            Err(e) => {
                if !self.degraded {
                    warn!(
                        "OS entropy source unavailable ({}); using seeded fallback generator.",
                        e
                    );
                    self.degraded = true;
                }
                self.fallback.fill_bytes(buf);
            }
        }
    }

    /// Random file name over the 62-symbol alphanumeric alphabet.
    pub fn random_name(&mut self, len: usize) -> String {
        let mut seed = [0u8; 32];
        self.fill(&mut seed);
        StdRng::from_seed(seed)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_produces_nonconstant_output() {
        let mut source = RandomSource::new();
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        source.fill(&mut a);
        source.fill(&mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn reseed_is_deterministic_per_position() {
        let mut a = RandomSource::new();
        let mut b = RandomSource::new();
        a.reseed(2, 4096);
        b.reseed(2, 4096);
        let mut out_a = [0u8; 32];
        let mut out_b = [0u8; 32];
        a.fallback.fill_bytes(&mut out_a);
        b.fallback.fill_bytes(&mut out_b);
        assert_eq!(out_a, out_b);

        b.reseed(3, 4096);
        let mut out_c = [0u8; 32];
        b.fallback.fill_bytes(&mut out_c);
        assert_ne!(out_a, out_c);
    }

    #[test]
    fn random_name_is_alphanumeric_and_sized() {
        let mut source = RandomSource::new();
        let name = source.random_name(32);
        assert_eq!(name.len(), 32);
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(name, source.random_name(32));
    }
}
