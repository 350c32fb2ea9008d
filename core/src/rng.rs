//! Random draws for the desk.
//!
//! RULE: Nothing in the desk may call a platform RNG for workflow values.
//! The lazily materialized suggested guarantee draws from DeskRng, which
//! is seeded from config (reproducible) or from entropy when no seed is set.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

pub struct DeskRng {
    inner: Pcg64Mcg,
}

impl DeskRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: Pcg64Mcg::from_entropy(),
        }
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll an integer in [lo, hi], both ends included.
    pub fn between_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        lo + self.next_u64_below(u64::from(hi - lo) + 1) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_draws() {
        let mut a = DeskRng::seeded(7);
        let mut b = DeskRng::seeded(7);
        for _ in 0..20 {
            assert_eq!(a.between_inclusive(70, 90), b.between_inclusive(70, 90));
        }
    }

    #[test]
    fn draws_stay_in_range() {
        let mut rng = DeskRng::seeded(0xDEAD_BEEF);
        for _ in 0..1_000 {
            let v = rng.between_inclusive(70, 90);
            assert!((70..=90).contains(&v));
        }
    }
}
