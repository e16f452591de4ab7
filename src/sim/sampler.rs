//! Monte-Carlo estimate of the AD chain coefficient for one `(hit, ring)` bucket.
//!
//! Each trial scatters `hit` monsters over the skill annulus and `ring` monsters over the
//! ring one proc radius wide, then counts how many skill↔skill and skill↔ring pairs sit
//! closer than the proc radius. The per-trial counts feed a histogram; the coefficient is
//! the baseline `2·hit` plus the histogram's weighted mean (skill pairs weigh double).

use rand::Rng;
use rayon::prelude::*;

use crate::error::{AreaDamageError, Result};
use crate::sim::geometry::{scatter, GeometryPoint};
use crate::sim::params::SampleConfig;
use crate::sim::rng::{bucket_seed, SplitMix64};

/// Trial batches used when a single bucket is estimated in parallel. Fixed so a seed
/// reproduces the same coefficient on any machine.
pub const COEFFICIENT_BATCHES: usize = 16;

/// Per-trial co-proc counts. Index `k - 1` holds how many trials had exactly `k`
/// qualifying pairs; trials with zero pairs are not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcHistogram {
    pub skill_pairs: Vec<u64>,
    pub ring_pairs: Vec<u64>,
    pub trials: usize,
}

impl ProcHistogram {
    pub fn new(hit_count: usize, ring_count: usize) -> Self {
        Self {
            skill_pairs: vec![0; hit_count * hit_count.saturating_sub(1) / 2],
            ring_pairs: vec![0; hit_count * ring_count],
            trials: 0,
        }
    }

    /// Count one trial with `skill_count` skill↔skill and `ring_count` skill↔ring pairs.
    /// Counts above the bucket's pair totals are rejected and leave the histogram as is.
    pub fn record(&mut self, skill_count: usize, ring_count: usize) -> Result<()> {
        if skill_count > self.skill_pairs.len() || ring_count > self.ring_pairs.len() {
            return Err(AreaDamageError::invalid(format!(
                "trial counts ({skill_count}, {ring_count}) exceed pair totals ({}, {})",
                self.skill_pairs.len(),
                self.ring_pairs.len()
            )));
        }
        if skill_count > 0 {
            self.skill_pairs[skill_count - 1] += 1;
        }
        if ring_count > 0 {
            self.ring_pairs[ring_count - 1] += 1;
        }
        self.trials += 1;
        Ok(())
    }

    /// Fold another histogram for the same bucket into this one. Histograms of a
    /// different bucket shape are rejected.
    pub fn merge(&mut self, other: &ProcHistogram) -> Result<()> {
        if self.skill_pairs.len() != other.skill_pairs.len()
            || self.ring_pairs.len() != other.ring_pairs.len()
        {
            return Err(AreaDamageError::invalid(format!(
                "cannot merge histogram of shape ({}, {}) into ({}, {})",
                other.skill_pairs.len(),
                other.ring_pairs.len(),
                self.skill_pairs.len(),
                self.ring_pairs.len()
            )));
        }
        for (a, b) in self.skill_pairs.iter_mut().zip(&other.skill_pairs) {
            *a += b;
        }
        for (a, b) in self.ring_pairs.iter_mut().zip(&other.ring_pairs) {
            *a += b;
        }
        self.trials += other.trials;
        Ok(())
    }

    /// `2·hit + Σ 2·k·f[k]/n + Σ k·f[k]/n`. A skill↔skill proc links two monsters that
    /// were both hit; a skill↔ring proc reaches one new monster.
    pub fn coefficient(&self, hit_count: usize) -> f64 {
        let baseline = 2.0 * hit_count as f64;
        if self.trials == 0 {
            return baseline;
        }
        let n = self.trials as f64;
        let weighted = |hist: &[u64]| -> f64 {
            hist.iter()
                .enumerate()
                .map(|(idx, &freq)| (idx + 1) as f64 * freq as f64)
                .sum::<f64>()
                / n
        };
        baseline
            + 2.0 * weighted(self.skill_pairs.as_slice())
            + weighted(self.ring_pairs.as_slice())
    }
}

/// Expected number of extra proc-chain connections for `hit_count` monsters inside the
/// skill and `ring_count` monsters in the surrounding ring.
pub fn estimate_proc_coefficient<R: Rng + ?Sized>(
    config: &SampleConfig,
    hit_count: usize,
    ring_count: usize,
    rng: &mut R,
) -> Result<f64> {
    let histogram = sample_histogram(config, hit_count, ring_count, config.sample_size(), rng)?;
    Ok(histogram.coefficient(hit_count))
}

/// Like [estimate_proc_coefficient] but splits the trials into up to `batches` batches
/// run on the rayon pool. Batch `i` draws from its own generator seeded from `(seed, i)`,
/// so the result depends on `seed` and `batches` only.
pub fn estimate_proc_coefficient_batched(
    config: &SampleConfig,
    hit_count: usize,
    ring_count: usize,
    seed: u64,
    batches: usize,
) -> Result<f64> {
    if batches == 0 {
        return Err(AreaDamageError::invalid("batches must be greater than zero"));
    }
    let partials = trial_batches(config.sample_size(), batches)
        .into_par_iter()
        .enumerate()
        .map(|(index, trials)| {
            let mut rng = SplitMix64::new(bucket_seed(seed, index, 0));
            sample_histogram(config, hit_count, ring_count, trials, &mut rng)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut histogram = ProcHistogram::new(hit_count, ring_count);
    for partial in &partials {
        histogram.merge(partial)?;
    }
    Ok(histogram.coefficient(hit_count))
}

/// Trials per batch, earlier batches taking the remainder. Never yields an empty batch.
fn trial_batches(trials: usize, batches: usize) -> Vec<usize> {
    let batches = batches.min(trials);
    if batches == 0 {
        return Vec::new();
    }
    let (base, extra) = (trials / batches, trials % batches);
    (0..batches).map(|index| base + usize::from(index < extra)).collect()
}

/// Run `trials` trials for one bucket. Point buffers are allocated once and reused.
pub fn sample_histogram<R: Rng + ?Sized>(
    config: &SampleConfig,
    hit_count: usize,
    ring_count: usize,
    trials: usize,
    rng: &mut R,
) -> Result<ProcHistogram> {
    if trials == 0 {
        return Err(AreaDamageError::invalid("trial count must be greater than zero"));
    }
    let mut histogram = ProcHistogram::new(hit_count, ring_count);
    // Nothing to pair: every trial records zero and the coefficient is the baseline.
    if hit_count == 0 || (hit_count == 1 && ring_count == 0) {
        histogram.trials = trials;
        return Ok(histogram);
    }

    let proc_radius = config.proc_radius();
    let skill_band = config.skill_band();
    let ring_band = config.ring_band();
    let mut hit_points: Vec<GeometryPoint> = Vec::with_capacity(hit_count);
    let mut ring_points: Vec<GeometryPoint> = Vec::with_capacity(ring_count);

    for _ in 0..trials {
        scatter(rng, &mut hit_points, hit_count, skill_band);
        scatter(rng, &mut ring_points, ring_count, ring_band);

        let mut skill_hits = 0usize;
        for (i, a) in hit_points.iter().enumerate() {
            for b in &hit_points[i + 1..] {
                if a.within(b, proc_radius) {
                    skill_hits += 1;
                }
            }
        }

        let mut ring_hits = 0usize;
        for a in &hit_points {
            for b in &ring_points {
                if a.within(b, proc_radius) {
                    ring_hits += 1;
                }
            }
        }

        histogram.record(skill_hits, ring_hits)?;
    }
    Ok(histogram)
}
