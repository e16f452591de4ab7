//! Fold per-bucket coefficients into expected damage at the old and new AD percentages.

use log::{debug, info};
use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::data::frequency::FrequencyTable;
use crate::error::{AreaDamageError, Result};
use crate::parallel::WorkerPool;
use crate::sim::params::{AdChange, SampleConfig};
use crate::sim::rng::{bucket_seed, SplitMix64};
use crate::sim::sampler::estimate_proc_coefficient;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketEstimate {
    pub hit: usize,
    pub ring: usize,
    pub weight: u64,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageEstimate {
    pub old_total: f64,
    pub new_total: f64,
    pub ratio: f64,
    pub buckets: Vec<BucketEstimate>,
}

impl DamageEstimate {
    pub fn percent_increase(&self) -> f64 {
        100.0 * (self.ratio - 1.0)
    }
}

/// Ratio of expected damage at `ad.new_ad_pct` to expected damage at `ad.old_ad_pct`.
pub fn expected_damage_ratio<R: Rng + ?Sized>(
    table: &FrequencyTable,
    config: &SampleConfig,
    ad: AdChange,
    rng: &mut R,
) -> Result<f64> {
    Ok(estimate_damage(table, config, ad, rng)?.ratio)
}

/// Sequential estimate drawing every bucket from the injected generator, in table order.
pub fn estimate_damage<R: Rng + ?Sized>(
    table: &FrequencyTable,
    config: &SampleConfig,
    ad: AdChange,
    rng: &mut R,
) -> Result<DamageEstimate> {
    ad.validate()?;
    let mut buckets = Vec::new();
    for (hit, ring, weight) in table.iter_nonzero() {
        let coefficient = estimate_proc_coefficient(config, hit, ring, rng)?;
        debug!("bucket ({hit}, {ring}) weight={weight} coefficient={coefficient:.4}");
        buckets.push(BucketEstimate {
            hit,
            ring,
            weight,
            coefficient,
        });
    }
    fold_buckets(buckets, config, ad)
}

/// Buckets spread over `pool`. Each bucket seeds its own generator from `(seed, hit, ring)`,
/// so the estimate is identical for any worker count.
pub fn estimate_damage_parallel(
    table: &FrequencyTable,
    config: &SampleConfig,
    ad: AdChange,
    seed: u64,
    pool: &WorkerPool,
) -> Result<DamageEstimate> {
    ad.validate()?;
    let cells: Vec<(usize, usize, u64)> = table.iter_nonzero().collect();
    let buckets = pool.install(|| {
        cells
            .par_iter()
            .map(|&(hit, ring, weight)| -> Result<BucketEstimate> {
                let mut rng = SplitMix64::new(bucket_seed(seed, hit, ring));
                let coefficient = estimate_proc_coefficient(config, hit, ring, &mut rng)?;
                debug!("bucket ({hit}, {ring}) weight={weight} coefficient={coefficient:.4}");
                Ok(BucketEstimate {
                    hit,
                    ring,
                    weight,
                    coefficient,
                })
            })
            .collect::<Result<Vec<_>>>()
    })??;
    fold_buckets(buckets, config, ad)
}

fn fold_buckets(
    buckets: Vec<BucketEstimate>,
    config: &SampleConfig,
    ad: AdChange,
) -> Result<DamageEstimate> {
    let proc_chance = config.proc_chance();
    let mut old_total = 0.0;
    let mut new_total = 0.0;
    for bucket in &buckets {
        let weight = bucket.weight as f64;
        // +1 for the primary target on top of the `hit` other monsters.
        let direct = bucket.hit as f64 + 1.0;
        old_total += weight * (direct + proc_chance * ad.old_ad_pct * bucket.coefficient);
        new_total += weight * (direct + proc_chance * ad.new_ad_pct * bucket.coefficient);
    }
    if buckets.is_empty() || old_total <= 0.0 {
        return Err(AreaDamageError::DegenerateAggregate);
    }
    let ratio = new_total / old_total;
    info!(
        "aggregated {} bucket(s): old_total={old_total:.3} new_total={new_total:.3} ratio={ratio:.6}",
        buckets.len()
    );
    Ok(DamageEstimate {
        old_total,
        new_total,
        ratio,
        buckets,
    })
}
