pub mod aggregator;
pub mod geometry;
pub mod params;
pub mod rng;
pub mod sampler;

pub use aggregator::{
    estimate_damage, estimate_damage_parallel, expected_damage_ratio, BucketEstimate,
    DamageEstimate,
};
pub use geometry::GeometryPoint;
pub use params::{AdChange, SampleConfig};
pub use rng::{bucket_seed, SplitMix64};
pub use sampler::{
    estimate_proc_coefficient, estimate_proc_coefficient_batched, sample_histogram,
    ProcHistogram, COEFFICIENT_BATCHES,
};
