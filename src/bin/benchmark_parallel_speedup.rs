//! Run the aggregate estimate once on one worker and once on all cores, then print
//! timings and speedup.
//!
//! Usage: cargo run --release --bin benchmark_parallel_speedup

use std::time::Instant;

use areadmg::data::FrequencyTable;
use areadmg::parallel::WorkerPool;
use areadmg::sim::{estimate_damage_parallel, AdChange, SampleConfig};
use areadmg::Result;

fn main() -> Result<()> {
    let seed = 12345u64;
    let config = SampleConfig::new(20_000, 0.2, 10.0, 10.0, 1.0)?;
    let ad = AdChange::new(0.5, 0.7)?;
    let table = FrequencyTable::from_counts(
        (0..11).flat_map(|hit| (0..11).map(move |ring| (hit, ring, 1 + (hit + ring) as u64))),
    )?;

    let buckets = table.iter_nonzero().count();
    println!(
        "Aggregate: {} buckets x {} trials",
        buckets,
        config.sample_size()
    );
    println!();

    let t0 = Instant::now();
    let single = estimate_damage_parallel(&table, &config, ad, seed, &WorkerPool::with_workers(1))?;
    let single_ms = t0.elapsed().as_secs_f64() * 1000.0;
    println!("1 worker:    {:.2} ms", single_ms);

    let t0 = Instant::now();
    let all = estimate_damage_parallel(&table, &config, ad, seed, &WorkerPool::default_workers())?;
    let all_ms = t0.elapsed().as_secs_f64() * 1000.0;
    println!("All cores:   {:.2} ms", all_ms);

    println!();
    println!("Speedup:     {:.2}x", single_ms / all_ms);

    if single != all {
        eprintln!("estimates differ between worker counts");
        std::process::exit(1);
    }
    println!(
        "(Estimates match: {:.4}% increase)",
        all.percent_increase()
    );
    Ok(())
}
