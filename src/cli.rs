use std::path::Path;

use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::config::ScenarioConfig;
use crate::data::store::{load_for_estimate, FrequencySource};
use crate::error::{AreaDamageError, Result};
use crate::sim::{
    estimate_damage_parallel, estimate_proc_coefficient_batched, DamageEstimate, SplitMix64,
    COEFFICIENT_BATCHES,
};

const USAGE: &str = "usage: areadmg <estimate|coefficient|merge> [--config PATH] [--seed N]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Estimate,
    Coefficient,
    Merge,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("estimate") => Some(Command::Estimate),
        Some("coefficient") => Some(Command::Coefficient),
        Some("merge") => Some(Command::Merge),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let outcome = match parse_command(args) {
        Some(Command::Estimate) => handle_estimate(args),
        Some(Command::Coefficient) => handle_coefficient(args),
        Some(Command::Merge) => handle_merge(args),
        None => {
            eprintln!("{USAGE}");
            return 2;
        }
    };
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

#[derive(Debug, Serialize)]
struct EstimateReport<'a> {
    generated_at: String,
    seed: u64,
    scenario: &'a ScenarioConfig,
    percent_increase: f64,
    estimate: &'a DamageEstimate,
}

fn handle_estimate(args: &[String]) -> Result<i32> {
    let scenario = load_scenario(args)?;
    let sample = scenario.sample_config()?;
    let ad = scenario.ad_change()?;
    let seed = resolve_seed(args, &scenario)?;
    let as_json = has_flag(args, "--json");

    let store = scenario.store();
    let table = load_for_estimate(&store, has_flag(args, "--merge"))?;
    let estimate = estimate_damage_parallel(&table, &sample, ad, seed, &scenario.worker_pool())?;

    if as_json {
        let report = EstimateReport {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            seed,
            scenario: &scenario,
            percent_increase: estimate.percent_increase(),
            estimate: &estimate,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize estimate: {err}");
                return Ok(1);
            }
        }
    } else {
        println!("Sample size: {}", scenario.sample_size);
        println!("AD chance: {}", scenario.proc_chance);
        println!("Current AD: {}%", scenario.old_ad_pct * 100.0);
        println!("New AD: {}%", scenario.new_ad_pct * 100.0);
        println!("Skill radius: {} yards", scenario.skill_radius);
        println!("Target radius: {} yards", scenario.target_radius);
        println!("Data file: {}", scenario.data.table_path.display());
        println!("Seed: {seed}");
        println!();
        println!(
            "Expected damage increase : {:.4}%",
            estimate.percent_increase()
        );
    }
    Ok(0)
}

fn handle_coefficient(args: &[String]) -> Result<i32> {
    let (Some(hit), Some(ring)) = (parse_count(args.get(2)), parse_count(args.get(3))) else {
        eprintln!("usage: areadmg coefficient <hit> <ring> [--config PATH] [--seed N]");
        return Ok(2);
    };
    let scenario = load_scenario(args)?;
    let sample = scenario.sample_config()?;
    let seed = resolve_seed(args, &scenario)?;
    let coefficient = scenario.worker_pool().install(|| {
        estimate_proc_coefficient_batched(&sample, hit, ring, seed, COEFFICIENT_BATCHES)
    })??;
    println!("hit\tring\tseed\tcoefficient");
    println!("{hit}\t{ring}\t{seed}\t{coefficient:.6}");
    Ok(0)
}

fn handle_merge(args: &[String]) -> Result<i32> {
    let scenario = load_scenario(args)?;
    let store = scenario.store();
    let table = store.load_frequency_table()?;
    let observations = store.load_observations()?;
    let merged = store.merge_and_persist(&table, &observations)?;
    println!(
        "merge complete: observations={}, total={}, table='{}'",
        observations.len(),
        merged.total(),
        store.table_path.display()
    );
    Ok(0)
}

fn load_scenario(args: &[String]) -> Result<ScenarioConfig> {
    ScenarioConfig::resolve(flag_value(args, "--config").map(Path::new))
}

/// `--seed` beats the config file; with neither, draw one from OS entropy and log it.
fn resolve_seed(args: &[String], scenario: &ScenarioConfig) -> Result<u64> {
    if let Some(raw) = flag_value(args, "--seed") {
        match raw.parse::<u64>() {
            Ok(seed) => return Ok(seed),
            Err(_) => warn!("invalid seed '{raw}', ignoring"),
        }
    }
    if let Some(seed) = scenario.seed {
        return Ok(seed);
    }
    let seed = SplitMix64::entropy_seed().map_err(|err| {
        AreaDamageError::Config(format!("no seed configured and OS entropy unavailable: {err}"))
    })?;
    info!("using entropy seed {seed}; pass --seed {seed} to reproduce");
    Ok(seed)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|idx| args.get(idx + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn parse_count(raw: Option<&String>) -> Option<usize> {
    raw.and_then(|value| value.parse::<usize>().ok())
}
