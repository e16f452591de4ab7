//! Immutable simulation parameters shared by the sampler and the aggregator.

use serde::{Deserialize, Serialize};

use crate::error::{AreaDamageError, Result};

/// Trial count and geometric bounds for one run. Build with [SampleConfig::new] so the
/// invariants below hold for every value the core sees:
/// `sample_size > 0`, `0 < target_radius <= skill_radius`, `proc_radius > 0`,
/// `proc_chance` in `[0, 1]`, everything finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConfig {
    sample_size: usize,
    proc_chance: f64,
    proc_radius: f64,
    skill_radius: f64,
    target_radius: f64,
}

impl SampleConfig {
    pub fn new(
        sample_size: usize,
        proc_chance: f64,
        proc_radius: f64,
        skill_radius: f64,
        target_radius: f64,
    ) -> Result<Self> {
        if sample_size == 0 {
            return Err(AreaDamageError::invalid("sample_size must be greater than zero"));
        }
        if !proc_chance.is_finite() || !(0.0..=1.0).contains(&proc_chance) {
            return Err(AreaDamageError::invalid(format!(
                "proc_chance must be within [0, 1], got {proc_chance}"
            )));
        }
        for (name, value) in [
            ("proc_radius", proc_radius),
            ("skill_radius", skill_radius),
            ("target_radius", target_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AreaDamageError::invalid(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if target_radius > skill_radius {
            return Err(AreaDamageError::invalid(format!(
                "target_radius ({target_radius}) exceeds skill_radius ({skill_radius})"
            )));
        }
        Ok(Self {
            sample_size,
            proc_chance,
            proc_radius,
            skill_radius,
            target_radius,
        })
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn proc_chance(&self) -> f64 {
        self.proc_chance
    }

    pub fn proc_radius(&self) -> f64 {
        self.proc_radius
    }

    pub fn skill_radius(&self) -> f64 {
        self.skill_radius
    }

    pub fn target_radius(&self) -> f64 {
        self.target_radius
    }

    /// Squared-radius bounds of the skill annulus (hit monsters).
    pub(crate) fn skill_band(&self) -> (f64, f64) {
        (
            self.target_radius * self.target_radius,
            self.skill_radius * self.skill_radius,
        )
    }

    /// Squared-radius bounds of the ring annulus: one proc radius past the skill edge.
    pub(crate) fn ring_band(&self) -> (f64, f64) {
        let outer = self.skill_radius + self.proc_radius;
        (self.skill_radius * self.skill_radius, outer * outer)
    }
}

/// Area damage percentages being compared, as fractions (0.5 == 50%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdChange {
    pub old_ad_pct: f64,
    pub new_ad_pct: f64,
}

impl AdChange {
    pub fn new(old_ad_pct: f64, new_ad_pct: f64) -> Result<Self> {
        let change = Self {
            old_ad_pct,
            new_ad_pct,
        };
        change.validate()?;
        Ok(change)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("old_ad_pct", self.old_ad_pct), ("new_ad_pct", self.new_ad_pct)] {
            if !value.is_finite() || value < 0.0 {
                return Err(AreaDamageError::invalid(format!(
                    "{name} must be non-negative and finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}
