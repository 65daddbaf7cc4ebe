//! Reward computation at run completion: energy deltas and brain power.
//!
//! Both entry points are pure. The progression service normally owns the
//! authoritative numbers; these mirror its arithmetic so the app can show
//! rewards offline (and so challenge outcomes are decidable locally).

use std::collections::HashMap;

use crate::dimensions::DimensionInventory;
use crate::domain::StepResult;

pub const ENERGY_PER_CORRECT: f64 = 0.25;
pub const ENERGY_PER_INCORRECT: f64 = -0.1;
/// Flat bonus for activities with zero checkable steps (pure reading).
pub const STATIC_ACTIVITY_ENERGY: f64 = 0.5;
pub const BRAIN_POWER_PER_ACTIVITY: f64 = 10.0;
pub const BRAIN_POWER_PER_CHALLENGE: f64 = 25.0;
pub const CHALLENGE_FAILURE_ENERGY: f64 = -1.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ActivityScore {
  pub correct_count: usize,
  pub incorrect_count: usize,
  pub energy_delta: f64,
  pub brain_power: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChallengeScore {
  pub energy_delta: f64,
  pub brain_power: f64,
}

/// Score a completed non-challenge run from its step results.
pub fn compute_score(results: &HashMap<String, StepResult>) -> ActivityScore {
  let correct_count = results.values().filter(|r| r.is_correct).count();
  let incorrect_count = results.len() - correct_count;

  let energy_delta = if results.is_empty() {
    STATIC_ACTIVITY_ENERGY
  } else {
    correct_count as f64 * ENERGY_PER_CORRECT + incorrect_count as f64 * ENERGY_PER_INCORRECT
  };

  ActivityScore {
    correct_count,
    incorrect_count,
    energy_delta: round2(energy_delta),
    brain_power: BRAIN_POWER_PER_ACTIVITY,
  }
}

/// Score a completed challenge run. On success the energy delta is the sum
/// of the surviving positive dimensions, floored at 1.
pub fn compute_challenge_score(dimensions: &DimensionInventory, is_successful: bool) -> ChallengeScore {
  if is_successful {
    let positive_sum: f64 = dimensions.values().filter(|v| **v > 0.0).sum();
    ChallengeScore {
      energy_delta: round2(positive_sum.max(1.0)),
      brain_power: BRAIN_POWER_PER_CHALLENGE,
    }
  } else {
    ChallengeScore {
      energy_delta: CHALLENGE_FAILURE_ENERGY,
      brain_power: BRAIN_POWER_PER_ACTIVITY,
    }
  }
}

fn round2(v: f64) -> f64 {
  (v * 100.0).round() / 100.0
}
