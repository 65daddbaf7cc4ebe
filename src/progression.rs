//! Client for the external progression service that receives completed runs
//! and hands back reward/level data.
//!
//! We only call one endpoint and never retry: a failed report is recorded as
//! a degraded completion, not replayed. Calls are instrumented and log
//! latencies and response sizes, never the bearer token.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::domain::{SelectedAnswer, StepTiming};
use crate::util::trunc_for_log;

/// Everything the engine accumulated over one run, sent exactly once at the
/// transition that first reaches the completed phase.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionInput {
  pub activity_id: String,
  pub answers: HashMap<String, SelectedAnswer>,
  pub dimensions: HashMap<String, f64>,
  /// Epoch milliseconds at which the run started.
  pub started_at: u64,
  pub step_timings: HashMap<String, StepTiming>,
}

/// External progression tier derived from cumulative brain power.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BeltLevelResult {
  pub belt: String,
  pub level: u32,
  pub progress: f64,
}

impl Default for BeltLevelResult {
  fn default() -> Self {
    Self { belt: "white".into(), level: 1, progress: 0.0 }
  }
}

/// What the progression service said about a completed run. The engine
/// renders distinct UI for each branch; `Unauthenticated` is not an error,
/// it is a first-class response offering sign-in.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionResult {
  #[serde(rename_all = "camelCase")]
  Success { belt: BeltLevelResult, brain_power: f64, energy_delta: f64, new_total_bp: f64 },
  Error,
  Unauthenticated,
}

#[derive(Clone)]
pub struct Progression {
  pub client: reqwest::Client,
  pub base_url: String,
  pub api_token: String,
}

impl Progression {
  /// Construct the client if we find PROGRESSION_BASE_URL; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("PROGRESSION_BASE_URL").ok()?;
    let api_token = std::env::var("PROGRESSION_API_TOKEN").unwrap_or_default();

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, base_url, api_token })
  }

  /// Report one completed run. HTTP 401 is mapped to the Unauthenticated
  /// branch; any other failure is an Err the caller records as a degraded
  /// completion.
  #[instrument(level = "info", skip(self, input), fields(activity = %input.activity_id, answers = input.answers.len()))]
  pub async fn report_completion(&self, input: &CompletionInput) -> Result<CompletionResult, String> {
    let url = format!("{}/v1/completions", self.base_url);

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "kata-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_token))
      .json(input)
      .send()
      .await
      .map_err(|e| e.to_string())?;

    let status = res.status();
    if status.as_u16() == 401 {
      info!(target: "activity", activity = %input.activity_id, "Progression service rejected the session token");
      return Ok(CompletionResult::Unauthenticated);
    }
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      return Err(format!("progression HTTP {}: {}", status, trunc_for_log(&body, 300)));
    }

    let result: CompletionResult = res.json().await.map_err(|e| e.to_string())?;
    if let CompletionResult::Success { brain_power, energy_delta, .. } = &result {
      info!(target: "activity", activity = %input.activity_id, brain_power, energy_delta, "Completion acknowledged");
    }
    Ok(result)
  }
}
