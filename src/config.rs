//! Loading the lesson bank (word/sentence pools + authored activities) from TOML.
//!
//! See `LessonBankConfig` for the expected schema. Individual entries that
//! fail validation are skipped with a log; a partially-broken bank still
//! serves whatever parsed.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{error, info};

use crate::content::RawStep;
use crate::domain::{ActivityKind, Sentence, Word};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct LessonBankConfig {
  #[serde(default)]
  pub lessons: Vec<LessonCfg>,
  #[serde(default)]
  pub activities: Vec<ActivityCfg>,
}

/// One lesson's pools as authored in TOML.
#[derive(Clone, Debug, Deserialize)]
pub struct LessonCfg {
  pub id: String,
  #[serde(default)]
  pub words: Vec<Word>,
  #[serde(default)]
  pub sentences: Vec<Sentence>,
}

/// Activity entry accepted in TOML configuration. Steps stay loosely typed
/// here; the content contract validates them when the bank is built.
#[derive(Clone, Debug, Deserialize)]
pub struct ActivityCfg {
  #[serde(default)]
  pub id: Option<String>,
  pub title: String,
  #[serde(default)]
  pub kind: Option<ActivityKind>,
  pub lesson: String,
  /// Initial dimension values. Non-empty marks the activity as a challenge.
  #[serde(default)]
  pub dimensions: HashMap<String, f64>,
  #[serde(default)]
  pub steps: Vec<toml::Value>,
}

impl ActivityCfg {
  /// The effective kind: an explicit tag wins, otherwise declared dimensions decide.
  pub fn effective_kind(&self) -> ActivityKind {
    self.kind.unwrap_or(if self.dimensions.is_empty() {
      ActivityKind::Standard
    } else {
      ActivityKind::Challenge
    })
  }

  /// Convert the loosely-typed TOML steps into the content contract's raw
  /// form. Steps that don't even have the envelope shape are skipped here;
  /// content validation happens later in `content::build_steps`.
  pub fn raw_steps(&self, activity_id: &str) -> Vec<RawStep> {
    let mut out = Vec::with_capacity(self.steps.len());
    for (idx, value) in self.steps.iter().enumerate() {
      let as_json = match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => {
          error!(target: "activity", activity = %activity_id, step_index = idx, error = %e, "Skipping unreadable step entry");
          continue;
        }
      };
      match serde_json::from_value::<RawStep>(as_json) {
        Ok(raw) => out.push(raw),
        Err(e) => {
          error!(target: "activity", activity = %activity_id, step_index = idx, error = %e, "Skipping step without a valid envelope");
        }
      }
    }
    out
  }
}

/// Parse a TOML lesson bank. Pure; used by both the env loader and tests.
pub fn parse_lesson_bank(s: &str) -> Result<LessonBankConfig, String> {
  toml::from_str::<LessonBankConfig>(s).map_err(|e| e.to_string())
}

/// Attempt to load the bank from LESSON_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_lesson_bank_from_env() -> Option<LessonBankConfig> {
  let path = std::env::var("LESSON_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_lesson_bank(&s) {
      Ok(cfg) => {
        info!(target: "kata_backend", %path, lessons = cfg.lessons.len(), activities = cfg.activities.len(), "Loaded lesson bank (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "kata_backend", %path, error = %e, "Failed to parse TOML lesson bank");
        None
      }
    },
    Err(e) => {
      error!(target: "kata_backend", %path, error = %e, "Failed to read TOML lesson bank file");
      None
    }
  }
}
