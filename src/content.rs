//! Step content contract: parsing and validating untrusted stored step content.
//!
//! Authored activities arrive as raw `kind` strings plus loosely-typed content
//! blobs. This module maps each kind to its concrete schema and rejects
//! anything that doesn't parse. Steps with unparseable content are dropped
//! from the activity at load time (logged, not surfaced to the learner), so a
//! partially-broken activity is still playable.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::domain::{LessonPool, Step, StepContent, StepKind};

/// Why a raw step was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentError {
  UnsupportedKind(String),
  MalformedContent(String),
}

impl fmt::Display for ContentError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ContentError::UnsupportedKind(k) => write!(f, "unsupported step kind '{}'", k),
      ContentError::MalformedContent(m) => write!(f, "malformed step content: {}", m),
    }
  }
}

const KNOWN_KINDS: &[&str] = &[
  "static",
  "multipleChoice",
  "fillBlank",
  "matchColumns",
  "sortOrder",
  "selectImage",
  "vocabulary",
  "reading",
  "listening",
];

/// A step as authored in a lesson bank, before validation.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStep {
  #[serde(default)]
  pub id: Option<String>,
  pub kind: String,
  #[serde(default)]
  pub position: Option<u32>,
  #[serde(default)]
  pub content: Value,
  #[serde(default)]
  pub word_id: Option<String>,
  #[serde(default)]
  pub sentence_id: Option<String>,
}

/// Parse one raw content blob against the schema for `kind`.
pub fn parse_step_content(kind: &str, content: Value) -> Result<StepContent, ContentError> {
  if !KNOWN_KINDS.contains(&kind) {
    return Err(ContentError::UnsupportedKind(kind.to_string()));
  }

  // Entity-linked kinds carry no inline payload; the link is on the step.
  let parsed = match kind {
    "vocabulary" => StepContent::Vocabulary,
    "reading" => StepContent::Reading,
    "listening" => StepContent::Listening,
    _ => {
      let mut obj = match content {
        Value::Object(m) => m,
        _ => return Err(ContentError::MalformedContent("content must be an object".into())),
      };
      obj.insert("kind".into(), Value::String(kind.to_string()));
      serde_json::from_value::<StepContent>(Value::Object(obj))
        .map_err(|e| ContentError::MalformedContent(e.to_string()))?
    }
  };

  validate_content(&parsed)?;
  Ok(parsed)
}

/// Semantic rules beyond shape: these catch content that parses but cannot
/// be rendered or checked meaningfully.
fn validate_content(content: &StepContent) -> Result<(), ContentError> {
  match content {
    StepContent::MultipleChoice { options, .. } => {
      if options.len() < 2 {
        return Err(ContentError::MalformedContent("multipleChoice needs at least 2 options".into()));
      }
      let correct = options.iter().filter(|o| o.is_correct).count();
      if correct != 1 {
        return Err(ContentError::MalformedContent(format!(
          "multipleChoice must flag exactly one correct option, found {}", correct
        )));
      }
    }
    StepContent::SelectImage { options, .. } => {
      if options.len() < 2 {
        return Err(ContentError::MalformedContent("selectImage needs at least 2 options".into()));
      }
      let correct = options.iter().filter(|o| o.is_correct).count();
      if correct != 1 {
        return Err(ContentError::MalformedContent(format!(
          "selectImage must flag exactly one correct option, found {}", correct
        )));
      }
    }
    StepContent::FillBlank { answers, .. } => {
      if answers.is_empty() {
        return Err(ContentError::MalformedContent("fillBlank needs at least 1 answer".into()));
      }
    }
    StepContent::SortOrder { items, .. } => {
      if items.len() < 2 {
        return Err(ContentError::MalformedContent("sortOrder needs at least 2 items".into()));
      }
    }
    StepContent::MatchColumns { pairs } => {
      if pairs.is_empty() {
        return Err(ContentError::MalformedContent("matchColumns needs at least 1 pair".into()));
      }
    }
    // Static variants are matched exhaustively by the parser itself;
    // vocabulary/reading/listening links are checked against the pools below.
    _ => {}
  }
  Ok(())
}

/// Build the playable step list for an activity: parse every raw step, check
/// entity links against the lesson pools, drop whatever fails, and renumber
/// positions so the survivors stay dense and ordered.
pub fn build_steps(activity_id: &str, raw_steps: Vec<RawStep>, pool: &LessonPool) -> Vec<Step> {
  let mut ordered = raw_steps;
  ordered.sort_by_key(|r| r.position.unwrap_or(u32::MAX));

  let mut steps: Vec<Step> = Vec::with_capacity(ordered.len());
  for (idx, raw) in ordered.into_iter().enumerate() {
    let step_id = raw.id.clone().unwrap_or_else(|| format!("{}-step-{}", activity_id, idx + 1));
    let content = match parse_step_content(&raw.kind, raw.content) {
      Ok(c) => c,
      Err(e) => {
        error!(target: "activity", activity = %activity_id, step = %step_id, error = %e, "Dropping step with invalid content");
        continue;
      }
    };

    // Entity-linked kinds must reference something the lesson actually has.
    match content.kind() {
      StepKind::Vocabulary => {
        let ok = raw.word_id.as_deref().map(|id| pool.word(id).is_some()).unwrap_or(false);
        if !ok {
          error!(target: "activity", activity = %activity_id, step = %step_id, "Dropping vocabulary step with missing word link");
          continue;
        }
      }
      StepKind::Reading | StepKind::Listening => {
        let ok = raw.sentence_id.as_deref().map(|id| pool.sentence(id).is_some()).unwrap_or(false);
        if !ok {
          error!(target: "activity", activity = %activity_id, step = %step_id, "Dropping step with missing sentence link");
          continue;
        }
      }
      _ => {}
    }

    steps.push(Step {
      id: step_id,
      position: steps.len() as u32,
      content,
      word_id: raw.word_id,
      sentence_id: raw.sentence_id,
    });
  }
  steps
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Sentence, Word};
  use serde_json::json;

  fn pool() -> LessonPool {
    LessonPool {
      words: vec![Word {
        id: "w1".into(),
        word: "hola".into(),
        translation: "hello".into(),
        alt_translations: vec![],
        romanization: None,
        audio: None,
      }],
      sentences: vec![Sentence {
        id: "s1".into(),
        text: "el gato bebe agua".into(),
        translation: "the cat drinks water".into(),
        romanization: None,
        audio: None,
      }],
    }
  }

  #[test]
  fn unknown_kind_is_rejected() {
    let err = parse_step_content("crossword", json!({})).expect_err("must fail");
    assert_eq!(err, ContentError::UnsupportedKind("crossword".into()));
  }

  #[test]
  fn static_variant_is_matched_exhaustively() {
    let ok = parse_step_content("static", json!({"variant": "text", "body": "Welcome"}));
    assert!(ok.is_ok());
    let err = parse_step_content("static", json!({"variant": "video", "url": "x"}));
    assert!(matches!(err, Err(ContentError::MalformedContent(_))));
  }

  #[test]
  fn multiple_choice_requires_exactly_one_correct() {
    let two_correct = json!({
      "prompt": "Pick one",
      "options": [
        {"text": "a", "isCorrect": true},
        {"text": "b", "isCorrect": true}
      ]
    });
    let err = parse_step_content("multipleChoice", two_correct).expect_err("must fail");
    assert!(matches!(err, ContentError::MalformedContent(_)));
  }

  #[test]
  fn build_steps_drops_broken_and_renumbers() {
    let raw = vec![
      RawStep {
        id: Some("a".into()),
        kind: "static".into(),
        position: Some(0),
        content: json!({"variant": "text", "body": "intro"}),
        word_id: None,
        sentence_id: None,
      },
      RawStep {
        id: Some("b".into()),
        kind: "fillBlank".into(),
        position: Some(1),
        content: json!({"text": "___", "answers": []}),
        word_id: None,
        sentence_id: None,
      },
      RawStep {
        id: Some("c".into()),
        kind: "reading".into(),
        position: Some(2),
        content: json!({}),
        word_id: None,
        sentence_id: Some("s1".into()),
      },
    ];
    let steps = build_steps("act", raw, &pool());
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].id, "a");
    assert_eq!(steps[1].id, "c");
    assert_eq!(steps[1].position, 1);
  }

  #[test]
  fn vocabulary_step_needs_a_resolvable_word() {
    let raw = vec![RawStep {
      id: Some("v".into()),
      kind: "vocabulary".into(),
      position: None,
      content: Value::Null,
      word_id: Some("missing".into()),
      sentence_id: None,
    }];
    assert!(build_steps("act", raw, &pool()).is_empty());
  }
}
