//! Domain models: activities, steps, lesson vocabulary, answers, and results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Activity kind tag. Challenges declare dimensions; standard activities don't.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
  Standard,
  Challenge,
}
impl Default for ActivityKind {
  fn default() -> Self { ActivityKind::Standard }
}

/// One playable unit: an ordered list of steps plus identifying metadata.
/// Immutable once loaded into a run.
#[derive(Clone, Debug)]
pub struct Activity {
  pub id: String,
  pub title: String,
  pub kind: ActivityKind,
  pub lesson_id: String,
  pub steps: Vec<Step>,
  /// Author-defined initial dimension values. Non-empty only for challenges.
  pub dimensions: HashMap<String, f64>,
}

impl Activity {
  /// A challenge is identified solely by having a non-empty dimension set.
  pub fn is_challenge(&self) -> bool {
    !self.dimensions.is_empty()
  }
}

/// A single exercise unit. Read-only during a run.
#[derive(Clone, Debug)]
pub struct Step {
  pub id: String,
  pub position: u32,
  pub content: StepContent,
  /// Linked vocabulary entity for `vocabulary` steps.
  pub word_id: Option<String>,
  /// Linked sentence entity for `reading`/`listening` steps.
  pub sentence_id: Option<String>,
}

impl Step {
  pub fn kind(&self) -> StepKind {
    self.content.kind()
  }
}

/// Discriminant of a step's content/answer shape.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StepKind {
  Static,
  MultipleChoice,
  FillBlank,
  MatchColumns,
  SortOrder,
  SelectImage,
  Vocabulary,
  Reading,
  Listening,
}

/// Authored step content, one constructor per step kind.
/// Parsed and validated by the content contract (`content.rs`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StepContent {
  Static {
    #[serde(flatten)]
    variant: StaticVariant,
  },
  MultipleChoice { prompt: String, options: Vec<ChoiceOption> },
  FillBlank { text: String, answers: Vec<String> },
  MatchColumns { pairs: Vec<MatchPair> },
  SortOrder { prompt: String, items: Vec<String> },
  SelectImage { prompt: String, options: Vec<ImageOption> },
  Vocabulary,
  Reading,
  Listening,
}

impl StepContent {
  pub fn kind(&self) -> StepKind {
    match self {
      StepContent::Static { .. } => StepKind::Static,
      StepContent::MultipleChoice { .. } => StepKind::MultipleChoice,
      StepContent::FillBlank { .. } => StepKind::FillBlank,
      StepContent::MatchColumns { .. } => StepKind::MatchColumns,
      StepContent::SortOrder { .. } => StepKind::SortOrder,
      StepContent::SelectImage { .. } => StepKind::SelectImage,
      StepContent::Vocabulary => StepKind::Vocabulary,
      StepContent::Reading => StepKind::Reading,
      StepContent::Listening => StepKind::Listening,
    }
  }
}

/// Sub-shapes of a static (non-checkable) step. Matched exhaustively;
/// an unknown variant is malformed content, not a crash.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "variant", rename_all = "camelCase")]
pub enum StaticVariant {
  Text { body: String },
  GrammarExample { example: String, explanation: String },
  GrammarRule { rule: String, examples: Vec<String> },
}

/// One selectable option of a multiple-choice step.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
  pub text: String,
  #[serde(default)]
  pub is_correct: bool,
  #[serde(default)]
  pub feedback: Option<String>,
  /// Authored dimension deltas, applied when this option is picked.
  #[serde(default)]
  pub effects: HashMap<String, f64>,
}

/// One selectable option of a select-image step.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageOption {
  pub image: String,
  #[serde(default)]
  pub is_correct: bool,
  #[serde(default)]
  pub feedback: Option<String>,
  #[serde(default)]
  pub effects: HashMap<String, f64>,
}

/// A left/right pairing of a match-columns step. Also reused as the shape
/// of the learner's submitted pairs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MatchPair {
  pub left: String,
  pub right: String,
}

/// Lesson vocabulary item: also the pool distractors are drawn from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Word {
  pub id: String,
  pub word: String,
  pub translation: String,
  #[serde(default)]
  pub alt_translations: Vec<String>,
  #[serde(default)]
  pub romanization: Option<String>,
  #[serde(default)]
  pub audio: Option<String>,
}

/// Lesson sentence: source text plus translation, used by reading/listening steps.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
  pub id: String,
  pub text: String,
  pub translation: String,
  #[serde(default)]
  pub romanization: Option<String>,
  #[serde(default)]
  pub audio: Option<String>,
}

/// The word/sentence pools scoped to one lesson.
#[derive(Clone, Debug, Default)]
pub struct LessonPool {
  pub words: Vec<Word>,
  pub sentences: Vec<Sentence>,
}

impl LessonPool {
  pub fn word(&self, id: &str) -> Option<&Word> {
    self.words.iter().find(|w| w.id == id)
  }
  pub fn sentence(&self, id: &str) -> Option<&Sentence> {
    self.sentences.iter().find(|s| s.id == id)
  }
}

/// A submitted answer, one shape per checkable step kind.
/// Exactly one may be stored per step id at a time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SelectedAnswer {
  #[serde(rename_all = "camelCase")]
  MultipleChoice { selected_index: usize },
  #[serde(rename_all = "camelCase")]
  FillBlank { user_answers: Vec<String> },
  #[serde(rename_all = "camelCase")]
  MatchColumns { user_pairs: Vec<MatchPair>, mistakes: u32 },
  #[serde(rename_all = "camelCase")]
  SortOrder { user_order: Vec<String> },
  #[serde(rename_all = "camelCase")]
  SelectImage { selected_index: usize },
  #[serde(rename_all = "camelCase")]
  Vocabulary { selected_word_id: String },
  #[serde(rename_all = "camelCase")]
  Reading { arranged_words: Vec<String> },
  #[serde(rename_all = "camelCase")]
  Listening { arranged_words: Vec<String> },
}

/// Per-step timing captured when an answer is checked (analytics payload).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepTiming {
  /// Epoch milliseconds at which the answer was checked.
  pub answered_at: u64,
  /// Seconds spent on the step before checking.
  pub duration_seconds: f64,
  /// 0-6, 0 = Sunday (UTC).
  pub day_of_week: u8,
  /// 0-23 (UTC).
  pub hour_of_day: u8,
}

impl StepTiming {
  pub fn at(answered_at_ms: u64, entered_at_ms: u64) -> Self {
    Self {
      answered_at: answered_at_ms,
      duration_seconds: answered_at_ms.saturating_sub(entered_at_ms) as f64 / 1000.0,
      day_of_week: crate::util::day_of_week_utc(answered_at_ms),
      hour_of_day: crate::util::hour_of_day_utc(answered_at_ms),
    }
  }
}

/// The outcome of checking a stored answer against a step.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
  pub is_correct: bool,
  pub feedback: Option<String>,
  /// Dimension deltas applied to the run when this result was recorded.
  pub effects: HashMap<String, f64>,
  /// The answer that produced this result.
  pub answer: SelectedAnswer,
  pub timing: StepTiming,
}
