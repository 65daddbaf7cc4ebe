//! Answer checking: pure per-kind validation of a submitted answer against
//! a step's authored content.
//!
//! `check` returns `None` when the pair isn't checkable at all (answer shape
//! doesn't match the step, an index is out of range, a linked entity is
//! gone). The caller treats that as a no-op, never as a wrong answer.

use std::collections::HashMap;

use crate::domain::{LessonPool, SelectedAnswer, Step, StepContent};
use crate::util::{eq_fold, tokenize};

/// What checking produced: correctness, feedback for the learner, and the
/// dimension deltas to apply.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckOutcome {
  pub is_correct: bool,
  pub feedback: Option<String>,
  pub effects: HashMap<String, f64>,
}

impl CheckOutcome {
  fn plain(is_correct: bool) -> Self {
    Self { is_correct, feedback: None, effects: HashMap::new() }
  }
}

/// Check `answer` against `step`. Pure given the step, the answer, and the
/// lesson pools the step's entities live in.
pub fn check(step: &Step, answer: &SelectedAnswer, pool: &LessonPool) -> Option<CheckOutcome> {
  match (&step.content, answer) {
    (StepContent::MultipleChoice { options, .. }, SelectedAnswer::MultipleChoice { selected_index }) => {
      let opt = options.get(*selected_index)?;
      Some(CheckOutcome { is_correct: opt.is_correct, feedback: opt.feedback.clone(), effects: opt.effects.clone() })
    }

    (StepContent::SelectImage { options, .. }, SelectedAnswer::SelectImage { selected_index }) => {
      let opt = options.get(*selected_index)?;
      Some(CheckOutcome { is_correct: opt.is_correct, feedback: opt.feedback.clone(), effects: opt.effects.clone() })
    }

    (StepContent::FillBlank { answers, .. }, SelectedAnswer::FillBlank { user_answers }) => {
      // All-or-nothing, positional, case-insensitive, whitespace-trimmed.
      let is_correct = user_answers.len() == answers.len()
        && answers.iter().zip(user_answers).all(|(expected, got)| eq_fold(expected.trim(), got.trim()));
      Some(CheckOutcome::plain(is_correct))
    }

    (StepContent::SortOrder { items, .. }, SelectedAnswer::SortOrder { user_order }) => {
      let is_correct = user_order.len() == items.len()
        && items.iter().zip(user_order).all(|(expected, got)| expected == got);
      Some(CheckOutcome::plain(is_correct))
    }

    (StepContent::MatchColumns { .. }, SelectedAnswer::MatchColumns { mistakes, .. }) => {
      // Correctness was tracked continuously during the interaction; the
      // check just records the final mistake count.
      Some(CheckOutcome::plain(*mistakes == 0))
    }

    (StepContent::Vocabulary, SelectedAnswer::Vocabulary { selected_word_id }) => {
      let word_id = step.word_id.as_deref()?;
      let is_correct = selected_word_id == word_id;
      let feedback = pool.word(word_id).map(|w| format!("{} — {}", w.word, w.translation));
      Some(CheckOutcome { is_correct, feedback, effects: HashMap::new() })
    }

    (StepContent::Reading, SelectedAnswer::Reading { arranged_words }) => {
      let sentence = step.sentence_id.as_deref().and_then(|id| pool.sentence(id))?;
      Some(CheckOutcome::plain(sequences_match(arranged_words, &tokenize(&sentence.text))))
    }

    (StepContent::Listening, SelectedAnswer::Listening { arranged_words }) => {
      let sentence = step.sentence_id.as_deref().and_then(|id| pool.sentence(id))?;
      Some(CheckOutcome::plain(sequences_match(arranged_words, &tokenize(&sentence.translation))))
    }

    // Static steps are never checked; mismatched answer shapes aren't checkable.
    _ => None,
  }
}

/// Element-for-element, in order. Case-insensitive because word-bank tiles
/// are deduplicated case-insensitively, so the learner may place a tile
/// whose casing differs from the token at that position.
fn sequences_match(arranged: &[String], correct: &[String]) -> bool {
  arranged.len() == correct.len() && arranged.iter().zip(correct).all(|(a, c)| eq_fold(a, c))
}
