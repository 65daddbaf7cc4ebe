//! Builds the option sets presented alongside a step: vocabulary distractors
//! and reading/listening word banks, drawn from the lesson pools.
//!
//! Assembly happens once per run so the learner sees a stable shuffle. The
//! shuffle never drops or duplicates an element; dedup is case-insensitive
//! so a distractor can never shadow a correct token.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::domain::{LessonPool, Step, StepKind, Word};
use crate::util::{eq_fold, tokenize};

/// Distractor words offered next to the correct word on vocabulary steps.
pub const VOCAB_DISTRACTORS: usize = 3;
/// Extra tokens mixed into a reading/listening word bank.
pub const BANK_DISTRACTORS: usize = 4;

/// The rendered option set for one step.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AssembledOptions {
  /// Steps that need no option pool (choices are authored inline).
  None,
  /// Vocabulary: the correct word plus distractors, shuffled.
  WordChoices { words: Vec<Word> },
  /// Reading/listening: the token bank the learner arranges from, shuffled.
  WordBank { tokens: Vec<String> },
}

/// Assemble the option set for `step` from the lesson pools.
pub fn assemble<R: Rng>(step: &Step, pool: &LessonPool, rng: &mut R) -> AssembledOptions {
  match step.kind() {
    StepKind::Vocabulary => assemble_word_choices(step, pool, rng),
    StepKind::Reading | StepKind::Listening => assemble_word_bank(step, pool, rng),
    _ => AssembledOptions::None,
  }
}

fn assemble_word_choices<R: Rng>(step: &Step, pool: &LessonPool, rng: &mut R) -> AssembledOptions {
  let correct = match step.word_id.as_deref().and_then(|id| pool.word(id)) {
    Some(w) => w.clone(),
    None => return AssembledOptions::None,
  };

  let mut words: Vec<Word> = vec![correct];
  for candidate in &pool.words {
    if words.len() > VOCAB_DISTRACTORS {
      break;
    }
    if candidate.id == words[0].id {
      continue;
    }
    // Distinct by id is not enough: a pool duplicate of the correct word
    // (same text, different id) would render as two identical options.
    if words.iter().any(|w| eq_fold(&w.word, &candidate.word)) {
      continue;
    }
    words.push(candidate.clone());
  }

  words.shuffle(rng);
  AssembledOptions::WordChoices { words }
}

fn assemble_word_bank<R: Rng>(step: &Step, pool: &LessonPool, rng: &mut R) -> AssembledOptions {
  let sentence = match step.sentence_id.as_deref().and_then(|id| pool.sentence(id)) {
    Some(s) => s,
    None => return AssembledOptions::None,
  };

  // Reading arranges the source text; listening arranges the translation.
  let listening = step.kind() == StepKind::Listening;
  let source = if listening { &sentence.translation } else { &sentence.text };

  // Each correct token appears exactly once in the bank.
  let mut tokens: Vec<String> = Vec::new();
  for tok in tokenize(source) {
    if !tokens.iter().any(|t| eq_fold(t, &tok)) {
      tokens.push(tok);
    }
  }

  let mut added = 0usize;
  for word in &pool.words {
    if added == BANK_DISTRACTORS {
      break;
    }
    let distractor = if listening { word.translation.clone() } else { word.word.clone() };
    if distractor.trim().is_empty() {
      continue;
    }
    if tokens.iter().any(|t| eq_fold(t, &distractor)) {
      continue;
    }
    tokens.push(distractor);
    added += 1;
  }

  tokens.shuffle(rng);
  AssembledOptions::WordBank { tokens }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Sentence, StepContent};
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn word(id: &str, word: &str, translation: &str) -> Word {
    Word {
      id: id.into(),
      word: word.into(),
      translation: translation.into(),
      alt_translations: vec![],
      romanization: None,
      audio: None,
    }
  }

  fn sentence(id: &str, text: &str, translation: &str) -> Sentence {
    Sentence { id: id.into(), text: text.into(), translation: translation.into(), romanization: None, audio: None }
  }

  fn vocab_step(word_id: &str) -> Step {
    Step {
      id: "v1".into(),
      position: 0,
      content: StepContent::Vocabulary,
      word_id: Some(word_id.into()),
      sentence_id: None,
    }
  }

  fn bank_step(kind: StepContent, sentence_id: &str) -> Step {
    Step { id: "b1".into(), position: 0, content: kind, word_id: None, sentence_id: Some(sentence_id.into()) }
  }

  fn sorted(mut v: Vec<String>) -> Vec<String> {
    v.sort();
    v
  }

  #[test]
  fn vocabulary_dedups_the_correct_word_case_insensitively() {
    let pool = LessonPool {
      words: vec![
        word("w1", "hola", "hello"),
        word("w2", "Hola", "hello"), // pool duplicate of the correct word
        word("w3", "adiós", "goodbye"),
        word("w4", "gracias", "thanks"),
      ],
      sentences: vec![],
    };
    let mut rng = StdRng::seed_from_u64(7);
    let out = assemble(&vocab_step("w1"), &pool, &mut rng);
    let AssembledOptions::WordChoices { words } = out else { panic!("expected word choices") };

    assert!(words.len() <= 1 + VOCAB_DISTRACTORS);
    let holas = words.iter().filter(|w| eq_fold(&w.word, "hola")).count();
    assert_eq!(holas, 1);
    assert!(words.iter().any(|w| w.id == "w1"));
  }

  #[test]
  fn shuffle_preserves_the_multiset() {
    let pool = LessonPool {
      words: (0..10).map(|i| word(&format!("w{}", i), &format!("palabra{}", i), "x")).collect(),
      sentences: vec![],
    };
    for seed in 0..20 {
      let mut rng = StdRng::seed_from_u64(seed);
      let out = assemble(&vocab_step("w0"), &pool, &mut rng);
      let AssembledOptions::WordChoices { words } = out else { panic!("expected word choices") };
      let mut ids: Vec<String> = words.iter().map(|w| w.id.clone()).collect();
      ids.sort();
      assert_eq!(ids.len(), 1 + VOCAB_DISTRACTORS);
      ids.dedup();
      assert_eq!(ids.len(), 1 + VOCAB_DISTRACTORS, "shuffle dropped or duplicated an element");
    }
  }

  #[test]
  fn reading_bank_keeps_each_correct_token_once() {
    let pool = LessonPool {
      words: vec![word("w1", "el", "the"), word("w2", "libro", "book"), word("w3", "perro", "dog")],
      sentences: vec![sentence("s1", "el gato bebe agua", "the cat drinks water")],
    };
    let mut rng = StdRng::seed_from_u64(3);
    let out = assemble(&bank_step(StepContent::Reading, "s1"), &pool, &mut rng);
    let AssembledOptions::WordBank { tokens } = out else { panic!("expected word bank") };

    // "el" from the pool collides with a correct token and is dropped.
    assert_eq!(tokens.iter().filter(|t| eq_fold(t, "el")).count(), 1);
    assert_eq!(
      sorted(tokens),
      sorted(vec![
        "el".into(),
        "gato".into(),
        "bebe".into(),
        "agua".into(),
        "libro".into(),
        "perro".into()
      ])
    );
  }

  #[test]
  fn listening_bank_draws_from_translations() {
    let pool = LessonPool {
      words: vec![word("w1", "gato", "cat"), word("w2", "libro", "book")],
      sentences: vec![sentence("s1", "el gato bebe agua", "the cat drinks water")],
    };
    let mut rng = StdRng::seed_from_u64(11);
    let out = assemble(&bank_step(StepContent::Listening, "s1"), &pool, &mut rng);
    let AssembledOptions::WordBank { tokens } = out else { panic!("expected word bank") };

    // "cat" collides with a correct translation token; "book" survives.
    assert_eq!(tokens.iter().filter(|t| eq_fold(t, "cat")).count(), 1);
    assert!(tokens.iter().any(|t| t == "book"));
  }

  #[test]
  fn other_kinds_get_no_options() {
    let step = Step {
      id: "s".into(),
      position: 0,
      content: StepContent::FillBlank { text: "___".into(), answers: vec!["hola".into()] },
      word_id: None,
      sentence_id: None,
    };
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(assemble(&step, &LessonPool::default(), &mut rng), AssembledOptions::None);
  }
}
