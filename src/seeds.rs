//! Seed data: a built-in Spanish starter lesson so the app is playable even
//! without an external lesson bank.

use std::collections::HashMap;

use crate::domain::{
  Activity, ActivityKind, ChoiceOption, ImageOption, LessonPool, MatchPair, Sentence, StaticVariant, Step,
  StepContent, Word,
};

pub const SEED_LESSON_ID: &str = "lesson-basics";

fn word(id: &str, word: &str, translation: &str, alts: &[&str]) -> Word {
  Word {
    id: id.into(),
    word: word.into(),
    translation: translation.into(),
    alt_translations: alts.iter().map(|s| s.to_string()).collect(),
    romanization: None,
    audio: Some(format!("audio/{}.mp3", id)),
  }
}

fn sentence(id: &str, text: &str, translation: &str) -> Sentence {
  Sentence {
    id: id.into(),
    text: text.into(),
    translation: translation.into(),
    romanization: None,
    audio: Some(format!("audio/{}.mp3", id)),
  }
}

/// The seed lesson's word and sentence pools.
pub fn seed_pool() -> LessonPool {
  LessonPool {
    words: vec![
      word("w-hola", "hola", "hello", &["hi"]),
      word("w-adios", "adiós", "goodbye", &["bye"]),
      word("w-gracias", "gracias", "thanks", &["thank you"]),
      word("w-agua", "agua", "water", &[]),
      word("w-gato", "gato", "cat", &[]),
      word("w-libro", "libro", "book", &[]),
    ],
    sentences: vec![
      sentence("s-gato", "el gato bebe agua", "the cat drinks water"),
      sentence("s-libro", "yo leo un libro", "I read a book"),
    ],
  }
}

fn static_text(id: &str, body: &str) -> Step {
  Step {
    id: id.into(),
    position: 0,
    content: StepContent::Static { variant: StaticVariant::Text { body: body.into() } },
    word_id: None,
    sentence_id: None,
  }
}

fn choice(text: &str, is_correct: bool, feedback: &str) -> ChoiceOption {
  ChoiceOption {
    text: text.into(),
    is_correct,
    feedback: if feedback.is_empty() { None } else { Some(feedback.into()) },
    effects: HashMap::new(),
  }
}

fn choice_with_effects(text: &str, is_correct: bool, feedback: &str, effects: &[(&str, f64)]) -> ChoiceOption {
  ChoiceOption {
    text: text.into(),
    is_correct,
    feedback: if feedback.is_empty() { None } else { Some(feedback.into()) },
    effects: effects.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
  }
}

fn renumber(mut steps: Vec<Step>) -> Vec<Step> {
  for (i, s) in steps.iter_mut().enumerate() {
    s.position = i as u32;
  }
  steps
}

/// Built-in activities that guarantee the app is useful without config:
/// one standard lesson, one challenge, and one pure-reading story.
pub fn seed_activities() -> Vec<Activity> {
  vec![
    Activity {
      id: "act-greetings".into(),
      title: "First greetings".into(),
      kind: ActivityKind::Standard,
      lesson_id: SEED_LESSON_ID.into(),
      dimensions: HashMap::new(),
      steps: renumber(vec![
        static_text("greet-intro", "In this lesson you'll meet your first Spanish greetings."),
        Step {
          id: "greet-grammar".into(),
          position: 0,
          content: StepContent::Static {
            variant: StaticVariant::GrammarExample {
              example: "¡Hola! ¿Cómo estás?".into(),
              explanation: "Spanish questions open with an inverted mark.".into(),
            },
          },
          word_id: None,
          sentence_id: None,
        },
        Step {
          id: "greet-pick".into(),
          position: 0,
          content: StepContent::MultipleChoice {
            prompt: "What does 'hola' mean?".into(),
            options: vec![
              choice("Hello", true, "¡Exacto!"),
              choice("Goodbye", false, "That one is 'adiós'."),
              choice("Thanks", false, "That one is 'gracias'."),
            ],
          },
          word_id: None,
          sentence_id: None,
        },
        Step {
          id: "greet-vocab".into(),
          position: 0,
          content: StepContent::Vocabulary,
          word_id: Some("w-gracias".into()),
          sentence_id: None,
        },
        Step {
          id: "greet-blank".into(),
          position: 0,
          content: StepContent::FillBlank {
            text: "Para saludar dices ___.".into(),
            answers: vec!["hola".into()],
          },
          word_id: None,
          sentence_id: None,
        },
        Step {
          id: "greet-match".into(),
          position: 0,
          content: StepContent::MatchColumns {
            pairs: vec![
              MatchPair { left: "hola".into(), right: "hello".into() },
              MatchPair { left: "adiós".into(), right: "goodbye".into() },
              MatchPair { left: "gracias".into(), right: "thanks".into() },
            ],
          },
          word_id: None,
          sentence_id: None,
        },
        Step {
          id: "greet-read".into(),
          position: 0,
          content: StepContent::Reading,
          word_id: None,
          sentence_id: Some("s-gato".into()),
        },
        Step {
          id: "greet-listen".into(),
          position: 0,
          content: StepContent::Listening,
          word_id: None,
          sentence_id: Some("s-libro".into()),
        },
        Step {
          id: "greet-sort".into(),
          position: 0,
          content: StepContent::SortOrder {
            prompt: "Put the conversation in order".into(),
            items: vec!["hola".into(), "gracias".into(), "adiós".into()],
          },
          word_id: None,
          sentence_id: None,
        },
      ]),
    },
    Activity {
      id: "act-market".into(),
      title: "Market challenge".into(),
      kind: ActivityKind::Challenge,
      lesson_id: SEED_LESSON_ID.into(),
      dimensions: [("health".to_string(), 10.0), ("budget".to_string(), 10.0)].into_iter().collect(),
      steps: renumber(vec![
        Step {
          id: "market-drink".into(),
          position: 0,
          content: StepContent::MultipleChoice {
            prompt: "You're thirsty at the market. What do you ask for?".into(),
            options: vec![
              choice_with_effects("agua", true, "Hydrated and cheap.", &[("budget", -1.0)]),
              choice_with_effects("vino", false, "Pricey this early.", &[("budget", -6.0), ("health", -2.0)]),
            ],
          },
          word_id: None,
          sentence_id: None,
        },
        Step {
          id: "market-snack".into(),
          position: 0,
          content: StepContent::SelectImage {
            prompt: "Pick the snack that keeps you going.".into(),
            options: vec![
              ImageOption {
                image: "img/fruta.png".into(),
                is_correct: true,
                feedback: Some("Fresh fruit, good call.".into()),
                effects: [("health".to_string(), 2.0), ("budget".to_string(), -2.0)].into_iter().collect(),
              },
              ImageOption {
                image: "img/dulces.png".into(),
                is_correct: false,
                feedback: Some("The sugar crash catches up.".into()),
                effects: [("health".to_string(), -4.0), ("budget".to_string(), -5.0)].into_iter().collect(),
              },
            ],
          },
          word_id: None,
          sentence_id: None,
        },
        Step {
          id: "market-thanks".into(),
          position: 0,
          content: StepContent::MultipleChoice {
            prompt: "The vendor hands you your change. You say…".into(),
            options: vec![
              choice_with_effects("gracias", true, "", &[]),
              choice_with_effects("hola", false, "A greeting, not a thank-you.", &[("health", -1.0)]),
            ],
          },
          word_id: None,
          sentence_id: None,
        },
      ]),
    },
    Activity {
      id: "act-story".into(),
      title: "A quiet morning".into(),
      kind: ActivityKind::Standard,
      lesson_id: SEED_LESSON_ID.into(),
      dimensions: HashMap::new(),
      steps: renumber(vec![
        static_text("story-1", "El gato se despierta. The cat wakes up."),
        static_text("story-2", "El gato bebe agua y el día empieza. The cat drinks water and the day begins."),
      ]),
    },
  ]
}
