//! The player state machine: a pure reducer over one activity run.
//!
//! Phases: intro (challenges only) -> playing -> feedback -> completed.
//! The reducer is deterministic given (state, action, now) and performs no
//! I/O; the service shell owns the state and dispatches actions into it.
//! Completion is signalled back to the caller exactly once per run via the
//! `completion` field of the reduction outcome.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::checker;
use crate::dimensions::{apply_effects, has_negative_dimension, DimensionInventory};
use crate::domain::{Activity, LessonPool, SelectedAnswer, StepKind, StepResult, StepTiming};
use crate::progression::CompletionInput;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Intro,
  Playing,
  Feedback,
  Completed,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  Next,
  Prev,
}

/// Discrete intents the UI can dispatch. Input-device-agnostic.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
  StartChallenge,
  /// Store an answer for the current step.
  SelectAnswer { answer: SelectedAnswer },
  /// Clear the current step's stored answer, allowing a fresh check.
  ClearAnswer,
  CheckAnswer,
  Continue,
  /// Direct movement for step kinds that need no explicit check
  /// (static steps, and match-columns once its interaction finishes).
  NavigateStep { direction: Direction },
  Restart,
}

/// The run-scoped aggregate. Created fresh per attempt; replaced wholesale
/// on restart.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
  pub phase: Phase,
  pub current_step_index: usize,
  pub selected_answers: HashMap<String, SelectedAnswer>,
  pub results: HashMap<String, StepResult>,
  /// Step ids whose answer was explicitly cleared since their last check.
  /// Only these may have their result overwritten by a fresh check.
  pub cleared: HashSet<String>,
  pub dimensions: DimensionInventory,
  pub started_at_ms: u64,
  /// When the current step was entered; feeds per-step durations.
  pub step_entered_at_ms: u64,
  /// Guard: the completion report fires at most once per run, whichever
  /// transition path reaches the completed phase first.
  pub completion_dispatched: bool,
}

impl PlayerState {
  pub fn new(activity: &Activity, now_ms: u64) -> Self {
    let phase = if activity.is_challenge() { Phase::Intro } else { Phase::Playing };
    Self {
      phase,
      current_step_index: 0,
      selected_answers: HashMap::new(),
      results: HashMap::new(),
      cleared: HashSet::new(),
      dimensions: activity.dimensions.clone(),
      started_at_ms: now_ms,
      step_entered_at_ms: now_ms,
      completion_dispatched: false,
    }
  }
}

/// One reduction outcome: the next state, plus the completion payload when
/// this transition was the one that first reached the completed phase.
#[derive(Clone, Debug)]
pub struct Reduced {
  pub state: PlayerState,
  pub completion: Option<CompletionInput>,
}

impl Reduced {
  fn next(state: PlayerState) -> Self {
    Self { state, completion: None }
  }
}

/// The single completion predicate: true when the current step is the last
/// one, so that every path that can finish a run (continue, navigate,
/// match-columns check) agrees on when the last-step transition happens.
fn will_complete(state: &PlayerState, activity: &Activity) -> bool {
  state.current_step_index + 1 >= activity.steps.len()
}

/// Apply `action` to `state` for `activity`. Pure; `now_ms` is the caller's
/// clock reading.
pub fn reduce(
  state: PlayerState,
  activity: &Activity,
  pool: &LessonPool,
  action: Action,
  now_ms: u64,
) -> Reduced {
  let mut state = state;
  match action {
    Action::StartChallenge => {
      if state.phase == Phase::Intro {
        state.phase = Phase::Playing;
        state.current_step_index = 0;
        state.step_entered_at_ms = now_ms;
      }
      Reduced::next(state)
    }

    Action::SelectAnswer { answer } => {
      if state.phase == Phase::Playing {
        if let Some(step) = activity.steps.get(state.current_step_index) {
          state.selected_answers.insert(step.id.clone(), answer);
        }
      }
      Reduced::next(state)
    }

    Action::ClearAnswer => {
      if state.phase == Phase::Playing {
        if let Some(step) = activity.steps.get(state.current_step_index) {
          if state.selected_answers.remove(&step.id).is_some() {
            state.cleared.insert(step.id.clone());
          }
        }
      }
      Reduced::next(state)
    }

    Action::CheckAnswer => check_answer(state, activity, pool, now_ms),

    Action::Continue => {
      if state.phase != Phase::Feedback {
        return Reduced::next(state);
      }
      if will_complete(&state, activity) {
        complete(state, activity)
      } else {
        advance(&mut state, activity, now_ms);
        Reduced::next(state)
      }
    }

    Action::NavigateStep { direction } => {
      if state.phase != Phase::Playing {
        return Reduced::next(state);
      }
      match direction {
        Direction::Prev => {
          if state.current_step_index > 0 {
            state.current_step_index -= 1;
            state.step_entered_at_ms = now_ms;
          }
          Reduced::next(state)
        }
        Direction::Next => {
          let navigable = activity
            .steps
            .get(state.current_step_index)
            .map(|s| matches!(s.kind(), StepKind::Static | StepKind::MatchColumns))
            .unwrap_or(false);
          if !navigable {
            return Reduced::next(state);
          }
          if will_complete(&state, activity) {
            complete(state, activity)
          } else {
            advance(&mut state, activity, now_ms);
            Reduced::next(state)
          }
        }
      }
    }

    Action::Restart => Reduced::next(PlayerState::new(activity, now_ms)),
  }
}

fn check_answer(mut state: PlayerState, activity: &Activity, pool: &LessonPool, now_ms: u64) -> Reduced {
  if state.phase != Phase::Playing {
    return Reduced::next(state);
  }
  let Some(step) = activity.steps.get(state.current_step_index) else {
    return Reduced::next(state);
  };
  // No stored answer: a no-op, not an error.
  let Some(answer) = state.selected_answers.get(&step.id).cloned() else {
    return Reduced::next(state);
  };
  // A result is only replaced after an explicit clear, never silently.
  if state.results.contains_key(&step.id) && !state.cleared.contains(&step.id) {
    return Reduced::next(state);
  }
  let Some(outcome) = checker::check(step, &answer, pool) else {
    return Reduced::next(state);
  };

  state.results.insert(
    step.id.clone(),
    StepResult {
      is_correct: outcome.is_correct,
      feedback: outcome.feedback,
      effects: outcome.effects.clone(),
      answer,
      timing: StepTiming::at(now_ms, state.step_entered_at_ms),
    },
  );
  state.cleared.remove(&step.id);

  apply_effects(&mut state.dimensions, &outcome.effects);
  // Evaluated strictly after applying the step's effects, never speculatively.
  if activity.is_challenge() && has_negative_dimension(&state.dimensions) {
    return complete(state, activity);
  }

  if step.kind() == StepKind::MatchColumns {
    // The interaction carried its own feedback; skip the feedback phase.
    if will_complete(&state, activity) {
      complete(state, activity)
    } else {
      advance(&mut state, activity, now_ms);
      Reduced::next(state)
    }
  } else {
    state.phase = Phase::Feedback;
    Reduced::next(state)
  }
}

fn advance(state: &mut PlayerState, activity: &Activity, now_ms: u64) {
  let last = activity.steps.len().saturating_sub(1);
  state.current_step_index = (state.current_step_index + 1).min(last);
  state.phase = Phase::Playing;
  state.step_entered_at_ms = now_ms;
}

fn complete(mut state: PlayerState, activity: &Activity) -> Reduced {
  state.phase = Phase::Completed;
  state.current_step_index = activity.steps.len().saturating_sub(1);

  let completion = if state.completion_dispatched {
    None
  } else {
    state.completion_dispatched = true;
    Some(CompletionInput {
      activity_id: activity.id.clone(),
      answers: state.selected_answers.clone(),
      dimensions: state.dimensions.clone(),
      started_at: state.started_at_ms,
      step_timings: state.results.iter().map(|(id, r)| (id.clone(), r.timing.clone())).collect(),
    })
  };
  Reduced { state, completion }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ActivityKind, ChoiceOption, StaticVariant, Step, StepContent};

  fn mc_step(id: &str, effects_on_wrong: &[(&str, f64)]) -> Step {
    Step {
      id: id.into(),
      position: 0,
      content: StepContent::MultipleChoice {
        prompt: "pick".into(),
        options: vec![
          ChoiceOption {
            text: "right".into(),
            is_correct: true,
            feedback: Some("yes".into()),
            effects: HashMap::new(),
          },
          ChoiceOption {
            text: "wrong".into(),
            is_correct: false,
            feedback: None,
            effects: effects_on_wrong.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
          },
        ],
      },
      word_id: None,
      sentence_id: None,
    }
  }

  fn static_step(id: &str) -> Step {
    Step {
      id: id.into(),
      position: 0,
      content: StepContent::Static { variant: StaticVariant::Text { body: "read me".into() } },
      word_id: None,
      sentence_id: None,
    }
  }

  fn activity(steps: Vec<Step>, dimensions: &[(&str, f64)]) -> Activity {
    let kind = if dimensions.is_empty() { ActivityKind::Standard } else { ActivityKind::Challenge };
    Activity {
      id: "act-1".into(),
      title: "Test".into(),
      kind,
      lesson_id: "lesson-1".into(),
      steps,
      dimensions: dimensions.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    }
  }

  fn pool() -> LessonPool {
    LessonPool::default()
  }

  fn select(i: usize) -> Action {
    Action::SelectAnswer { answer: SelectedAnswer::MultipleChoice { selected_index: i } }
  }

  #[test]
  fn standard_runs_start_in_playing_and_challenges_in_intro() {
    let std_act = activity(vec![mc_step("s1", &[])], &[]);
    assert_eq!(PlayerState::new(&std_act, 0).phase, Phase::Playing);

    let chal = activity(vec![mc_step("s1", &[])], &[("health", 10.0)]);
    let state = PlayerState::new(&chal, 0);
    assert_eq!(state.phase, Phase::Intro);

    let r = reduce(state, &chal, &pool(), Action::StartChallenge, 5);
    assert_eq!(r.state.phase, Phase::Playing);
    assert_eq!(r.state.current_step_index, 0);
  }

  #[test]
  fn check_without_an_answer_is_a_no_op() {
    let act = activity(vec![mc_step("s1", &[])], &[]);
    let state = PlayerState::new(&act, 0);
    let r = reduce(state.clone(), &act, &pool(), Action::CheckAnswer, 10);
    assert_eq!(r.state, state);
    assert!(r.completion.is_none());
  }

  #[test]
  fn check_moves_to_feedback_and_records_the_result() {
    let act = activity(vec![mc_step("s1", &[]), mc_step("s2", &[])], &[]);
    let state = PlayerState::new(&act, 0);
    let state = reduce(state, &act, &pool(), select(0), 1_000).state;
    let r = reduce(state, &act, &pool(), Action::CheckAnswer, 4_000);

    assert_eq!(r.state.phase, Phase::Feedback);
    let result = &r.state.results["s1"];
    assert!(result.is_correct);
    assert_eq!(result.feedback.as_deref(), Some("yes"));
    assert_eq!(result.timing.duration_seconds, 4.0);
    assert!(r.completion.is_none());
  }

  #[test]
  fn results_are_never_silently_overwritten() {
    let act = activity(vec![mc_step("s1", &[]), mc_step("s2", &[])], &[]);
    let mut state = PlayerState::new(&act, 0);
    state = reduce(state, &act, &pool(), select(0), 0).state;
    state = reduce(state, &act, &pool(), Action::CheckAnswer, 0).state;
    assert!(state.results["s1"].is_correct);

    // Back in playing without clearing: re-check keeps the original result.
    state.phase = Phase::Playing;
    state = reduce(state, &act, &pool(), select(1), 0).state;
    state = reduce(state, &act, &pool(), Action::CheckAnswer, 0).state;
    assert!(state.results["s1"].is_correct, "result was overwritten without a clear");
    assert_eq!(state.phase, Phase::Playing);

    // After an explicit clear, a fresh check overwrites.
    state = reduce(state, &act, &pool(), Action::ClearAnswer, 0).state;
    state = reduce(state, &act, &pool(), select(1), 0).state;
    state = reduce(state, &act, &pool(), Action::CheckAnswer, 0).state;
    assert!(!state.results["s1"].is_correct);
  }

  #[test]
  fn continue_advances_and_completes_on_the_last_step() {
    let act = activity(vec![mc_step("s1", &[]), mc_step("s2", &[])], &[]);
    let mut state = PlayerState::new(&act, 0);
    state = reduce(state, &act, &pool(), select(0), 0).state;
    state = reduce(state, &act, &pool(), Action::CheckAnswer, 0).state;
    state = reduce(state, &act, &pool(), Action::Continue, 0).state;
    assert_eq!(state.phase, Phase::Playing);
    assert_eq!(state.current_step_index, 1);

    state = reduce(state, &act, &pool(), select(1), 0).state;
    state = reduce(state, &act, &pool(), Action::CheckAnswer, 0).state;
    let r = reduce(state, &act, &pool(), Action::Continue, 0);
    assert_eq!(r.state.phase, Phase::Completed);
    assert_eq!(r.state.current_step_index, 1);
    let completion = r.completion.expect("first completion fires the report");
    assert_eq!(completion.activity_id, "act-1");
    assert_eq!(completion.answers.len(), 2);
    assert_eq!(completion.step_timings.len(), 2);
  }

  #[test]
  fn completion_fires_at_most_once() {
    let act = activity(vec![static_step("s1")], &[]);
    let state = PlayerState::new(&act, 0);
    let r = reduce(state, &act, &pool(), Action::NavigateStep { direction: Direction::Next }, 0);
    assert_eq!(r.state.phase, Phase::Completed);
    assert!(r.completion.is_some());

    // A second transition into completed must not fire again.
    let mut replay = r.state.clone();
    replay.phase = Phase::Playing;
    let again = reduce(replay, &act, &pool(), Action::NavigateStep { direction: Direction::Next }, 0);
    assert_eq!(again.state.phase, Phase::Completed);
    assert!(again.completion.is_none());
  }

  #[test]
  fn navigation_is_clamped_and_gated_by_step_kind() {
    let act = activity(vec![static_step("s1"), mc_step("s2", &[]), static_step("s3")], &[]);
    let state = PlayerState::new(&act, 0);

    // Prev at index 0 stays put.
    let state = reduce(state, &act, &pool(), Action::NavigateStep { direction: Direction::Prev }, 0).state;
    assert_eq!(state.current_step_index, 0);

    let state = reduce(state, &act, &pool(), Action::NavigateStep { direction: Direction::Next }, 0).state;
    assert_eq!(state.current_step_index, 1);

    // A multiple-choice step cannot be skipped with navigate-next.
    let state = reduce(state, &act, &pool(), Action::NavigateStep { direction: Direction::Next }, 0).state;
    assert_eq!(state.current_step_index, 1);
    assert_eq!(state.phase, Phase::Playing);
  }

  #[test]
  fn negative_dimension_ends_the_run_in_failure() {
    // The §8 scenario: {health: 10, budget: 10}, a step effect of health -15.
    let act = activity(
      vec![mc_step("s1", &[("health", -15.0)]), mc_step("s2", &[])],
      &[("health", 10.0), ("budget", 10.0)],
    );
    let mut state = PlayerState::new(&act, 0);
    state = reduce(state, &act, &pool(), Action::StartChallenge, 0).state;
    state = reduce(state, &act, &pool(), select(1), 0).state;
    let r = reduce(state, &act, &pool(), Action::CheckAnswer, 0);

    assert_eq!(r.state.phase, Phase::Completed);
    assert_eq!(r.state.dimensions["health"], -5.0);
    assert!(crate::dimensions::has_negative_dimension(&r.state.dimensions));
    let completion = r.completion.expect("game over still reports completion");
    assert_eq!(completion.dimensions["budget"], 10.0);
  }

  #[test]
  fn restart_matches_a_fresh_state_modulo_started_at() {
    let act = activity(vec![mc_step("s1", &[]), mc_step("s2", &[])], &[("health", 3.0)]);
    let mut state = PlayerState::new(&act, 100);
    state = reduce(state, &act, &pool(), Action::StartChallenge, 200).state;
    state = reduce(state, &act, &pool(), select(1), 300).state;
    state = reduce(state, &act, &pool(), Action::CheckAnswer, 400).state;

    let restarted = reduce(state, &act, &pool(), Action::Restart, 9_999).state;
    let mut fresh = PlayerState::new(&act, 9_999);
    fresh.started_at_ms = restarted.started_at_ms;
    fresh.step_entered_at_ms = restarted.step_entered_at_ms;
    assert_eq!(restarted, fresh);
    assert_eq!(restarted.phase, Phase::Intro);
    assert_eq!(restarted.dimensions["health"], 3.0);
  }
}
