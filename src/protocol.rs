//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::assembler::AssembledOptions;
use crate::domain::{
    Activity, ActivityKind, SelectedAnswer, Sentence, StepContent, StepKind, StepResult, Word,
};
use crate::player::{Action, Direction, Phase};
use crate::progression::CompletionResult;
use crate::state::RunView;

/// A run-scoped intent dispatched into the reducer. Shared by the HTTP
/// intent endpoint and the WS message loop so both boundaries accept the
/// same discrete vocabulary.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunIntent {
    StartChallenge,
    SelectAnswer { answer: SelectedAnswer },
    ClearAnswer,
    CheckAnswer,
    Continue,
    NavigateStep { direction: Direction },
    Restart,
}

impl RunIntent {
    pub fn into_action(self) -> Action {
        match self {
            RunIntent::StartChallenge => Action::StartChallenge,
            RunIntent::SelectAnswer { answer } => Action::SelectAnswer { answer },
            RunIntent::ClearAnswer => Action::ClearAnswer,
            RunIntent::CheckAnswer => Action::CheckAnswer,
            RunIntent::Continue => Action::Continue,
            RunIntent::NavigateStep { direction } => Action::NavigateStep { direction },
            RunIntent::Restart => Action::Restart,
        }
    }
}

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListActivities,
    StartRun {
        #[serde(rename = "activityId")]
        activity_id: String,
    },
    GetRun {
        #[serde(rename = "runId")]
        run_id: String,
    },
    Intent {
        #[serde(rename = "runId")]
        run_id: String,
        intent: RunIntent,
    },
    GetCompletion {
        #[serde(rename = "runId")]
        run_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Activities {
        activities: Vec<ActivityOut>,
    },
    Run {
        run: RunOut,
    },
    Completion {
        completion: Option<CompletionResult>,
    },
    Error {
        message: String,
    },
}

/// Listing entry for one loaded activity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityOut {
    pub id: String,
    pub title: String,
    pub kind: ActivityKind,
    pub lesson_id: String,
    pub step_count: usize,
}

pub fn to_activity_out(a: &Activity) -> ActivityOut {
    ActivityOut {
        id: a.id.clone(),
        title: a.title.clone(),
        kind: a.kind,
        lesson_id: a.lesson_id.clone(),
        step_count: a.steps.len(),
    }
}

/// The current step as rendered to the client: authored content, resolved
/// entities, and the per-run assembled option set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOut {
    pub id: String,
    pub kind: StepKind,
    pub content: StepContent,
    pub word: Option<Word>,
    pub sentence: Option<Sentence>,
    pub options: AssembledOptions,
}

/// DTO for run delivery, used by both WS and HTTP.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOut {
    pub run_id: String,
    pub activity_id: String,
    pub title: String,
    pub kind: ActivityKind,
    pub phase: Phase,
    pub current_step_index: usize,
    pub step_count: usize,
    pub current_step: Option<StepOut>,
    pub dimensions: HashMap<String, f64>,
    pub results: HashMap<String, StepResult>,
    pub selected_answers: HashMap<String, SelectedAnswer>,
}

/// Convert a run view (internal) to the public DTO.
pub fn to_run_out(view: &RunView) -> RunOut {
    let current_step = view.activity.steps.get(view.player.current_step_index).map(|step| StepOut {
        id: step.id.clone(),
        kind: step.kind(),
        content: step.content.clone(),
        word: step.word_id.as_deref().and_then(|id| view.pool.word(id)).cloned(),
        sentence: step.sentence_id.as_deref().and_then(|id| view.pool.sentence(id)).cloned(),
        options: view.options.get(&step.id).cloned().unwrap_or(AssembledOptions::None),
    });

    RunOut {
        run_id: view.run_id.clone(),
        activity_id: view.activity.id.clone(),
        title: view.activity.title.clone(),
        kind: view.activity.kind,
        phase: view.player.phase,
        current_step_index: view.player.current_step_index,
        step_count: view.activity.steps.len(),
        current_step,
        dimensions: view.player.dimensions.clone(),
        results: view.player.results.clone(),
        selected_answers: view.player.selected_answers.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct StartRunIn {
    #[serde(rename = "activityId")]
    pub activity_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RunQuery {
    #[serde(rename = "runId")]
    pub run_id: String,
}

#[derive(Debug, Deserialize)]
pub struct IntentIn {
    #[serde(rename = "runId")]
    pub run_id: String,
    pub intent: RunIntent,
}

#[derive(Serialize)]
pub struct CompletionOut {
    pub completion: Option<CompletionResult>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
