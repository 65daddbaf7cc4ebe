//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! dispatcher; each is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::AppState;

fn not_found(message: String) -> (StatusCode, Json<ErrorOut>) {
  (StatusCode::NOT_FOUND, Json(ErrorOut { message }))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_activities(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let activities: Vec<ActivityOut> = state.list_activities().iter().map(|a| to_activity_out(a)).collect();
  Json(activities)
}

#[instrument(level = "info", skip(state, body), fields(%body.activity_id))]
pub async fn http_start_run(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartRunIn>,
) -> impl IntoResponse {
  match state.start_run(&body.activity_id).await {
    Ok(view) => {
      info!(target: "activity", run = %view.run_id, activity = %body.activity_id, "HTTP run started");
      Json(to_run_out(&view)).into_response()
    }
    Err(message) => not_found(message).into_response(),
  }
}

#[instrument(level = "info", skip(state), fields(%q.run_id))]
pub async fn http_get_run(
  State(state): State<Arc<AppState>>,
  Query(q): Query<RunQuery>,
) -> impl IntoResponse {
  match state.get_run(&q.run_id).await {
    Ok(view) => Json(to_run_out(&view)).into_response(),
    Err(message) => not_found(message).into_response(),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.run_id))]
pub async fn http_post_intent(
  State(state): State<Arc<AppState>>,
  Json(body): Json<IntentIn>,
) -> impl IntoResponse {
  match state.dispatch(&body.run_id, body.intent.into_action()).await {
    Ok(view) => {
      info!(target: "activity", run = %body.run_id, phase = ?view.player.phase, "HTTP intent dispatched");
      Json(to_run_out(&view)).into_response()
    }
    Err(message) => not_found(message).into_response(),
  }
}

#[instrument(level = "info", skip(state), fields(%q.run_id))]
pub async fn http_get_completion(
  State(state): State<Arc<AppState>>,
  Query(q): Query<RunQuery>,
) -> impl IntoResponse {
  match state.completion_result(&q.run_id).await {
    Ok(completion) => Json(CompletionOut { completion }).into_response(),
    Err(message) => not_found(message).into_response(),
  }
}
