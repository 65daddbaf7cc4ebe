//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the dispatcher. We reply with a single JSON message per request.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::protocol::{to_activity_out, to_run_out, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "kata_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "kata_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "kata_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "kata_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "kata_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::ListActivities => {
      let activities = state.list_activities().iter().map(|a| to_activity_out(a)).collect();
      ServerWsMessage::Activities { activities }
    }

    ClientWsMessage::StartRun { activity_id } => match state.start_run(&activity_id).await {
      Ok(view) => {
        tracing::info!(target: "activity", run = %view.run_id, activity = %activity_id, "WS run started");
        ServerWsMessage::Run { run: to_run_out(&view) }
      }
      Err(message) => ServerWsMessage::Error { message },
    },

    ClientWsMessage::GetRun { run_id } => match state.get_run(&run_id).await {
      Ok(view) => ServerWsMessage::Run { run: to_run_out(&view) },
      Err(message) => ServerWsMessage::Error { message },
    },

    ClientWsMessage::Intent { run_id, intent } => match state.dispatch(&run_id, intent.into_action()).await {
      Ok(view) => {
        tracing::info!(target: "activity", run = %run_id, phase = ?view.player.phase, "WS intent dispatched");
        ServerWsMessage::Run { run: to_run_out(&view) }
      }
      Err(message) => ServerWsMessage::Error { message },
    },

    ClientWsMessage::GetCompletion { run_id } => match state.completion_result(&run_id).await {
      Ok(completion) => ServerWsMessage::Completion { completion },
      Err(message) => ServerWsMessage::Error { message },
    },
  }
}
