//! Kata · Lesson Activity Backend
//!
//! - Axum HTTP + WebSocket API driving interactive lesson runs
//! - Optional progression-service integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT            : u16 (default 3000)
//!   LESSON_CONFIG_PATH   : path to TOML lesson bank (lessons + activities)
//!   PROGRESSION_BASE_URL : enables completion reporting if present
//!   PROGRESSION_API_TOKEN  : bearer token for the progression service
//!   LOG_LEVEL     : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT    : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod content;
mod config;
mod seeds;
mod assembler;
mod checker;
mod dimensions;
mod score;
mod player;
mod progression;
mod state;
mod protocol;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (lesson bank, run store, progression client).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "kata_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
