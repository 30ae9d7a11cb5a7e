use axum::{extract::State, Json};

use crate::assist::{run_assist, AssistOutcome, AssistRequest};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/assist
pub async fn handle_assist(
    State(state): State<AppState>,
    Json(req): Json<AssistRequest>,
) -> Result<Json<AssistOutcome>, AppError> {
    let outcome = run_assist(&state.store, state.llm.as_ref(), &state.flights, req).await?;
    Ok(Json(outcome))
}
