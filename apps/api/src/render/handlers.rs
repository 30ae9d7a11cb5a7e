use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::render::document::{build_document, Document};
use crate::render::pdf::{render_pdf, ExportSummary, EXPORT_FILE_NAME};
use crate::state::AppState;

/// GET /api/v1/preview — the same document the PDF export renders.
pub async fn handle_preview(State(state): State<AppState>) -> Json<Document> {
    let record = state.store.record();
    Json(build_document(&record))
}

/// POST /api/v1/export — writes `My_CV.pdf` under the data directory.
pub async fn handle_export(
    State(state): State<AppState>,
) -> Result<Json<ExportSummary>, AppError> {
    let record = state.store.record();
    let config = state.page_config.clone();
    let out_path = state.config.data_dir.join(EXPORT_FILE_NAME);

    // PDF assembly is CPU-bound; keep it off the async workers.
    let summary = tokio::task::spawn_blocking(move || render_pdf(&record, &config, &out_path))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))??;
    Ok(Json(summary))
}
