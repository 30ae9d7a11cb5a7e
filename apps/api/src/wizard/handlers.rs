use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::record::{
    CvRecord, Education, Experience, ExperienceCategory, Project, RecordPatch,
};
use crate::state::AppState;
use crate::wizard::WizardSnapshot;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmRequest {
    pub confirm: bool,
}

/// Experience entries arrive without id or category; both are assigned
/// server-side from the route.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewExperience {
    pub role: String,
    pub organization: String,
    pub dates: String,
    pub description: String,
}

/// GET /api/v1/wizard
pub async fn handle_get_wizard(State(state): State<AppState>) -> Json<WizardSnapshot> {
    Json(state.store.snapshot())
}

/// POST /api/v1/wizard/next
pub async fn handle_next(State(state): State<AppState>) -> Json<WizardSnapshot> {
    Json(state.store.go_next())
}

/// POST /api/v1/wizard/prev
pub async fn handle_prev(State(state): State<AppState>) -> Json<WizardSnapshot> {
    Json(state.store.go_prev())
}

/// POST /api/v1/wizard/continue
pub async fn handle_continue(State(state): State<AppState>) -> Json<WizardSnapshot> {
    Json(state.store.continue_session())
}

/// POST /api/v1/wizard/home
pub async fn handle_home(State(state): State<AppState>) -> Json<WizardSnapshot> {
    Json(state.store.go_home())
}

/// POST /api/v1/wizard/start-new
pub async fn handle_start_new(
    State(state): State<AppState>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<WizardSnapshot>, AppError> {
    Ok(Json(state.store.start_new(req.confirm)?))
}

/// POST /api/v1/wizard/reset
pub async fn handle_reset(
    State(state): State<AppState>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<WizardSnapshot>, AppError> {
    Ok(Json(state.store.reset(req.confirm)?))
}

/// GET /api/v1/record
pub async fn handle_get_record(State(state): State<AppState>) -> Json<CvRecord> {
    Json(state.store.record())
}

/// PATCH /api/v1/record
pub async fn handle_patch_record(
    State(state): State<AppState>,
    Json(patch): Json<RecordPatch>,
) -> Json<CvRecord> {
    Json(state.store.apply_patch(patch))
}

/// POST /api/v1/record/education
pub async fn handle_add_education(
    State(state): State<AppState>,
    Json(entry): Json<Education>,
) -> Json<Education> {
    Json(state.store.add_education(entry))
}

/// DELETE /api/v1/record/education/:id
pub async fn handle_delete_education(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CvRecord>, AppError> {
    state.store.remove_education(id)?;
    Ok(Json(state.store.record()))
}

/// POST /api/v1/record/experience/:category
pub async fn handle_add_experience(
    State(state): State<AppState>,
    Path(category): Path<ExperienceCategory>,
    Json(body): Json<NewExperience>,
) -> Json<Experience> {
    let mut entry = Experience::empty(category);
    entry.role = body.role;
    entry.organization = body.organization;
    entry.dates = body.dates;
    entry.description = body.description;
    Json(state.store.add_experience(category, entry))
}

/// DELETE /api/v1/record/experience/:category/:id
pub async fn handle_delete_experience(
    State(state): State<AppState>,
    Path((category, id)): Path<(ExperienceCategory, Uuid)>,
) -> Result<Json<CvRecord>, AppError> {
    state.store.remove_experience(category, id)?;
    Ok(Json(state.store.record()))
}

/// POST /api/v1/record/projects
pub async fn handle_add_project(
    State(state): State<AppState>,
    Json(entry): Json<Project>,
) -> Json<Project> {
    Json(state.store.add_project(entry))
}

/// DELETE /api/v1/record/projects/:id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CvRecord>, AppError> {
    state.store.remove_project(id)?;
    Ok(Json(state.store.record()))
}

/// POST /api/v1/record/photo — multipart upload, field name `photo`.
pub async fn handle_upload_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CvRecord>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() == Some("photo") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(e.to_string()))?;
            state.store.set_photo(&bytes)?;
            return Ok(Json(state.store.record()));
        }
    }
    Err(AppError::Validation(
        "multipart field 'photo' is missing".to_string(),
    ))
}

/// DELETE /api/v1/record/photo
pub async fn handle_delete_photo(State(state): State<AppState>) -> Json<CvRecord> {
    state.store.clear_photo();
    Json(state.store.record())
}
