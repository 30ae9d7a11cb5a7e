pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::assist::handlers as assist;
use crate::render::handlers as render;
use crate::state::AppState;
use crate::wizard::handlers as wizard;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Wizard navigation and session lifecycle
        .route("/api/v1/wizard", get(wizard::handle_get_wizard))
        .route("/api/v1/wizard/next", post(wizard::handle_next))
        .route("/api/v1/wizard/prev", post(wizard::handle_prev))
        .route("/api/v1/wizard/continue", post(wizard::handle_continue))
        .route("/api/v1/wizard/start-new", post(wizard::handle_start_new))
        .route("/api/v1/wizard/reset", post(wizard::handle_reset))
        .route("/api/v1/wizard/home", post(wizard::handle_home))
        // Record access and entry lists
        .route(
            "/api/v1/record",
            get(wizard::handle_get_record).patch(wizard::handle_patch_record),
        )
        .route("/api/v1/record/education", post(wizard::handle_add_education))
        .route(
            "/api/v1/record/education/:id",
            delete(wizard::handle_delete_education),
        )
        .route(
            "/api/v1/record/experience/:category",
            post(wizard::handle_add_experience),
        )
        .route(
            "/api/v1/record/experience/:category/:id",
            delete(wizard::handle_delete_experience),
        )
        .route("/api/v1/record/projects", post(wizard::handle_add_project))
        .route(
            "/api/v1/record/projects/:id",
            delete(wizard::handle_delete_project),
        )
        .route(
            "/api/v1/record/photo",
            post(wizard::handle_upload_photo).delete(wizard::handle_delete_photo),
        )
        // Assist + rendering
        .route("/api/v1/assist", post(assist::handle_assist))
        .route("/api/v1/preview", get(render::handle_preview))
        .route("/api/v1/export", post(render::handle_export))
        // Photo uploads may carry up to 2 MiB of image data plus multipart
        // framing; axum's default 2 MiB body cap would reject them.
        .layer(DefaultBodyLimit::max(4 * 1024 * 1024))
        .with_state(state)
}
