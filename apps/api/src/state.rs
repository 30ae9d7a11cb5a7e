use std::sync::Arc;

use crate::assist::InFlight;
use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::render::layout::PageConfig;
use crate::wizard::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The wizard session: record, step cursor, and write-through persistence.
    pub store: Arc<RecordStore>,
    /// Generative-text collaborator behind a trait so tests can stub it.
    pub llm: Arc<dyn TextGenerator>,
    /// Advisory single-flight registry for assist calls.
    pub flights: Arc<InFlight>,
    pub config: Config,
    /// Page dimensions and font sizes for preview pagination and export.
    pub page_config: PageConfig,
}
