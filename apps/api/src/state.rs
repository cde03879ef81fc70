use std::sync::Arc;

use crate::config::Config;
use crate::render::compose::Composer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Writers are stateless; one composer serves every request.
    pub composer: Arc<Composer>,
}
