use crate::config::CoreConfig;
use crate::services::summary::Summarizer;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: CoreConfig,
    pub db: PgPool,
    pub summarizer: Arc<dyn Summarizer>,
}
