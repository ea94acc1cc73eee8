use crate::config::CoreConfig;
use crate::db;
use crate::services::summary::ThresholdSummarizer;
use crate::state::AppState;
use std::sync::Arc;

pub fn test_config() -> CoreConfig {
    CoreConfig {
        database_url: "postgresql://postgres@localhost/postgres".to_string(),
        display_timezone: chrono_tz::Europe::Dublin,
    }
}

/// State over a lazy pool that never connects. Tests that reach the database
/// get a connection error, so route tests must fail before the store.
pub fn test_state() -> AppState {
    let config = test_config();
    let pool = db::connect_lazy(&config.database_url).expect("connect_lazy");
    AppState {
        config,
        db: pool,
        summarizer: Arc::new(ThresholdSummarizer),
    }
}
