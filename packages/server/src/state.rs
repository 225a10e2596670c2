use std::sync::Arc;

use judge::JudgeBackend;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub judge: Arc<dyn JudgeBackend>,
    /// Cancelled on shutdown; evaluations poll under a child of it.
    pub shutdown: CancellationToken,
}
