use std::sync::Arc;

use common::FileStorage;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::service::PlaceObserver;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn FileStorage>,
    pub observer: Arc<dyn PlaceObserver>,
}
