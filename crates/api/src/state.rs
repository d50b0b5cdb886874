use std::sync::Arc;

use dreamdress_backup::BackupService;
use tokio::sync::Mutex;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: dreamdress_db::DbPool,
    /// Backup engine. Locked for the whole of an export or import so
    /// concurrent requests never interleave against the same stores.
    pub backup: Arc<Mutex<BackupService>>,
}

impl AppState {
    pub fn new(pool: dreamdress_db::DbPool) -> Self {
        Self {
            backup: Arc::new(Mutex::new(BackupService::new(pool.clone()))),
            pool,
        }
    }
}
