#![allow(dead_code)]

use std::sync::Mutex;

use dreamdress_backup::BackupService;
use dreamdress_core::codec::{self, BinaryObject};
use dreamdress_core::progress::ProgressSink;
use dreamdress_db::{BlobStore, DbPool, RecordStore};

/// Fresh in-memory database with the schema applied.
pub async fn test_pool() -> DbPool {
    let pool = dreamdress_db::create_memory_pool().await.unwrap();
    dreamdress_db::run_migrations(&pool).await.unwrap();
    pool
}

/// Service plus direct store handles over one fresh database.
pub async fn setup() -> (BackupService, RecordStore, BlobStore) {
    let pool = test_pool().await;
    (
        BackupService::new(pool.clone()),
        RecordStore::new(pool.clone()),
        BlobStore::new(pool),
    )
}

/// PNG-typed data URL over the given bytes.
pub fn png(bytes: &[u8]) -> String {
    codec::encode(&BinaryObject::new("image/png", bytes.to_vec()))
}

/// Progress sink recording every report.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<(u8, u8, String)>>);

impl ProgressSink for Recorder {
    fn report(&self, percent: u8, total: u8, message: &str) {
        self.0
            .lock()
            .unwrap()
            .push((percent, total, message.to_string()));
    }
}

impl Recorder {
    pub fn percents(&self) -> Vec<u8> {
        self.0.lock().unwrap().iter().map(|(p, _, _)| *p).collect()
    }

    /// Assert the stream starts at 0, never decreases, and ends with one 100.
    pub fn assert_well_formed(&self) {
        let reports = self.0.lock().unwrap();
        assert!(!reports.is_empty(), "no progress reported");
        assert_eq!(reports[0].0, 0, "first report must be 0");
        assert!(reports.iter().all(|(_, total, _)| *total == 100));
        assert!(
            reports.windows(2).all(|w| w[0].0 <= w[1].0),
            "progress went backwards: {reports:?}"
        );
        let hundreds = reports.iter().filter(|(p, _, _)| *p == 100).count();
        assert_eq!(hundreds, 1, "exactly one terminal report expected");
        assert_eq!(reports.last().map(|r| r.0), Some(100));
    }
}
