//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&SqlitePool` as the first argument.

pub mod blob_repo;
pub mod record_repo;
pub mod virtual_media_repo;

pub use blob_repo::BlobRepo;
pub use record_repo::RecordRepo;
pub use virtual_media_repo::VirtualMediaRepo;
