//! Pure building blocks of the dreamdress backup engine.
//!
//! Nothing in this crate touches a database, the filesystem, or an async
//! runtime. Storage lives in `dreamdress-db`; archive orchestration lives in
//! `dreamdress-backup`.

pub mod backup;
pub mod codec;
pub mod error;
pub mod migration;
pub mod naming;
pub mod progress;
pub mod types;
