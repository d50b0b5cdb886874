//! Row structs for the three store tables.

pub mod blob;
pub mod record;
pub mod virtual_media;
