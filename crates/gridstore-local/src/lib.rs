//! Local single-file storage backend.
//!
//! All tables live in one JSON file. Every operation - reads included -
//! runs under an advisory lock scoped to the file path, loads the whole
//! file, and (for writes) commits via temp-write-then-rename, so no caller
//! ever observes a partially written file.

mod file;
mod lock;
mod store;

pub use store::LocalFileStore;
