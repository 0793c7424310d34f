//! In-memory record store for the MindGo flow runtime
//!
//! This crate provides an in-memory implementation of the `RecordStore`
//! interface defined in mindgo-core. Collections are named, append-only lists
//! of JSON records and can be exported to or restored from a single JSON
//! object shaped like the browser's local storage.

pub mod record_store;
pub use record_store::InMemoryRecordStore;
