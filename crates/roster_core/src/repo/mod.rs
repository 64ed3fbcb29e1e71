//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the load/save contract used by record services.
//! - Isolate CSV encoding details from service orchestration.
//!
//! # Invariants
//! - `save` always rewrites the whole store.
//! - `load` never fails on malformed rows; it drops them.

pub mod csv_store;
