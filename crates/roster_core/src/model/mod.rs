//! Roster domain model.
//!
//! # Responsibility
//! - Define the record shape used by storage and services.
//! - Keep field validation next to the fields it guards.
//!
//! # Invariants
//! - Every mutation path (construction, edit, decode) goes through the same
//!   validated setters.

pub mod employee;
