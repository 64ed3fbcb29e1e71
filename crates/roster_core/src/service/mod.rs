//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate model validation and store writes into roster operations.
//! - Keep the CLI decoupled from storage details.

pub mod record_service;
