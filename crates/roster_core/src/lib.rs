//! Core domain logic for the employee roster.
//! This crate is the single source of truth for record invariants.

pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::employee::{
    normalize_phone_number, parse_team_size, ManagerExtension, NameField, Record, RecordFields,
    RecordKind, RecordPatch, ValidationError,
};
pub use repo::csv_store::{
    decode_records, encode_records, CsvRecordStore, DecodeOutcome, RecordStore, StoreError,
    StoreResult, CSV_HEADERS, DEFAULT_DATA_FILE,
};
pub use service::record_service::{RecordService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
