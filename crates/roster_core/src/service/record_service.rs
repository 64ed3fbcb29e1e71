//! Record use-case service.
//!
//! # Responsibility
//! - Own the in-memory roster for the lifetime of the process.
//! - Enforce id uniqueness and index bounds before touching records.
//! - Persist the full collection after every successful mutation.
//!
//! # Invariants
//! - Field validation is always delegated to `Record` setters.
//! - Edits are staged on a copy and committed only when every field passes.
//! - When a save fails, the in-memory roster is rolled back so it keeps
//!   matching what is stored.

use crate::model::employee::{Record, RecordFields, RecordPatch, ValidationError};
use crate::repo::csv_store::{RecordStore, StoreError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error surfaced to record service callers.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    DuplicateId(String),
    IndexOutOfRange { index: usize, len: usize },
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "employee with id `{id}` already exists"),
            Self::IndexOutOfRange { index, len } => write!(
                f,
                "employee index {index} out of range for roster of {len}"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::DuplicateId(_) | Self::IndexOutOfRange { .. } => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Use-case service wrapping the roster and its store.
pub struct RecordService<S: RecordStore> {
    store: S,
    records: Vec<Record>,
}

impl<S: RecordStore> RecordService<S> {
    /// Loads the roster once from `store`.
    pub fn open(store: S) -> ServiceResult<Self> {
        let records = store.load()?;
        Ok(Self { store, records })
    }

    /// Records in stored order.
    pub fn list(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Adds a new record and persists the roster.
    ///
    /// # Errors
    /// - `DuplicateId` when another record already uses `fields.id`.
    /// - `Validation` for any rejected field.
    /// - `Store` when the rewrite fails; the roster is left unchanged.
    pub fn create(&mut self, fields: RecordFields) -> ServiceResult<&Record> {
        if self.records.iter().any(|record| record.id() == fields.id) {
            info!("event=record_create module=service status=rejected error_code=duplicate_id");
            return Err(ServiceError::DuplicateId(fields.id));
        }

        let kind = fields.kind();
        let record = Record::new(fields).map_err(|err| {
            info!(
                "event=record_create module=service status=rejected error_code={}",
                err.code()
            );
            err
        })?;

        self.records.push(record);
        if let Err(err) = self.persist("record_create") {
            self.records.pop();
            return Err(err);
        }

        let index = self.records.len() - 1;
        info!(
            "event=record_create module=service status=ok kind={} total={}",
            kind.as_str(),
            self.records.len()
        );
        Ok(&self.records[index])
    }

    /// Applies `patch` to the record at `index` and persists the roster.
    ///
    /// # Errors
    /// - `IndexOutOfRange` when `index >= len`.
    /// - `Validation` for any rejected field; no field is changed.
    /// - `Store` when the rewrite fails; the previous record is restored.
    pub fn edit(&mut self, index: usize, patch: &RecordPatch) -> ServiceResult<&Record> {
        let current = self.checked(index)?;
        let mut staged = current.clone();
        staged.apply_patch(patch).map_err(|err| {
            info!(
                "event=record_edit module=service status=rejected index={} error_code={}",
                index,
                err.code()
            );
            err
        })?;

        let previous = std::mem::replace(&mut self.records[index], staged);
        if let Err(err) = self.persist("record_edit") {
            self.records[index] = previous;
            return Err(err);
        }

        info!("event=record_edit module=service status=ok index={}", index);
        Ok(&self.records[index])
    }

    /// Removes the record at `index`, persists, and returns it.
    ///
    /// # Errors
    /// - `IndexOutOfRange` when `index >= len`; nothing is written.
    /// - `Store` when the rewrite fails; the record is reinserted.
    pub fn delete(&mut self, index: usize) -> ServiceResult<Record> {
        self.checked(index)?;
        let removed = self.records.remove(index);
        if let Err(err) = self.persist("record_delete") {
            self.records.insert(index, removed);
            return Err(err);
        }

        info!(
            "event=record_delete module=service status=ok index={} total={}",
            index,
            self.records.len()
        );
        Ok(removed)
    }

    fn checked(&self, index: usize) -> ServiceResult<&Record> {
        self.records.get(index).ok_or_else(|| {
            info!(
                "event=record_lookup module=service status=rejected index={} error_code=index_out_of_range",
                index
            );
            ServiceError::IndexOutOfRange {
                index,
                len: self.records.len(),
            }
        })
    }

    fn persist(&self, event: &str) -> ServiceResult<()> {
        self.store.save(&self.records).map_err(|err| {
            error!(
                "event={} module=service status=error error_code=persist_failed error={}",
                event, err
            );
            ServiceError::Store(err)
        })
    }
}
