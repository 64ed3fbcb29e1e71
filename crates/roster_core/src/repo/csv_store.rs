//! Record store contract and CSV file implementation.
//!
//! # Responsibility
//! - Decode stored rows into validated records (`load`).
//! - Rewrite the whole store from the in-memory collection (`save`).
//!
//! # Invariants
//! - A missing store file loads as an empty roster.
//! - Rows that fail decoding or validation are dropped and logged, never
//!   surfaced as errors.
//! - `save` writes a sibling temp file and renames it over the target, so
//!   readers see either the old or the new content.
//! - Phone numbers are written as raw digits.
//! - A rewrite keeps the existing file's permissions and, for a symlinked
//!   path, replaces the link target.

use crate::model::employee::{Record, RecordFields, RecordKind, ValidationError};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::{error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, File, Permissions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// Header row written at the top of every store file.
pub const CSV_HEADERS: [&str; 7] = [
    "id",
    "fname",
    "lname",
    "department",
    "phNumber",
    "role",
    "team_size",
];

/// Default store location, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "employee_data.csv";

#[cfg(unix)]
const NEW_STORE_MODE: u32 = 0o644;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure. Malformed rows are not errors.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "store i/o failed: {err}"),
            Self::Csv(err) => write!(f, "store encoding failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for StoreError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<tempfile::PersistError> for StoreError {
    fn from(value: tempfile::PersistError) -> Self {
        Self::Io(value.error)
    }
}

/// Persistence contract for the record collection.
pub trait RecordStore {
    /// Reads every decodable, valid record in stored order.
    fn load(&self) -> StoreResult<Vec<Record>>;
    /// Replaces the stored collection with `records`.
    fn save(&self, records: &[Record]) -> StoreResult<()>;
}

/// CSV file-backed record store.
#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    path: PathBuf,
}

impl CsvRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Follows a symlinked store path so the rename replaces the link
    /// target, not the link.
    fn resolve_target(&self) -> StoreResult<PathBuf> {
        match fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.file_type().is_symlink() => Ok(fs::canonicalize(&self.path)?),
            Ok(_) => Ok(self.path.clone()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(self.path.clone()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_to(file: &mut NamedTempFile, records: &[Record]) -> StoreResult<()> {
        encode_records(records, file.as_file_mut())?;
        file.as_file().sync_all()?;
        Ok(())
    }
}

/// Permissions of the current store file, `None` when it does not exist yet.
fn existing_permissions(target: &Path) -> StoreResult<Option<Permissions>> {
    match fs::metadata(target) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Creation mode for the temp file; the process umask still applies.

#[cfg(unix)]
fn new_store_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(NEW_STORE_MODE))
}

#[cfg(not(unix))]
fn new_store_permissions() -> Option<Permissions> {
    None
}

impl Default for CsvRecordStore {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_FILE)
    }
}

impl RecordStore for CsvRecordStore {
    fn load(&self) -> StoreResult<Vec<Record>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    "event=store_load module=repo status=ok path={} loaded=0 reason=missing_file",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(err) => {
                error!(
                    "event=store_load module=repo status=error path={} error_code=open_failed error={}",
                    self.path.display(),
                    err
                );
                return Err(err.into());
            }
        };

        let outcome = decode_records(file)?;
        info!(
            "event=store_load module=repo status=ok path={} loaded={} skipped={}",
            self.path.display(),
            outcome.records.len(),
            outcome.skipped
        );
        Ok(outcome.records)
    }

    fn save(&self, records: &[Record]) -> StoreResult<()> {
        let result = self.resolve_target().and_then(|target| {
            let dir = match target.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let existing = existing_permissions(&target)?;
            let mut builder = Builder::new();
            if let Some(permissions) = new_store_permissions() {
                builder.permissions(permissions);
            }
            let mut file = builder.tempfile_in(dir)?;
            if let Some(permissions) = existing {
                file.as_file().set_permissions(permissions)?;
            }
            Self::write_to(&mut file, records)?;
            file.persist(&target)?;
            Ok(())
        });

        match &result {
            Ok(()) => info!(
                "event=store_save module=repo status=ok path={} rows={}",
                self.path.display(),
                records.len()
            ),
            Err(err) => error!(
                "event=store_save module=repo status=error path={} error_code=save_failed error={}",
                self.path.display(),
                err
            ),
        }
        result
    }
}

/// Result of decoding a store, with the count of dropped rows.
#[derive(Debug, Default)]
pub struct DecodeOutcome {
    pub records: Vec<Record>,
    pub skipped: usize,
}

/// Decodes CSV content into records, dropping rows that cannot be decoded
/// or that fail field validation.
///
/// # Errors
/// - Returns an error only when the header row itself is unreadable.
pub fn decode_records(source: impl Read) -> StoreResult<DecodeOutcome> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);
    let columns = ColumnMap::from_headers(reader.headers()?);
    let mut outcome = DecodeOutcome::default();

    for (index, row) in reader.records().enumerate() {
        // Header occupies line 1.
        let fallback_line = index as u64 + 2;
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                let line = err.position().map_or(fallback_line, |pos| pos.line());
                warn!(
                    "event=store_row_skipped module=repo status=warn line={} error_code=undecodable_row",
                    line
                );
                outcome.skipped += 1;
                continue;
            }
        };
        let line = row.position().map_or(fallback_line, |pos| pos.line());

        match columns.decode(&row) {
            Ok(record) => outcome.records.push(record),
            Err(reason) => {
                warn!(
                    "event=store_row_skipped module=repo status=warn line={} error_code={}",
                    line,
                    reason.code()
                );
                outcome.skipped += 1;
            }
        }
    }

    Ok(outcome)
}

/// Why a single row was dropped.
enum RowRejection {
    MissingColumn,
    Invalid(ValidationError),
}

impl RowRejection {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingColumn => "missing_column",
            Self::Invalid(err) => err.code(),
        }
    }
}

impl From<ValidationError> for RowRejection {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// Header name → column position lookup, resolved once per file.
struct ColumnMap {
    id: Option<usize>,
    first_name: Option<usize>,
    last_name: Option<usize>,
    department: Option<usize>,
    phone_number: Option<usize>,
    role: Option<usize>,
    team_size: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let position = |name: &str| headers.iter().position(|header| header == name);
        Self {
            id: position(CSV_HEADERS[0]),
            first_name: position(CSV_HEADERS[1]),
            last_name: position(CSV_HEADERS[2]),
            department: position(CSV_HEADERS[3]),
            phone_number: position(CSV_HEADERS[4]),
            role: position(CSV_HEADERS[5]),
            team_size: position(CSV_HEADERS[6]),
        }
    }

    fn decode(&self, row: &StringRecord) -> Result<Record, RowRejection> {
        let required = |column: Option<usize>| {
            column
                .and_then(|index| row.get(index))
                .map(str::to_string)
                .ok_or(RowRejection::MissingColumn)
        };
        let optional = |column: Option<usize>| column.and_then(|index| row.get(index));

        let team_size = match optional(self.role) {
            Some(role) if role == RecordKind::Manager.as_str() => {
                Some(parse_stored_team_size(optional(self.team_size)))
            }
            _ => None,
        };

        let record = Record::new(RecordFields {
            id: required(self.id)?,
            first_name: required(self.first_name)?,
            last_name: required(self.last_name)?,
            department: required(self.department)?,
            phone_number: required(self.phone_number)?,
            team_size,
        })?;
        Ok(record)
    }
}

/// Stored team sizes fall back to 0 unless the column is a plain
/// non-negative decimal.
fn parse_stored_team_size(value: Option<&str>) -> i64 {
    let trimmed = value.unwrap_or("").trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return 0;
    }
    trimmed.parse::<u32>().map(i64::from).unwrap_or(0)
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    fname: &'a str,
    lname: &'a str,
    department: &'a str,
    #[serde(rename = "phNumber")]
    ph_number: &'a str,
    role: &'static str,
    team_size: u32,
}

impl<'a> From<&'a Record> for CsvRow<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            id: record.id(),
            fname: record.first_name(),
            lname: record.last_name(),
            department: record.department(),
            ph_number: record.phone_number_raw(),
            role: record.kind().as_str(),
            team_size: record.team_size().unwrap_or(0),
        }
    }
}

/// Encodes records exactly as `save` writes them.
pub fn encode_records(records: &[Record], sink: impl Write) -> StoreResult<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(sink);
    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}
