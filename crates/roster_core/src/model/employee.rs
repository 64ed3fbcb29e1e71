//! Employee/manager record model.
//!
//! # Responsibility
//! - Define the canonical roster record shared by the codec and services.
//! - Own every field-level validation rule.
//!
//! # Invariants
//! - `id` is set at construction and has no setter.
//! - Every setter validates before mutating; a rejected value leaves the
//!   previous one in place.
//! - Record kind is fixed at construction: a record is a manager iff it
//!   carries a `ManagerExtension`.
//! - `phone_number` is stored as exactly 10 ASCII digits.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

static DEPARTMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid department regex"));

const PHONE_DIGITS: usize = 10;

/// Closed set of record variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    Employee,
    Manager,
}

impl RecordKind {
    /// Stable role label used in the `role` storage column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "Employee",
            Self::Manager => "Manager",
        }
    }
}

/// Which of the two name fields a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    First,
    Last,
}

impl Display for NameField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => f.write_str("first name"),
            Self::Last => f.write_str("last name"),
        }
    }
}

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName(NameField),
    NameContainsDigit(NameField),
    InvalidDepartment(String),
    /// Carries the number of digits left after stripping punctuation.
    InvalidPhoneNumber { digits: usize },
    InvalidTeamSize(String),
    /// Team size was supplied for a record that is not a manager.
    NotAManager(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName(field) => write!(f, "{field} cannot be empty"),
            Self::NameContainsDigit(field) => write!(f, "{field} cannot contain digits"),
            Self::InvalidDepartment(value) => write!(
                f,
                "department must be exactly 3 uppercase letters, got `{value}`"
            ),
            Self::InvalidPhoneNumber { digits } => write!(
                f,
                "phone number must contain exactly {PHONE_DIGITS} digits, got {digits}"
            ),
            Self::InvalidTeamSize(value) => write!(
                f,
                "team size must be a non-negative integer, got `{value}`"
            ),
            Self::NotAManager(id) => write!(f, "employee `{id}` is not a manager"),
        }
    }
}

impl ValidationError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyName(_) => "empty_name",
            Self::NameContainsDigit(_) => "name_contains_digit",
            Self::InvalidDepartment(_) => "invalid_department",
            Self::InvalidPhoneNumber { .. } => "invalid_phone_number",
            Self::InvalidTeamSize(_) => "invalid_team_size",
            Self::NotAManager(_) => "not_a_manager",
        }
    }
}

impl Error for ValidationError {}

/// Manager-only data carried alongside the base record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ManagerExtension {
    team_size: u32,
}

/// Input for constructing a record.
///
/// `team_size: Some(_)` selects `RecordKind::Manager`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFields {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    /// Any punctuated form; normalized on construction.
    pub phone_number: String,
    pub team_size: Option<i64>,
}

impl RecordFields {
    pub fn kind(&self) -> RecordKind {
        if self.team_size.is_some() {
            RecordKind::Manager
        } else {
            RecordKind::Employee
        }
    }
}

/// Partial update applied by `Record::apply_patch`. `None` keeps the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: Option<String>,
    pub phone_number: Option<String>,
    pub team_size: Option<i64>,
}

/// Roster record: an employee, optionally extended with manager data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    id: String,
    first_name: String,
    last_name: String,
    department: String,
    phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    manager: Option<ManagerExtension>,
}

impl Record {
    /// Builds a record, routing every field through its validated setter.
    ///
    /// # Errors
    /// - Returns the first `ValidationError` raised by a setter.
    pub fn new(fields: RecordFields) -> Result<Self, ValidationError> {
        let manager = match fields.team_size {
            Some(team_size) => Some(ManagerExtension {
                team_size: checked_team_size(team_size)?,
            }),
            None => None,
        };

        let mut record = Self {
            id: fields.id,
            first_name: String::new(),
            last_name: String::new(),
            department: String::new(),
            phone_number: String::new(),
            manager,
        };
        record.set_first_name(fields.first_name)?;
        record.set_last_name(fields.last_name)?;
        record.set_department(fields.department)?;
        record.set_phone_number(&fields.phone_number)?;
        Ok(record)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn kind(&self) -> RecordKind {
        match self.manager {
            Some(_) => RecordKind::Manager,
            None => RecordKind::Employee,
        }
    }

    /// Team size for managers, `None` for plain employees.
    pub fn team_size(&self) -> Option<u32> {
        self.manager.map(|ext| ext.team_size)
    }

    pub fn set_first_name(&mut self, value: impl Into<String>) -> Result<(), ValidationError> {
        let value = value.into();
        validate_name(NameField::First, &value)?;
        self.first_name = value;
        Ok(())
    }

    pub fn set_last_name(&mut self, value: impl Into<String>) -> Result<(), ValidationError> {
        let value = value.into();
        validate_name(NameField::Last, &value)?;
        self.last_name = value;
        Ok(())
    }

    pub fn set_department(&mut self, value: impl Into<String>) -> Result<(), ValidationError> {
        let value = value.into();
        if !DEPARTMENT_RE.is_match(&value) {
            return Err(ValidationError::InvalidDepartment(value));
        }
        self.department = value;
        Ok(())
    }

    /// Normalizes `value` to its digits and stores them.
    ///
    /// Accepts `(555) 123-4567`, `555.123.4567`, `5551234567`, etc.
    pub fn set_phone_number(&mut self, value: &str) -> Result<(), ValidationError> {
        let digits = normalize_phone_number(value);
        if digits.len() != PHONE_DIGITS {
            return Err(ValidationError::InvalidPhoneNumber {
                digits: digits.len(),
            });
        }
        self.phone_number = digits;
        Ok(())
    }

    /// Sets the manager team size.
    ///
    /// # Errors
    /// - `NotAManager` when called on a plain employee.
    /// - `InvalidTeamSize` for negative values, or values above `u32::MAX`
    ///   (team sizes are stored as `u32`).
    pub fn set_team_size(&mut self, value: i64) -> Result<(), ValidationError> {
        let team_size = checked_team_size(value)?;
        match self.manager.as_mut() {
            Some(ext) => {
                ext.team_size = team_size;
                Ok(())
            }
            None => Err(ValidationError::NotAManager(self.id.clone())),
        }
    }

    /// Stored digits, used for persistence.
    pub fn phone_number_raw(&self) -> &str {
        &self.phone_number
    }

    /// Display form `(AAA)BBB-CCCC`.
    pub fn phone_number_formatted(&self) -> String {
        let digits = &self.phone_number;
        format!("({}){}-{}", &digits[..3], &digits[3..6], &digits[6..])
    }

    /// Applies every supplied field in order: names, department, phone,
    /// team size.
    ///
    /// Setters run in place, so a failure part-way leaves earlier fields
    /// updated. Callers that need all-or-nothing should patch a clone.
    pub fn apply_patch(&mut self, patch: &RecordPatch) -> Result<(), ValidationError> {
        if let Some(value) = &patch.first_name {
            self.set_first_name(value.as_str())?;
        }
        if let Some(value) = &patch.last_name {
            self.set_last_name(value.as_str())?;
        }
        if let Some(value) = &patch.department {
            self.set_department(value.as_str())?;
        }
        if let Some(value) = &patch.phone_number {
            self.set_phone_number(value)?;
        }
        if let Some(value) = patch.team_size {
            self.set_team_size(value)?;
        }
        Ok(())
    }

    /// Full display line, e.g. `Employee[E100]: Jane Doe, Dept: HRM, Phone: (123)456-7890`.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Employee[{}]: {} {}, Dept: {}, Phone: {}",
            self.id,
            self.first_name,
            self.last_name,
            self.department,
            self.phone_number_formatted()
        )?;
        if let Some(ext) = &self.manager {
            write!(f, " (Mgr, team: {})", ext.team_size)?;
        }
        Ok(())
    }
}

/// Parses free-form team size text (prompt input).
pub fn parse_team_size(text: &str) -> Result<u32, ValidationError> {
    let trimmed = text.trim();
    let value = trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidTeamSize(trimmed.to_string()))?;
    checked_team_size(value)
}

/// Strips everything except ASCII digits.
pub fn normalize_phone_number(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn validate_name(field: NameField, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyName(field));
    }
    if value.chars().any(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::NameContainsDigit(field));
    }
    Ok(())
}

fn checked_team_size(value: i64) -> Result<u32, ValidationError> {
    u32::try_from(value).map_err(|_| ValidationError::InvalidTeamSize(value.to_string()))
}
