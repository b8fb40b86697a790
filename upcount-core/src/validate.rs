//! Shape validation for untyped entity payloads.
//!
//! Payloads arrive from the remote store as arbitrary JSON. The `parse_*`
//! functions decide whether a value has the shape of a [`User`], [`Goal`] or
//! [`Log`] and, on success, return the typed entity. The `validate_*`
//! functions are the boolean form (`parse_*(..).is_ok()`).
//!
//! # Rules
//!
//! - The value must be an object and every required field must be present as
//!   a key. Presence is all that is checked for required fields: `0` and `""`
//!   count as present.
//! - A string-typed field passes if it is a string or if it is falsy (`""`,
//!   `0`, `false`, `null`). Falsy values are read as absent. Only a truthy
//!   value of the wrong type is rejected.
//! - Numeric fields must be JSON numbers, unconditionally. `0` is a number.
//! - Timestamp fields must parse as a real calendar date. Optional timestamps
//!   (`User.updatedAt`, `Goal.deadline`) are only checked when truthy.
//! - `User.email` must look like `local@domain.tld`.
//!
//! Validation never mutates its input and always gives the same answer for
//! the same value.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::format::parse_timestamp;
use crate::models::{Goal, Log, User};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Why a payload failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("expected an object")]
    NotAnObject,

    #[error("expected an array")]
    NotAnArray,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must be a string")]
    NotAString(&'static str),

    #[error("field `{0}` must be a number")]
    NotANumber(&'static str),

    #[error("field `{field}` is not a valid date: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("field `email` is not a valid address: {0:?}")]
    InvalidEmail(String),

    #[error("element {index}: {source}")]
    Element {
        index: usize,
        source: Box<ShapeError>,
    },
}

impl ShapeError {
    /// The field that failed, if the failure is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField(f) | Self::NotAString(f) | Self::NotANumber(f) => Some(*f),
            Self::InvalidTimestamp { field, .. } => Some(*field),
            Self::InvalidEmail(_) => Some("email"),
            Self::Element { source, .. } => source.field(),
            Self::NotAnObject | Self::NotAnArray => None,
        }
    }
}

/// An entity that can be promoted from an untyped payload.
pub trait Entity: Sized {
    /// Human-readable kind, used in logs and messages.
    const KIND: &'static str;

    fn parse(value: &Value) -> Result<Self, ShapeError>;

    /// The entity's own identifier.
    fn id(&self) -> &str;
}

impl Entity for User {
    const KIND: &'static str = "user";

    fn parse(value: &Value) -> Result<Self, ShapeError> {
        parse_user(value)
    }

    fn id(&self) -> &str {
        &self.user_id
    }
}

impl Entity for Goal {
    const KIND: &'static str = "goal";

    fn parse(value: &Value) -> Result<Self, ShapeError> {
        parse_goal(value)
    }

    fn id(&self) -> &str {
        &self.goal_id
    }
}

impl Entity for Log {
    const KIND: &'static str = "log";

    fn parse(value: &Value) -> Result<Self, ShapeError> {
        parse_log(value)
    }

    fn id(&self) -> &str {
        &self.log_id
    }
}

const USER_REQUIRED: &[&str] = &["userId", "email", "createdAt"];
const USER_STRINGS: &[&str] = &["userId", "email", "displayName", "createdAt", "updatedAt"];

const GOAL_REQUIRED: &[&str] = &[
    "goalId",
    "userId",
    "title",
    "targetValue",
    "currentValue",
    "unit",
    "createdAt",
    "updatedAt",
];
const GOAL_STRINGS: &[&str] = &[
    "goalId",
    "userId",
    "title",
    "description",
    "unit",
    "deadline",
    "category",
    "status",
    "createdAt",
    "updatedAt",
];
const GOAL_NUMBERS: &[&str] = &["targetValue", "currentValue"];

const LOG_REQUIRED: &[&str] = &["logId", "goalId", "userId", "value", "timestamp", "createdAt"];
const LOG_STRINGS: &[&str] = &["logId", "goalId", "userId", "notes", "timestamp", "createdAt"];
const LOG_NUMBERS: &[&str] = &["value"];

/// Parse a [`User`] payload.
pub fn parse_user(value: &Value) -> Result<User, ShapeError> {
    let record = Record::new(value)?;
    record.require(USER_REQUIRED)?;
    record.check_strings(USER_STRINGS)?;

    let email = record.string("email")?.unwrap_or_default();
    if !EMAIL_PATTERN.is_match(&email) {
        return Err(ShapeError::InvalidEmail(email));
    }

    let created_at = record.timestamp("createdAt")?;
    let updated_at = record.optional_timestamp("updatedAt")?;

    Ok(User {
        user_id: record.string("userId")?.unwrap_or_default(),
        email,
        display_name: record.string("displayName")?,
        created_at,
        updated_at,
    })
}

/// Parse a [`Goal`] payload.
pub fn parse_goal(value: &Value) -> Result<Goal, ShapeError> {
    let record = Record::new(value)?;
    record.require(GOAL_REQUIRED)?;
    record.check_strings(GOAL_STRINGS)?;
    record.check_numbers(GOAL_NUMBERS)?;

    let created_at = record.timestamp("createdAt")?;
    let updated_at = record.timestamp("updatedAt")?;
    let deadline = record.optional_timestamp("deadline")?;

    Ok(Goal {
        goal_id: record.string("goalId")?.unwrap_or_default(),
        user_id: record.string("userId")?.unwrap_or_default(),
        title: record.string("title")?.unwrap_or_default(),
        description: record.string("description")?,
        target_value: record.number("targetValue")?,
        current_value: record.number("currentValue")?,
        unit: record.string("unit")?.unwrap_or_default(),
        deadline,
        category: record.string("category")?,
        status: record.string("status")?,
        created_at,
        updated_at,
    })
}

/// Parse a [`Log`] payload.
pub fn parse_log(value: &Value) -> Result<Log, ShapeError> {
    let record = Record::new(value)?;
    record.require(LOG_REQUIRED)?;
    record.check_strings(LOG_STRINGS)?;
    record.check_numbers(LOG_NUMBERS)?;

    let timestamp = record.timestamp("timestamp")?;
    let created_at = record.timestamp("createdAt")?;

    Ok(Log {
        log_id: record.string("logId")?.unwrap_or_default(),
        goal_id: record.string("goalId")?.unwrap_or_default(),
        user_id: record.string("userId")?.unwrap_or_default(),
        value: record.number("value")?,
        notes: record.string("notes")?,
        timestamp,
        created_at,
    })
}

pub fn validate_user(value: &Value) -> bool {
    parse_user(value).is_ok()
}

pub fn validate_goal(value: &Value) -> bool {
    parse_goal(value).is_ok()
}

pub fn validate_log(value: &Value) -> bool {
    parse_log(value).is_ok()
}

/// Parse an array payload, failing on the first element that does not parse.
pub fn parse_list<T: Entity>(value: &Value) -> Result<Vec<T>, ShapeError> {
    let items = value.as_array().ok_or(ShapeError::NotAnArray)?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            T::parse(item).map_err(|e| ShapeError::Element {
                index,
                source: Box::new(e),
            })
        })
        .collect()
}

pub fn parse_goals(value: &Value) -> Result<Vec<Goal>, ShapeError> {
    parse_list(value)
}

pub fn parse_logs(value: &Value) -> Result<Vec<Log>, ShapeError> {
    parse_list(value)
}

/// JavaScript-style falsiness for JSON values: `null`, `false`, `0` and `""`.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Read-only view of an object payload.
struct Record<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Record<'a> {
    fn new(value: &'a Value) -> Result<Self, ShapeError> {
        value
            .as_object()
            .map(|fields| Self { fields })
            .ok_or(ShapeError::NotAnObject)
    }

    fn require(&self, names: &[&'static str]) -> Result<(), ShapeError> {
        match names.iter().find(|name| !self.fields.contains_key(**name)) {
            Some(name) => Err(ShapeError::MissingField(*name)),
            None => Ok(()),
        }
    }

    fn check_strings(&self, names: &[&'static str]) -> Result<(), ShapeError> {
        names.iter().try_for_each(|name| self.string(*name).map(|_| ()))
    }

    fn check_numbers(&self, names: &[&'static str]) -> Result<(), ShapeError> {
        names.iter().try_for_each(|name| self.number(*name).map(|_| ()))
    }

    /// A string-typed field. Absent and falsy values read as `None`.
    fn string(&self, name: &'static str) -> Result<Option<String>, ShapeError> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(v) if is_falsy(v) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ShapeError::NotAString(name)),
        }
    }

    fn number(&self, name: &'static str) -> Result<f64, ShapeError> {
        self.fields
            .get(name)
            .and_then(Value::as_f64)
            .ok_or(ShapeError::NotANumber(name))
    }

    /// A timestamp field that is always checked.
    fn timestamp(&self, name: &'static str) -> Result<String, ShapeError> {
        let raw = self.string(name)?.unwrap_or_default();
        match parse_timestamp(&raw) {
            Some(_) => Ok(raw),
            None => Err(ShapeError::InvalidTimestamp {
                field: name,
                value: raw,
            }),
        }
    }

    /// A timestamp field that is only checked when present and truthy.
    fn optional_timestamp(&self, name: &'static str) -> Result<Option<String>, ShapeError> {
        match self.string(name)? {
            None => Ok(None),
            Some(raw) if parse_timestamp(&raw).is_some() => Ok(Some(raw)),
            Some(raw) => Err(ShapeError::InvalidTimestamp {
                field: name,
                value: raw,
            }),
        }
    }
}
