//! Typed equality predicates built from client key/value pairs
//!
//! This is the open-ended "query by any column" surface: a client hands
//! over a key and a value as plain strings, and gets back a typed
//! predicate against the canonical stored columns, without any query
//! language in between.

use uuid::Uuid;

use crate::attrs;
use crate::error::{LeakTestError, LeakTestResult};
use crate::point::Record;

/// A comparand with its inferred storage type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Uuid(Uuid),
}

/// Closed predicate algebra interpreted by the storage query layer
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column == value`
    Equals { column: String, value: TypedValue },
}

/// Build a typed equality predicate from a client-supplied key/value pair.
///
/// The key is validated against the attribute table before any store
/// access and then normalized to its canonical column name. The Status
/// and User columns are stored upper-case, so comparands against them
/// are upper-cased to match. A value that parses as a UUID is compared
/// as one, anything else is compared as text.
pub fn build_predicate(key: &str, value: &str) -> LeakTestResult<Predicate> {
    if !attrs::key_is_known(key) {
        return Err(LeakTestError::unknown_key(key));
    }

    let column = attrs::canonical_column(key);

    let value = if column == "Status" || column == "User" {
        value.to_uppercase()
    } else {
        value.to_string()
    };

    let value = match Uuid::parse_str(&value) {
        Ok(uuid) => TypedValue::Uuid(uuid),
        Err(_) => TypedValue::Text(value),
    };

    Ok(Predicate::Equals { column, value })
}

impl Predicate {
    /// Column this predicate filters on
    pub fn column(&self) -> &str {
        match self {
            Predicate::Equals { column, .. } => column,
        }
    }

    /// Evaluate against a stored record.
    ///
    /// Stored values are strings; when the comparand is UUID-typed the
    /// stored value is coerced to a UUID before comparing, so formatting
    /// differences in the stored text cannot cause a mismatch.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Equals { column, value } => {
                let stored = match record.column(column) {
                    Some(stored) => stored,
                    None => return false,
                };
                match value {
                    TypedValue::Text(text) => stored == text,
                    TypedValue::Uuid(uuid) => Uuid::parse_str(stored)
                        .map(|parsed| parsed == *uuid)
                        .unwrap_or(false),
                }
            }
        }
    }
}
