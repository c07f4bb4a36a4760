//! Static attribute classification for the leak test measurement
//!
//! One authoritative table maps every stored attribute to its column
//! name, storage kind, and declared value type. The point mapper and the
//! predicate builder both consult this table, so the write path and the
//! query path can never disagree on column names.

/// How an attribute is materialized in the time-series store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    /// Becomes the point's timestamp
    Timestamp,
    /// Indexed, string-valued column used for fast equality filtering
    IndexedTag,
    /// Plain field column
    Field,
}

/// Declared storage type of an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    DateTime,
    Uuid,
    Text,
}

/// One row of the classification table
#[derive(Debug, Clone, Copy)]
pub struct Attribute {
    /// Canonical stored column name
    pub column: &'static str,
    pub kind: AttrKind,
    pub value_type: AttrType,
}

/// The full classification table, in write order
pub const ATTRIBUTES: &[Attribute] = &[
    Attribute {
        column: "TimeStamp",
        kind: AttrKind::Timestamp,
        value_type: AttrType::DateTime,
    },
    Attribute {
        column: "TestObjectId",
        kind: AttrKind::IndexedTag,
        value_type: AttrType::Uuid,
    },
    Attribute {
        column: "Status",
        kind: AttrKind::IndexedTag,
        value_type: AttrType::Text,
    },
    Attribute {
        column: "MachineId",
        kind: AttrKind::IndexedTag,
        value_type: AttrType::Uuid,
    },
    Attribute {
        column: "TestObjectType",
        kind: AttrKind::IndexedTag,
        value_type: AttrType::Text,
    },
    Attribute {
        column: "User",
        kind: AttrKind::IndexedTag,
        value_type: AttrType::Text,
    },
    Attribute {
        column: "SniffingPoint",
        kind: AttrKind::Field,
        value_type: AttrType::Text,
    },
    Attribute {
        column: "Reason",
        kind: AttrKind::Field,
        value_type: AttrType::Text,
    },
    Attribute {
        column: "LeakTestId",
        kind: AttrKind::Field,
        value_type: AttrType::Uuid,
    },
];

/// Look up an attribute by its canonical column name
pub fn find(column: &str) -> Option<&'static Attribute> {
    ATTRIBUTES.iter().find(|attribute| attribute.column == column)
}

/// Check whether a client-supplied key refers to a known attribute.
///
/// The key does not have to equal an attribute name exactly, it only has
/// to be found as a case-insensitive substring of one.
pub fn key_is_known(key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    let needle = key.to_lowercase();
    ATTRIBUTES
        .iter()
        .any(|attribute| attribute.column.to_lowercase().contains(&needle))
}

/// Normalize a client-supplied key to its canonical stored column name.
///
/// The first letter is upper-cased and the rest is kept as supplied. The
/// two known multi-word names additionally get their interior word
/// boundaries re-capitalized from a closed lookup keyed by the
/// lower-cased name. This is not a general camel-casing pass: a new
/// multi-word attribute needs a new entry here.
pub fn canonical_column(key: &str) -> String {
    let mut chars: Vec<char> = key.chars().collect();
    if let Some(first) = chars.first_mut() {
        *first = first.to_ascii_uppercase();
    }
    match key.to_lowercase().as_str() {
        "sniffingpoint" => {
            chars[8] = chars[8].to_ascii_uppercase();
        }
        "leaktestid" => {
            chars[4] = chars[4].to_ascii_uppercase();
            chars[8] = chars[8].to_ascii_uppercase();
        }
        _ => {}
    }
    chars.into_iter().collect()
}
