//! # LeakTest Core Library
//!
//! Shared library providing the leak test domain model and the pieces
//! that keep its storage representation coherent:
//!
//! - **Data model**: the `LeakTest` entity and the `TimeRange` query window
//! - **Attribute table**: one static classification of every attribute as
//!   timestamp, indexed tag, or plain field
//! - **Query translation**: typed equality predicates built from plain
//!   key/value strings
//! - **Point mapping**: entity to write-point and stored record to entity
//! - **Validation**: rule checks that accumulate every violation
//!
//! The service crate builds its repository, request handler, and broker
//! messaging on top of these types.

pub mod attrs;
pub mod error;
pub mod model;
pub mod point;
pub mod predicate;
pub mod time;
pub mod validation;

// Re-export commonly used types
pub use attrs::{AttrKind, AttrType, Attribute, ATTRIBUTES};
pub use error::{LeakTestError, LeakTestResult};
pub use model::LeakTest;
pub use point::{Point, Record, WritePrecision};
pub use predicate::{Predicate, TypedValue};
pub use time::TimeRange;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The measurement name every leak test point is written under
pub const MEASUREMENT: &str = "LeakTest";

/// Maximum length for the sniffing point identifier
pub const MAX_SNIFFING_POINT_LENGTH: usize = 999;
