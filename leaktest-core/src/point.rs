//! Entity to write-point mapping for the time-series store
//!
//! Both directions walk the attribute classification table, so a written
//! point and a record read back from it always agree on column names.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::attrs::{self, AttrKind};
use crate::error::{LeakTestError, LeakTestResult};
use crate::model::LeakTest;

/// Column a record's measurement name is read back from
pub const MEASUREMENT_COLUMN: &str = "_measurement";

/// Timestamp precision applied when writing points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritePrecision {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl WritePrecision {
    /// Truncate a timestamp to this precision
    pub fn truncate(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            WritePrecision::Seconds => Utc
                .timestamp_opt(timestamp.timestamp(), 0)
                .single()
                .unwrap_or(timestamp),
            WritePrecision::Milliseconds => Utc
                .timestamp_millis_opt(timestamp.timestamp_millis())
                .single()
                .unwrap_or(timestamp),
            WritePrecision::Microseconds => {
                let micros = timestamp.timestamp_micros();
                let secs = micros.div_euclid(1_000_000);
                let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
                Utc.timestamp_opt(secs, nanos).single().unwrap_or(timestamp)
            }
            WritePrecision::Nanoseconds => timestamp,
        }
    }
}

/// One writable point: a measurement name, a timestamp, indexed tag
/// columns, and plain field columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub measurement: String,
    pub timestamp: DateTime<Utc>,
    pub tags: HashMap<String, String>,
    pub fields: HashMap<String, String>,
}

impl Point {
    /// View this point the way a query reads it back
    pub fn to_record(&self) -> Record {
        let mut record = Record::new(Some(self.timestamp));
        record.insert(MEASUREMENT_COLUMN, &self.measurement);
        for (name, value) in self.tags.iter().chain(self.fields.iter()) {
            record.insert(name, value);
        }
        record
    }
}

/// One stored record read back from the store, column name to value
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub timestamp: Option<DateTime<Utc>>,
    columns: HashMap<String, String>,
}

impl Record {
    pub fn new(timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            timestamp,
            columns: HashMap::new(),
        }
    }

    pub fn insert<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.columns.insert(name.into(), value.into());
    }

    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(String::as_str)
    }
}

/// Map an entity onto a writable point using the attribute table.
///
/// The identity must already be assigned; mapping never mints one. An
/// absent optional attribute is simply not written.
pub fn to_point(leak_test: &LeakTest, precision: WritePrecision) -> LeakTestResult<Point> {
    if leak_test.measurement.is_empty() {
        return Err(LeakTestError::mapping("Measurement name cannot be empty."));
    }
    if leak_test.leak_test_id.is_none() {
        return Err(LeakTestError::mapping("LeakTestId is not set."));
    }

    let mut point = Point {
        measurement: leak_test.measurement.clone(),
        timestamp: precision.truncate(leak_test.time_stamp),
        tags: HashMap::new(),
        fields: HashMap::new(),
    };

    for attribute in attrs::ATTRIBUTES {
        let value = match attribute_value(leak_test, attribute.column) {
            Some(value) => value,
            None => continue,
        };
        match attribute.kind {
            AttrKind::Timestamp => {}
            AttrKind::IndexedTag => {
                point.tags.insert(attribute.column.to_string(), value);
            }
            AttrKind::Field => {
                point.fields.insert(attribute.column.to_string(), value);
            }
        }
    }

    Ok(point)
}

/// Map a batch onto points, failing on the first unmappable entity
pub fn to_points(
    leak_tests: &[LeakTest],
    precision: WritePrecision,
) -> LeakTestResult<Vec<Point>> {
    leak_tests
        .iter()
        .map(|leak_test| to_point(leak_test, precision))
        .collect()
}

fn attribute_value(leak_test: &LeakTest, column: &str) -> Option<String> {
    match column {
        "TestObjectId" => Some(leak_test.test_object_id.to_string()),
        "Status" => Some(leak_test.status.clone()),
        "MachineId" => Some(leak_test.machine_id.to_string()),
        "TestObjectType" => Some(leak_test.test_object_type.clone()),
        "User" => Some(leak_test.user.clone()),
        "SniffingPoint" => Some(leak_test.sniffing_point.clone()),
        "Reason" => leak_test.reason.clone(),
        "LeakTestId" => leak_test.leak_test_id.map(|id| id.to_string()),
        _ => None,
    }
}

/// Rebuild an entity from a stored record.
///
/// Required columns that are missing or malformed fail with a mapping
/// error carrying the underlying cause; optional columns default to
/// absent.
pub fn from_record(record: &Record) -> LeakTestResult<LeakTest> {
    let time_stamp = record
        .timestamp
        .ok_or_else(|| missing_column("TimeStamp"))?;

    Ok(LeakTest {
        leak_test_id: Some(uuid_column(record, "LeakTestId")?),
        time_stamp,
        machine_id: uuid_column(record, "MachineId")?,
        test_object_id: uuid_column(record, "TestObjectId")?,
        test_object_type: required_column(record, "TestObjectType")?,
        sniffing_point: required_column(record, "SniffingPoint")?,
        status: required_column(record, "Status")?,
        user: required_column(record, "User")?,
        reason: record.column("Reason").map(str::to_string),
        measurement: required_column(record, MEASUREMENT_COLUMN)?,
        links: None,
    })
}

fn missing_column(column: &str) -> LeakTestError {
    LeakTestError::mapping(format!("Required column '{}' is missing.", column))
}

fn required_column(record: &Record, column: &str) -> LeakTestResult<String> {
    record
        .column(column)
        .map(str::to_string)
        .ok_or_else(|| missing_column(column))
}

fn uuid_column(record: &Record, column: &str) -> LeakTestResult<Uuid> {
    let raw = record.column(column).ok_or_else(|| missing_column(column))?;
    Uuid::parse_str(raw).map_err(|e| {
        LeakTestError::mapping(format!("Column '{}' is not a valid UUID: {}", column, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MEASUREMENT;
    use chrono::Duration;

    fn sample_leak_test() -> LeakTest {
        LeakTest {
            leak_test_id: Some(Uuid::new_v4()),
            time_stamp: Utc::now() - Duration::hours(1),
            machine_id: Uuid::new_v4(),
            test_object_id: Uuid::new_v4(),
            test_object_type: "pump-housing".to_string(),
            sniffing_point: "valve-3".to_string(),
            status: "NOK".to_string(),
            user: "OPERATOR7".to_string(),
            reason: Some("seal damaged".to_string()),
            measurement: MEASUREMENT.to_string(),
            links: None,
        }
    }

    #[test]
    fn test_point_splits_tags_and_fields_per_table() {
        let leak_test = sample_leak_test();
        let point = to_point(&leak_test, WritePrecision::Nanoseconds).unwrap();

        assert_eq!(point.measurement, MEASUREMENT);
        assert_eq!(point.tags.len(), 5);
        assert_eq!(point.fields.len(), 3);
        assert_eq!(point.tags["Status"], "NOK");
        assert_eq!(point.tags["User"], "OPERATOR7");
        assert_eq!(point.fields["SniffingPoint"], "valve-3");
        assert_eq!(
            point.fields["LeakTestId"],
            leak_test.leak_test_id.unwrap().to_string()
        );
    }

    #[test]
    fn test_absent_reason_is_not_written() {
        let mut leak_test = sample_leak_test();
        leak_test.status = "OK".to_string();
        leak_test.reason = None;
        let point = to_point(&leak_test, WritePrecision::Nanoseconds).unwrap();
        assert!(!point.fields.contains_key("Reason"));
    }

    #[test]
    fn test_round_trip_reproduces_every_attribute() {
        let leak_test = sample_leak_test();
        let point = to_point(&leak_test, WritePrecision::Nanoseconds).unwrap();
        let read_back = from_record(&point.to_record()).unwrap();

        assert_eq!(read_back.leak_test_id, leak_test.leak_test_id);
        assert_eq!(read_back.time_stamp, leak_test.time_stamp);
        assert_eq!(read_back.machine_id, leak_test.machine_id);
        assert_eq!(read_back.test_object_id, leak_test.test_object_id);
        assert_eq!(read_back.test_object_type, leak_test.test_object_type);
        assert_eq!(read_back.sniffing_point, leak_test.sniffing_point);
        assert_eq!(read_back.status, leak_test.status);
        assert_eq!(read_back.user, leak_test.user);
        assert_eq!(read_back.reason, leak_test.reason);
        assert_eq!(read_back.measurement, leak_test.measurement);
    }

    #[test]
    fn test_precision_truncates_the_timestamp() {
        let mut leak_test = sample_leak_test();
        leak_test.time_stamp = Utc
            .timestamp_opt(1_709_287_200, 123_456_789)
            .single()
            .unwrap();

        let seconds = to_point(&leak_test, WritePrecision::Seconds).unwrap();
        assert_eq!(seconds.timestamp.timestamp_subsec_nanos(), 0);

        let millis = to_point(&leak_test, WritePrecision::Milliseconds).unwrap();
        assert_eq!(millis.timestamp.timestamp_subsec_nanos(), 123_000_000);

        let micros = to_point(&leak_test, WritePrecision::Microseconds).unwrap();
        assert_eq!(micros.timestamp.timestamp_subsec_nanos(), 123_456_000);

        let nanos = to_point(&leak_test, WritePrecision::Nanoseconds).unwrap();
        assert_eq!(nanos.timestamp.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn test_unassigned_identity_fails_mapping() {
        let mut leak_test = sample_leak_test();
        leak_test.leak_test_id = None;
        let error = to_point(&leak_test, WritePrecision::Nanoseconds).unwrap_err();
        assert!(matches!(error, LeakTestError::Mapping(_)));
    }

    #[test]
    fn test_empty_measurement_fails_mapping() {
        let mut leak_test = sample_leak_test();
        leak_test.measurement = String::new();
        assert!(to_point(&leak_test, WritePrecision::Nanoseconds).is_err());
    }

    #[test]
    fn test_missing_required_column_fails_mapping() {
        let point = to_point(&sample_leak_test(), WritePrecision::Nanoseconds).unwrap();
        let mut record = point.to_record();
        record.columns.remove("User");
        let error = from_record(&record).unwrap_err();
        assert!(error.to_string().contains("'User'"));
    }

    #[test]
    fn test_malformed_uuid_column_fails_mapping() {
        let point = to_point(&sample_leak_test(), WritePrecision::Nanoseconds).unwrap();
        let mut record = point.to_record();
        record.insert("MachineId", "not-a-uuid");
        let error = from_record(&record).unwrap_err();
        assert!(matches!(error, LeakTestError::Mapping(_)));
        assert!(error.to_string().contains("'MachineId'"));
    }
}
