//! The leak test domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::attrs;
use crate::error::LeakTestResult;
use crate::MEASUREMENT;

/// One leak test measurement event.
///
/// Created once on ingestion and immutable afterwards; there is no
/// update or delete operation anywhere in the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LeakTest {
    /// Identity, assigned by the handler on ingestion and never by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leak_test_id: Option<Uuid>,

    /// When the measurement was taken, never in the future
    pub time_stamp: DateTime<Utc>,

    pub machine_id: Uuid,

    pub test_object_id: Uuid,

    pub test_object_type: String,

    /// Where on the test object the sniff was taken
    pub sniffing_point: String,

    /// `OK` or `NOK`, stored upper-case
    pub status: String,

    /// Operator who ran the test, stored upper-case
    pub user: String,

    /// Mandatory when status is NOK, absent otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Series name, always "LeakTest"
    #[serde(default = "default_measurement")]
    pub measurement: String,

    /// Self-links computed per response, never persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<HashMap<String, String>>,
}

fn default_measurement() -> String {
    MEASUREMENT.to_string()
}

impl LeakTest {
    /// Upper-case the operator and status the way the store keeps them
    pub fn normalize_casing(&mut self) {
        self.user = self.user.to_uppercase();
        self.status = self.status.to_uppercase();
    }

    /// Attach a HATEOAS self-link pointing at the resource location.
    /// This is a presentation concern for callers, nothing here persists it.
    pub fn with_self_link(mut self, base_url: &str) -> Self {
        if let Some(id) = self.leak_test_id {
            let mut links = HashMap::new();
            links.insert(
                "self".to_string(),
                format!("{}/api/LeakTests/{}", base_url.trim_end_matches('/'), id),
            );
            self.links = Some(links);
        }
        self
    }
}

/// Parse a single entity from JSON, accepting member names in any casing
pub fn from_json(payload: &str) -> LeakTestResult<LeakTest> {
    let value: serde_json::Value = serde_json::from_str(payload)?;
    let leak_test = serde_json::from_value(normalize_member_names(value))?;
    Ok(leak_test)
}

/// Parse a batch of entities from a JSON array, accepting member names
/// in any casing
pub fn batch_from_json(payload: &str) -> LeakTestResult<Vec<LeakTest>> {
    let value: serde_json::Value = serde_json::from_str(payload)?;
    let items: Vec<serde_json::Value> = serde_json::from_value(value)?;
    items
        .into_iter()
        .map(|item| Ok(serde_json::from_value(normalize_member_names(item))?))
        .collect()
}

/// Rewrite object keys to the canonical member names so deserialization
/// is case-insensitive the way clients expect
fn normalize_member_names(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(members) => {
            let mut normalized = serde_json::Map::with_capacity(members.len());
            for (key, member) in members {
                match member_name(&key) {
                    Some(canonical) => normalized.insert(canonical.to_string(), member),
                    None => normalized.insert(key, member),
                };
            }
            serde_json::Value::Object(normalized)
        }
        other => other,
    }
}

fn member_name(key: &str) -> Option<&'static str> {
    attrs::ATTRIBUTES
        .iter()
        .map(|attribute| attribute.column)
        .chain(["Measurement", "Links"])
        .find(|name| name.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> serde_json::Value {
        json!({
            "TimeStamp": "2024-03-01T10:00:00Z",
            "MachineId": "7e8b8f8c-6f3b-4b57-9c8e-2f64a3f0a001",
            "TestObjectId": "37f1b7c1-29a8-4f2b-b96e-5df3e6c70b02",
            "TestObjectType": "pump-housing",
            "SniffingPoint": "valve-3",
            "Status": "OK",
            "User": "OPERATOR7",
            "Measurement": "LeakTest"
        })
    }

    #[test]
    fn test_from_json_with_canonical_names() {
        let leak_test = from_json(&sample_json().to_string()).unwrap();
        assert_eq!(leak_test.status, "OK");
        assert_eq!(leak_test.sniffing_point, "valve-3");
        assert_eq!(leak_test.measurement, "LeakTest");
        assert!(leak_test.leak_test_id.is_none());
        assert!(leak_test.reason.is_none());
    }

    #[test]
    fn test_from_json_is_case_insensitive() {
        let payload = json!({
            "timestamp": "2024-03-01T10:00:00Z",
            "machineid": "7e8b8f8c-6f3b-4b57-9c8e-2f64a3f0a001",
            "TESTOBJECTID": "37f1b7c1-29a8-4f2b-b96e-5df3e6c70b02",
            "testobjecttype": "pump-housing",
            "sniffingpoint": "valve-3",
            "status": "ok",
            "user": "operator7"
        });
        let leak_test = from_json(&payload.to_string()).unwrap();
        assert_eq!(leak_test.status, "ok");
        assert_eq!(leak_test.user, "operator7");
        assert_eq!(leak_test.test_object_type, "pump-housing");
    }

    #[test]
    fn test_measurement_defaults_when_absent() {
        let mut payload = sample_json();
        payload.as_object_mut().unwrap().remove("Measurement");
        let leak_test = from_json(&payload.to_string()).unwrap();
        assert_eq!(leak_test.measurement, MEASUREMENT);
    }

    #[test]
    fn test_batch_from_json_requires_an_array() {
        assert!(batch_from_json(&sample_json().to_string()).is_err());
        let batch = batch_from_json(&json!([sample_json()]).to_string()).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_absent_members_are_not_serialized() {
        let leak_test = from_json(&sample_json().to_string()).unwrap();
        let serialized = serde_json::to_value(&leak_test).unwrap();
        let members = serialized.as_object().unwrap();
        assert!(!members.contains_key("LeakTestId"));
        assert!(!members.contains_key("Reason"));
        assert!(!members.contains_key("Links"));
        assert_eq!(members["Status"], "OK");
    }

    #[test]
    fn test_normalize_casing() {
        let mut leak_test = from_json(&sample_json().to_string()).unwrap();
        leak_test.status = "nok".to_string();
        leak_test.user = "operator7".to_string();
        leak_test.normalize_casing();
        assert_eq!(leak_test.status, "NOK");
        assert_eq!(leak_test.user, "OPERATOR7");
    }

    #[test]
    fn test_with_self_link() {
        let mut leak_test = from_json(&sample_json().to_string()).unwrap();
        let id = Uuid::new_v4();
        leak_test.leak_test_id = Some(id);
        let linked = leak_test.with_self_link("http://localhost:5000/");
        let links = linked.links.unwrap();
        assert_eq!(
            links["self"],
            format!("http://localhost:5000/api/LeakTests/{}", id)
        );
    }
}
