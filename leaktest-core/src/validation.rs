//! Rule validation for leak test entities and query windows
//!
//! Every rule is checked and every violation collected before failing,
//! so a caller sees the complete set in one response.

use chrono::Utc;

use crate::error::{LeakTestError, LeakTestResult};
use crate::model::LeakTest;
use crate::time::TimeRange;
use crate::{MAX_SNIFFING_POINT_LENGTH, MEASUREMENT};

/// Accumulates rule violations
#[derive(Debug, Default)]
pub struct Violations {
    messages: Vec<String>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: Into<String>>(&mut self, message: S) {
        self.messages.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Convert to a result, failing with the accumulated set
    pub fn into_result(self) -> LeakTestResult<()> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(LeakTestError::Validation(self.messages))
        }
    }
}

/// Validate every rule on an entity
pub fn validate_leak_test(leak_test: &LeakTest) -> LeakTestResult<()> {
    let mut violations = Violations::new();

    if leak_test.time_stamp > Utc::now() {
        violations.add("TimeStamp cannot be a future date.");
    }

    if leak_test.status == "NOK" {
        match &leak_test.reason {
            None => {
                violations.add("Reason cannot be empty when Status is NOK.");
                violations.add("Reason cannot be null when Status is NOK.");
            }
            Some(reason) if reason.is_empty() => {
                violations.add("Reason cannot be empty when Status is NOK.");
            }
            Some(_) => {}
        }
    }

    if leak_test.test_object_id.is_nil() {
        violations.add("TestObjectId can not be empty.");
    }

    match leak_test.leak_test_id {
        None => violations.add("LeakTestId can not be null"),
        Some(id) if id.is_nil() => violations.add("LeakTestId can not be empty"),
        Some(_) => {}
    }

    if leak_test.status.is_empty() {
        violations.add("Status can not be empty.");
    }
    if !matches!(leak_test.status.as_str(), "OK" | "NOK") {
        violations.add("Status must be either OK or NOK");
    }

    validate_sniffing_point(&leak_test.sniffing_point, &mut violations);

    if leak_test.measurement != MEASUREMENT {
        violations.add("The measurement for LeakTest objects must be 'LeakTest'.");
    }

    violations.into_result()
}

fn validate_sniffing_point(sniffing_point: &str, violations: &mut Violations) {
    if sniffing_point.is_empty() {
        violations.add("SniffingPoint cannot be empty.");
    }
    if sniffing_point.trim().is_empty() {
        violations.add("SniffingPoint should not be whitespace.");
    } else if !sniffing_point
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        violations.add("SniffingPoint can only contain alphanumeric characters, hyphens, and underscores.");
    }
    if sniffing_point.is_empty() || sniffing_point.chars().count() > MAX_SNIFFING_POINT_LENGTH {
        violations.add("SniffingPoint must have a length between 1 and 999 characters.");
    }
}

/// Validate a query window before it reaches the store
pub fn validate_time_range(range: &TimeRange) -> LeakTestResult<()> {
    let mut violations = Violations::new();
    let now = Utc::now();

    if range.start > now {
        violations.add("Start date must be in the past or present.");
    }
    if let Some(stop) = range.stop {
        if range.start > stop {
            violations.add("Start date must be less than or equal to Stop date.");
        }
        if stop > now {
            violations.add("Stop date must be in the past or present.");
        }
    }

    violations.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn valid_leak_test() -> LeakTest {
        LeakTest {
            leak_test_id: Some(Uuid::new_v4()),
            time_stamp: Utc::now() - Duration::hours(1),
            machine_id: Uuid::new_v4(),
            test_object_id: Uuid::new_v4(),
            test_object_type: "pump-housing".to_string(),
            sniffing_point: "valve-3".to_string(),
            status: "OK".to_string(),
            user: "OPERATOR7".to_string(),
            reason: None,
            measurement: MEASUREMENT.to_string(),
            links: None,
        }
    }

    #[test]
    fn test_valid_entity_passes() {
        assert!(validate_leak_test(&valid_leak_test()).is_ok());
    }

    #[test]
    fn test_ok_status_does_not_require_reason() {
        let mut leak_test = valid_leak_test();
        leak_test.reason = None;
        assert!(validate_leak_test(&leak_test).is_ok());
    }

    #[test]
    fn test_nok_status_requires_reason() {
        let mut leak_test = valid_leak_test();
        leak_test.status = "NOK".to_string();

        leak_test.reason = None;
        let error = validate_leak_test(&leak_test).unwrap_err();
        assert!(error
            .to_string()
            .contains("Reason cannot be null when Status is NOK."));

        leak_test.reason = Some(String::new());
        let error = validate_leak_test(&leak_test).unwrap_err();
        assert!(error
            .to_string()
            .contains("Reason cannot be empty when Status is NOK."));

        leak_test.reason = Some("seal damaged".to_string());
        assert!(validate_leak_test(&leak_test).is_ok());
    }

    #[test]
    fn test_future_timestamp_rejected() {
        let mut leak_test = valid_leak_test();
        leak_test.time_stamp = Utc::now() + Duration::hours(1);
        let error = validate_leak_test(&leak_test).unwrap_err();
        assert!(error.to_string().contains("TimeStamp cannot be a future date."));
    }

    #[test]
    fn test_status_must_be_ok_or_nok() {
        let mut leak_test = valid_leak_test();
        leak_test.status = "MAYBE".to_string();
        let error = validate_leak_test(&leak_test).unwrap_err();
        assert!(error.to_string().contains("Status must be either OK or NOK"));
    }

    #[test]
    fn test_empty_status_reports_both_rules() {
        let mut leak_test = valid_leak_test();
        leak_test.status = String::new();
        match validate_leak_test(&leak_test).unwrap_err() {
            LeakTestError::Validation(messages) => {
                assert!(messages.contains(&"Status can not be empty.".to_string()));
                assert!(messages.contains(&"Status must be either OK or NOK".to_string()));
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_identity_rejected() {
        let mut leak_test = valid_leak_test();
        leak_test.leak_test_id = None;
        let error = validate_leak_test(&leak_test).unwrap_err();
        assert!(error.to_string().contains("LeakTestId can not be null"));

        leak_test.leak_test_id = Some(Uuid::nil());
        let error = validate_leak_test(&leak_test).unwrap_err();
        assert!(error.to_string().contains("LeakTestId can not be empty"));
    }

    #[test]
    fn test_empty_test_object_rejected() {
        let mut leak_test = valid_leak_test();
        leak_test.test_object_id = Uuid::nil();
        assert!(validate_leak_test(&leak_test).is_err());
    }

    #[test]
    fn test_sniffing_point_charset_and_length() {
        let mut leak_test = valid_leak_test();

        leak_test.sniffing_point = "valve 3!".to_string();
        let error = validate_leak_test(&leak_test).unwrap_err();
        assert!(error.to_string().contains("alphanumeric"));

        leak_test.sniffing_point = "x".repeat(MAX_SNIFFING_POINT_LENGTH + 1);
        let error = validate_leak_test(&leak_test).unwrap_err();
        assert!(error.to_string().contains("between 1 and 999"));

        leak_test.sniffing_point = "x".repeat(MAX_SNIFFING_POINT_LENGTH);
        assert!(validate_leak_test(&leak_test).is_ok());
    }

    #[test]
    fn test_wrong_measurement_rejected() {
        let mut leak_test = valid_leak_test();
        leak_test.measurement = "SomethingElse".to_string();
        let error = validate_leak_test(&leak_test).unwrap_err();
        assert!(error.to_string().contains("must be 'LeakTest'"));
    }

    #[test]
    fn test_time_range_start_after_stop_rejected() {
        let now = Utc::now();
        let range = TimeRange::new(now - Duration::hours(1), Some(now - Duration::hours(2)));
        let error = validate_time_range(&range).unwrap_err();
        assert!(error
            .to_string()
            .contains("Start date must be less than or equal to Stop date."));
    }

    #[test]
    fn test_time_range_future_bounds_rejected() {
        let now = Utc::now();

        let range = TimeRange::new(now + Duration::hours(1), None);
        assert!(validate_time_range(&range).is_err());

        let range = TimeRange::new(now - Duration::hours(1), Some(now + Duration::hours(1)));
        let error = validate_time_range(&range).unwrap_err();
        assert!(error
            .to_string()
            .contains("Stop date must be in the past or present."));
    }

    #[test]
    fn test_time_range_open_stop_is_valid() {
        let range = TimeRange::new(Utc::now() - Duration::hours(1), None);
        assert!(validate_time_range(&range).is_ok());
    }
}
