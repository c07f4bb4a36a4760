//! Request handler implementing the leak test use cases
//!
//! Every operation runs the same pipeline: deserialize when the input is
//! raw text, normalize casing, assign identity on creation, validate with
//! the full accumulated violation set, then delegate to the repository.

use leaktest_core::{model, predicate, validation, LeakTest, LeakTestError, LeakTestResult, TimeRange};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::repository::LeakTestRepository;

/// Handler for all leak test operations
pub struct LeakTestHandler {
    repository: Arc<LeakTestRepository>,
}

impl LeakTestHandler {
    pub fn new(repository: Arc<LeakTestRepository>) -> Self {
        Self { repository }
    }

    /// Store a single leak test given as a JSON body, returning the
    /// assigned identity
    pub async fn add_single(&self, body: &str) -> LeakTestResult<Uuid> {
        let mut leak_test = model::from_json(body)?;
        self.add_single_entity(&mut leak_test).await
    }

    /// Store a single already-deserialized leak test
    pub async fn add_single_entity(&self, leak_test: &mut LeakTest) -> LeakTestResult<Uuid> {
        leak_test.normalize_casing();
        let id = Uuid::new_v4();
        leak_test.leak_test_id = Some(id);

        validation::validate_leak_test(leak_test)?;
        self.repository.add_single(leak_test).await?;
        info!("Stored leak test {}", id);
        Ok(id)
    }

    /// Store a batch of leak tests given as a JSON array body, returning
    /// the assigned identities.
    ///
    /// The whole batch is validated before anything is written; one
    /// invalid item rejects the batch and nothing is committed.
    pub async fn add_batch(&self, body: &str) -> LeakTestResult<Vec<Uuid>> {
        let mut leak_tests = model::batch_from_json(body)?;
        if leak_tests.is_empty() {
            return Err(LeakTestError::validation([
                "The request body was null or empty.",
            ]));
        }

        let mut ids = Vec::with_capacity(leak_tests.len());
        for leak_test in &mut leak_tests {
            leak_test.normalize_casing();
            let id = Uuid::new_v4();
            leak_test.leak_test_id = Some(id);
            ids.push(id);
        }
        for leak_test in &leak_tests {
            validation::validate_leak_test(leak_test)?;
        }

        self.repository.add_batch(&leak_tests).await?;
        info!("Stored batch of {} leak tests", ids.len());
        Ok(ids)
    }

    /// Fetch every stored leak test; an empty store yields an empty list
    pub async fn get_all(&self) -> LeakTestResult<Vec<LeakTest>> {
        let leak_tests = self.repository.get_all().await?;
        for leak_test in &leak_tests {
            validation::validate_leak_test(leak_test)?;
        }
        Ok(leak_tests)
    }

    /// Fetch the leak test with the given identity
    pub async fn get_by_id(&self, id: Uuid) -> LeakTestResult<LeakTest> {
        let leak_test = self.repository.get_by_id(id).await?;
        validation::validate_leak_test(&leak_test)?;
        Ok(leak_test)
    }

    /// Fetch leak tests whose indexed tag matches a key/value pair
    pub async fn get_by_tag(&self, key: &str, value: &str) -> LeakTestResult<Vec<LeakTest>> {
        self.get_by_key_value(key, value).await
    }

    /// Fetch leak tests whose field matches a key/value pair
    pub async fn get_by_field(&self, key: &str, value: &str) -> LeakTestResult<Vec<LeakTest>> {
        self.get_by_key_value(key, value).await
    }

    async fn get_by_key_value(&self, key: &str, value: &str) -> LeakTestResult<Vec<LeakTest>> {
        debug!("Looking up leak tests where '{}' equals '{}'", key, value);
        let predicate = predicate::build_predicate(key, value)?;
        let leak_tests = self.repository.get_by_predicate(predicate).await?;
        if leak_tests.is_empty() {
            return Err(LeakTestError::no_matching_data(
                "No test results match the specified tag key-value pair.",
            ));
        }
        Ok(leak_tests)
    }

    /// Fetch leak tests inside a time range; the stop bound is optional
    /// and its absence extends the range to the most recent data
    pub async fn get_within_time_range(
        &self,
        start: &str,
        stop: Option<&str>,
    ) -> LeakTestResult<Vec<LeakTest>> {
        let range = TimeRange::parse(start, stop)?;
        validation::validate_time_range(&range)?;

        let leak_tests = self.repository.get_within_time_range(range).await?;
        for leak_test in &leak_tests {
            validation::validate_leak_test(leak_test)?;
        }
        Ok(leak_tests)
    }
}
