//! Repository mediating between the handler and the time series store

use leaktest_core::{
    point, LeakTest, LeakTestError, LeakTestResult, Predicate, TimeRange, TypedValue,
    WritePrecision, MEASUREMENT,
};
use tracing::debug;
use uuid::Uuid;

use crate::store::{BoxedTimeSeriesClient, StoreQuery};

/// Repository for leak test persistence and retrieval
pub struct LeakTestRepository {
    client: BoxedTimeSeriesClient,
    precision: WritePrecision,
}

impl LeakTestRepository {
    pub fn new(client: BoxedTimeSeriesClient, precision: WritePrecision) -> Self {
        Self { client, precision }
    }

    /// Persist a single leak test
    pub async fn add_single(&self, leak_test: &LeakTest) -> LeakTestResult<()> {
        let point = point::to_point(leak_test, self.precision)?;
        self.client.write_points(std::slice::from_ref(&point)).await
    }

    /// Persist a batch of leak tests in one write
    pub async fn add_batch(&self, leak_tests: &[LeakTest]) -> LeakTestResult<()> {
        let points = point::to_points(leak_tests, self.precision)?;
        debug!("Writing batch of {} points", points.len());
        self.client.write_points(&points).await
    }

    /// Fetch every stored leak test
    pub async fn get_all(&self) -> LeakTestResult<Vec<LeakTest>> {
        self.entities_for(&StoreQuery::measurement(MEASUREMENT)).await
    }

    /// Fetch the leak test with the given identity.
    ///
    /// Exactly one stored row is expected per identity: zero rows is a
    /// lookup miss, more than one means the store is corrupt.
    pub async fn get_by_id(&self, id: Uuid) -> LeakTestResult<LeakTest> {
        let predicate = Predicate::Equals {
            column: "LeakTestId".to_string(),
            value: TypedValue::Uuid(id),
        };
        let mut found = self
            .entities_for(&StoreQuery::measurement(MEASUREMENT).with_predicate(predicate))
            .await?;
        match found.len() {
            0 => Err(LeakTestError::no_matching_data(format!(
                "LeakTest with ID {} not found.",
                id
            ))),
            1 => Ok(found.remove(0)),
            n => Err(LeakTestError::unhandled(format!(
                "Expected exactly one LeakTest with ID {}, found {}.",
                id, n
            ))),
        }
    }

    /// Fetch every leak test matching a predicate
    pub async fn get_by_predicate(&self, predicate: Predicate) -> LeakTestResult<Vec<LeakTest>> {
        debug!("Querying leak tests by '{}'", predicate.column());
        self.entities_for(&StoreQuery::measurement(MEASUREMENT).with_predicate(predicate))
            .await
    }

    /// Fetch every leak test inside a time range
    pub async fn get_within_time_range(&self, range: TimeRange) -> LeakTestResult<Vec<LeakTest>> {
        debug!("Querying leak tests within {}", range);
        self.entities_for(&StoreQuery::measurement(MEASUREMENT).with_range(range))
            .await
    }

    async fn entities_for(&self, query: &StoreQuery) -> LeakTestResult<Vec<LeakTest>> {
        let records = self.client.query(query).await?;
        records.iter().map(point::from_record).collect()
    }
}
