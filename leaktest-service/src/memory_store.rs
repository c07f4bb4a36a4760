//! In-memory time series client
//!
//! Backs the unit tests and lets the service run without a live store.
//! Records are filtered with the same predicate and time range types the
//! real queries are built from.

use async_trait::async_trait;
use leaktest_core::{LeakTestError, LeakTestResult, Point, Record};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::store::{StoreQuery, TimeSeriesClient};

#[derive(Debug, Default)]
struct MemoryStorage {
    points: Vec<Point>,
    operations: Vec<String>,
}

/// Store client keeping every written point in memory
#[derive(Debug, Clone)]
pub struct MemoryTimeSeriesClient {
    storage: Arc<Mutex<MemoryStorage>>,
    simulate_errors: bool,
}

impl MemoryTimeSeriesClient {
    pub fn new() -> Self {
        info!("Creating in-memory time series client");
        Self {
            storage: Arc::new(Mutex::new(MemoryStorage::default())),
            simulate_errors: false,
        }
    }

    /// Client that fails every write and query
    pub fn with_error_simulation() -> Self {
        info!("Creating in-memory time series client with error simulation");
        Self {
            storage: Arc::new(Mutex::new(MemoryStorage::default())),
            simulate_errors: true,
        }
    }

    /// Number of points currently stored
    pub fn stored_count(&self) -> usize {
        self.storage.lock().points.len()
    }

    /// Whether an operation containing the given fragment was recorded
    pub fn has_operation(&self, fragment: &str) -> bool {
        self.storage
            .lock()
            .operations
            .iter()
            .any(|op| op.contains(fragment))
    }

    /// Clear stored points and the operation log
    pub fn clear(&self) {
        let mut storage = self.storage.lock();
        storage.points.clear();
        storage.operations.clear();
    }
}

impl Default for MemoryTimeSeriesClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimeSeriesClient for MemoryTimeSeriesClient {
    async fn write_points(&self, points: &[Point]) -> LeakTestResult<()> {
        if self.simulate_errors {
            return Err(LeakTestError::store("Simulated error"));
        }

        let mut storage = self.storage.lock();
        storage
            .operations
            .push(format!("write_points({} points)", points.len()));
        storage.points.extend_from_slice(points);
        debug!(
            "Stored {} points, {} total",
            points.len(),
            storage.points.len()
        );
        Ok(())
    }

    async fn query(&self, query: &StoreQuery) -> LeakTestResult<Vec<Record>> {
        if self.simulate_errors {
            return Err(LeakTestError::store("Simulated error"));
        }

        let mut storage = self.storage.lock();
        storage
            .operations
            .push(format!("query({})", query.measurement_name()));

        let mut records: Vec<Record> = storage
            .points
            .iter()
            .filter(|point| point.measurement == query.measurement_name())
            .map(Point::to_record)
            .filter(|record| match query.predicate() {
                Some(predicate) => predicate.matches(record),
                None => true,
            })
            .filter(|record| match (query.range(), record.timestamp) {
                (Some(range), Some(timestamp)) => range.contains(timestamp),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect();
        records.sort_by_key(|record| record.timestamp);

        trace!(
            "Query on '{}' matched {} of {} points",
            query.measurement_name(),
            records.len(),
            storage.points.len()
        );
        Ok(records)
    }

    async fn health_check(&self) -> LeakTestResult<bool> {
        if self.simulate_errors {
            debug!("Simulating failed health check");
            return Ok(false);
        }
        Ok(true)
    }
}
