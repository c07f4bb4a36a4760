//! Time series store client trait

use async_trait::async_trait;
use leaktest_core::{LeakTestResult, Point, Predicate, Record, TimeRange};
use std::sync::Arc;

/// Query against the time series store
#[derive(Debug, Clone)]
pub struct StoreQuery {
    measurement: String,
    predicate: Option<Predicate>,
    range: Option<TimeRange>,
}

impl StoreQuery {
    /// Query for every record of a measurement
    pub fn measurement<S: Into<String>>(measurement: S) -> Self {
        Self {
            measurement: measurement.into(),
            predicate: None,
            range: None,
        }
    }

    /// Restrict the query to records matching a predicate
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Restrict the query to records inside a time range
    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn measurement_name(&self) -> &str {
        &self.measurement
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn range(&self) -> Option<&TimeRange> {
        self.range.as_ref()
    }
}

/// Abstraction over the time series store backend
#[async_trait]
pub trait TimeSeriesClient: Send + Sync {
    /// Write a batch of points in one call
    async fn write_points(&self, points: &[Point]) -> LeakTestResult<()>;

    /// Run a query and return the matching records
    async fn query(&self, query: &StoreQuery) -> LeakTestResult<Vec<Record>>;

    /// Check whether the store is reachable
    async fn health_check(&self) -> LeakTestResult<bool>;
}

/// Type alias for a boxed store client
pub type BoxedTimeSeriesClient = Arc<dyn TimeSeriesClient>;
