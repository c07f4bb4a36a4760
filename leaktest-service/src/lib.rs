//! # LeakTest Service
//!
//! AMQP RPC service for storing and querying leak test results:
//!
//! - **Configuration**: YAML file plus environment overrides
//! - **Store**: time series client trait with an in-memory implementation
//! - **Repository**: persistence and retrieval over the store client
//! - **Handler**: the use case pipeline (normalize, assign, validate, store)
//! - **Messaging**: per-operation consumers and the RPC producer

pub mod config;
pub mod handler;
pub mod memory_store;
pub mod messaging;
pub mod repository;
pub mod store;

pub use config::ServiceConfig;
pub use handler::LeakTestHandler;
pub use memory_store::MemoryTimeSeriesClient;
pub use repository::LeakTestRepository;
pub use store::{BoxedTimeSeriesClient, StoreQuery, TimeSeriesClient};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
