//! AMQP messaging: topology, reply envelope, operation consumers, and
//! the RPC producer used to call them

pub mod consumer;
pub mod envelope;
pub mod producer;
pub mod topology;

pub use consumer::{spawn_consumers, ConsumerState, OperationConsumer};
pub use envelope::ApiResponse;
pub use producer::RpcClient;
pub use topology::{Operation, DEFAULT_EXCHANGE};

use leaktest_core::LeakTestError;

pub(crate) fn broker_error(error: lapin::Error) -> LeakTestError {
    LeakTestError::unhandled(format!("Broker error: {}", error))
}
