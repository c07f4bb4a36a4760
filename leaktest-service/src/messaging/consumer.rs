//! Operation consumers
//!
//! One consumer per RPC operation, each on its own connection and
//! channel. Requests are consumed with automatic acknowledgment, so a
//! failed request is answered with an error envelope instead of being
//! redelivered.

use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use leaktest_core::{LeakTestError, LeakTestResult};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::handler::LeakTestHandler;
use crate::messaging::broker_error;
use crate::messaging::envelope::ApiResponse;
use crate::messaging::topology::Operation;

/// Lifecycle of a single operation consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConsumerState {
    Created,
    Bound,
    Listening,
    Processing,
    Idle,
    Stopped,
}

/// Consumer serving one RPC operation from its dedicated queue
pub struct OperationConsumer {
    operation: Operation,
    channel: Channel,
    handler: Arc<LeakTestHandler>,
    state: Arc<RwLock<ConsumerState>>,
    // Closing the connection tears down the channel, keep it alive for
    // the consumer's whole lifetime.
    _connection: Connection,
}

impl OperationConsumer {
    /// Connect and declare the operation's slice of the topology:
    /// durable direct exchange, durable queue, fixed routing key
    pub async fn bind(
        config: &ServiceConfig,
        operation: Operation,
        handler: Arc<LeakTestHandler>,
    ) -> LeakTestResult<Self> {
        let connection_name = format!("{}-{}", config.broker.client_name, operation.name());
        let connection = Connection::connect(
            &config.broker.uri,
            ConnectionProperties::default().with_connection_name(connection_name.into()),
        )
        .await
        .map_err(broker_error)?;
        let channel = connection.create_channel().await.map_err(broker_error)?;

        channel
            .exchange_declare(
                &config.broker.exchange,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(broker_error)?;
        channel
            .queue_declare(
                operation.queue(),
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(broker_error)?;
        channel
            .queue_bind(
                operation.queue(),
                &config.broker.exchange,
                operation.routing_key(),
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(broker_error)?;

        debug!(
            "Bound '{}' to '{}' with routing key '{}'",
            operation.queue(),
            config.broker.exchange,
            operation.routing_key()
        );

        Ok(Self {
            operation,
            channel,
            handler,
            state: Arc::new(RwLock::new(ConsumerState::Bound)),
            _connection: connection,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConsumerState {
        *self.state.read()
    }

    fn set_state(&self, state: ConsumerState) {
        *self.state.write() = state;
    }

    /// Consume requests until the stream closes or shutdown is signaled
    pub async fn run(&self, shutdown: CancellationToken) -> LeakTestResult<()> {
        let consumer_tag = format!("{}-consumer", self.operation.name());
        let mut consumer = self
            .channel
            .basic_consume(
                self.operation.queue(),
                &consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(broker_error)?;

        self.set_state(ConsumerState::Listening);
        info!("Consumer listening on '{}'", self.operation.queue());

        loop {
            tokio::select! {
                delivery = consumer.next() => match delivery {
                    Some(Ok(delivery)) => {
                        self.set_state(ConsumerState::Processing);
                        self.handle_delivery(&delivery).await;
                        self.set_state(ConsumerState::Idle);
                    }
                    Some(Err(delivery_error)) => {
                        warn!(
                            "Consumer error on '{}': {}",
                            self.operation.queue(),
                            delivery_error
                        );
                    }
                    None => {
                        warn!("Consumer stream for '{}' closed", self.operation.queue());
                        break;
                    }
                },
                _ = shutdown.cancelled() => {
                    info!("Stopping {} consumer", self.operation);
                    break;
                }
            }
        }

        self.set_state(ConsumerState::Stopped);
        Ok(())
    }

    /// Process one request and publish the reply envelope to the
    /// caller's reply queue on the default exchange
    async fn handle_delivery(&self, delivery: &Delivery) {
        let reply_to = match delivery.properties.reply_to() {
            Some(reply_to) => reply_to.clone(),
            None => {
                warn!(
                    "Discarding {} request without a reply-to queue",
                    self.operation
                );
                return;
            }
        };

        let body = String::from_utf8_lossy(&delivery.data);
        debug!(
            "Processing {} request ({} bytes)",
            self.operation,
            delivery.data.len()
        );

        let response = match self.process(&body).await {
            Ok(data) => ApiResponse::ok(data),
            Err(request_error) => {
                warn!(
                    category = request_error.category(),
                    "{} request failed: {}", self.operation, request_error
                );
                ApiResponse::from_error(&request_error)
            }
        };

        let mut properties = BasicProperties::default();
        if let Some(correlation_id) = delivery.properties.correlation_id() {
            properties = properties.with_correlation_id(correlation_id.clone());
        }

        if let Err(publish_error) = self
            .channel
            .basic_publish(
                "",
                reply_to.as_str(),
                BasicPublishOptions::default(),
                &response.encode(),
                properties,
            )
            .await
        {
            error!("Failed to publish {} reply: {}", self.operation, publish_error);
        }
    }

    async fn process(&self, body: &str) -> LeakTestResult<Value> {
        match self.operation {
            Operation::AddSingle => {
                let id = self.handler.add_single(body).await?;
                Ok(json!(id))
            }
            Operation::AddBatch => {
                let ids = self.handler.add_batch(body).await?;
                Ok(json!(ids))
            }
            Operation::GetAll => {
                let leak_tests = self.handler.get_all().await?;
                Ok(serde_json::to_value(leak_tests)?)
            }
            Operation::GetById => {
                let id = Uuid::parse_str(body.trim().trim_matches('"'))?;
                let leak_test = self.handler.get_by_id(id).await?;
                Ok(serde_json::to_value(leak_test)?)
            }
            Operation::GetByTag => {
                let (key, value) = split_key_value(body)?;
                let leak_tests = self.handler.get_by_tag(key, value).await?;
                Ok(serde_json::to_value(leak_tests)?)
            }
            Operation::GetByField => {
                let (key, value) = split_key_value(body)?;
                let leak_tests = self.handler.get_by_field(key, value).await?;
                Ok(serde_json::to_value(leak_tests)?)
            }
            Operation::GetWithinTimeFrame => {
                let (start, stop) = split_bounds(body);
                let leak_tests = self
                    .handler
                    .get_within_time_range(&start, stop.as_deref())
                    .await?;
                Ok(serde_json::to_value(leak_tests)?)
            }
        }
    }
}

/// Split a `key;value` request body, tolerating outer quotes; anything
/// after the second part is ignored
fn split_key_value(body: &str) -> LeakTestResult<(&str, &str)> {
    let trimmed = body.trim().trim_matches('"');
    let parts: Vec<&str> = trimmed.split(';').collect();
    if parts.len() < 2 {
        return Err(LeakTestError::unhandled(format!(
            "Expected a 'key;value' request body, got '{}'.",
            body.trim()
        )));
    }
    Ok((parts[0], parts[1]))
}

/// Split a `start;stop` request body; a missing or empty stop bound
/// leaves the range open-ended
fn split_bounds(body: &str) -> (String, Option<String>) {
    let trimmed = body.trim().trim_matches('"');
    let parts: Vec<&str> = trimmed.split(';').collect();
    let start = parts.first().copied().unwrap_or("").to_string();
    let stop = parts
        .get(1)
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(str::to_string);
    (start, stop)
}

/// Bind and spawn a consumer task for every operation
pub async fn spawn_consumers(
    config: &ServiceConfig,
    handler: Arc<LeakTestHandler>,
    shutdown: CancellationToken,
) -> LeakTestResult<Vec<JoinHandle<()>>> {
    let mut handles = Vec::with_capacity(Operation::ALL.len());
    for operation in Operation::ALL {
        let consumer = OperationConsumer::bind(config, operation, Arc::clone(&handler)).await?;
        let token = shutdown.clone();
        handles.push(tokio::spawn(async move {
            if let Err(run_error) = consumer.run(token).await {
                error!("{} consumer terminated: {}", operation, run_error);
            }
        }));
    }
    Ok(handles)
}
