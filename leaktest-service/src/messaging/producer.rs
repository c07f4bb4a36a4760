//! RPC producer side of the request/reply pattern
//!
//! Declares an exclusive auto-delete reply queue, publishes the request
//! with a fresh correlation id, and awaits the correlated reply envelope
//! within a configured timeout.

use futures::StreamExt;
use lapin::options::{BasicConsumeOptions, BasicPublishOptions, QueueDeclareOptions};
use lapin::types::{FieldTable, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use leaktest_core::{LeakTestError, LeakTestResult};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::messaging::broker_error;
use crate::messaging::envelope::ApiResponse;
use crate::messaging::topology::Operation;

/// Client for calling the operation consumers over the broker
pub struct RpcClient {
    channel: Channel,
    exchange: String,
    reply_timeout: Duration,
    _connection: Connection,
}

impl RpcClient {
    pub async fn connect(config: &ServiceConfig) -> LeakTestResult<Self> {
        let connection_name = format!("{}-rpc-client", config.broker.client_name);
        let connection = Connection::connect(
            &config.broker.uri,
            ConnectionProperties::default().with_connection_name(connection_name.into()),
        )
        .await
        .map_err(broker_error)?;
        let channel = connection.create_channel().await.map_err(broker_error)?;

        Ok(Self {
            channel,
            exchange: config.broker.exchange.clone(),
            reply_timeout: config.reply_timeout(),
            _connection: connection,
        })
    }

    /// Publish one request and await its correlated reply using the
    /// configured default timeout
    pub async fn call(&self, operation: Operation, body: &[u8]) -> LeakTestResult<ApiResponse> {
        self.call_with_timeout(operation, body, self.reply_timeout)
            .await
    }

    /// Publish one request and await its correlated reply.
    ///
    /// Replies whose correlation id does not match are skipped, so a
    /// stale reply from an earlier timed-out call cannot be mistaken
    /// for the current one.
    pub async fn call_with_timeout(
        &self,
        operation: Operation,
        body: &[u8],
        reply_timeout: Duration,
    ) -> LeakTestResult<ApiResponse> {
        let reply_queue = self
            .channel
            .queue_declare(
                "",
                QueueDeclareOptions {
                    exclusive: true,
                    auto_delete: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(broker_error)?;
        let reply_to = reply_queue.name().clone();

        // Consume the reply queue before publishing so the reply cannot
        // arrive unobserved.
        let consumer_tag = format!("{}-reply", operation.name());
        let mut consumer = self
            .channel
            .basic_consume(
                reply_to.as_str(),
                &consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(broker_error)?;

        let correlation_id = Uuid::new_v4().to_string();
        let properties = BasicProperties::default()
            .with_correlation_id(ShortString::from(correlation_id.clone()))
            .with_reply_to(reply_to.clone());

        debug!("Calling {} with correlation id {}", operation, correlation_id);
        let _ = self
            .channel
            .basic_publish(
                &self.exchange,
                operation.routing_key(),
                BasicPublishOptions::default(),
                body,
                properties,
            )
            .await
            .map_err(broker_error)?;

        let reply = tokio::time::timeout(reply_timeout, async {
            while let Some(delivery) = consumer.next().await {
                let delivery = delivery.map_err(broker_error)?;
                let correlated = delivery
                    .properties
                    .correlation_id()
                    .as_ref()
                    .map(|cid| cid.as_str() == correlation_id)
                    .unwrap_or(false);
                if !correlated {
                    warn!("Skipping reply with non-matching correlation id");
                    continue;
                }
                return ApiResponse::decode(&delivery.data);
            }
            Err(LeakTestError::unhandled(
                "Reply stream closed before a response arrived.",
            ))
        })
        .await;

        match reply {
            Ok(result) => result,
            Err(_) => Err(LeakTestError::unhandled(format!(
                "No reply for {} within {}ms.",
                operation,
                reply_timeout.as_millis()
            ))),
        }
    }
}
