//! NATS backend
//!
//! Subjects are the pattern names. Requests carry the JSON request frame and
//! the reply goes to the message's reply subject as a response frame.

use std::time::Duration;

use async_nats::client::RequestErrorKind;
use async_nats::{Client, Subscriber};
use futures_util::stream::{select_all, SelectAll, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{BusError, BusMessage, Reply};
use crate::interfaces::rpc::{FrameError, RpcError, RpcRequest, RpcResponse};

/// Replicas share this queue group so each request is answered once.
const QUEUE_GROUP: &str = "products-ms";

pub(super) async fn connect(servers: &[String]) -> Result<Client, BusError> {
    if servers.is_empty() {
        return Err(BusError::NoServers);
    }
    let client = async_nats::connect(servers.join(",").as_str()).await?;
    info!("📡 Connected to NATS: {}", servers.join(", "));
    Ok(client)
}

pub(super) struct NatsInbox {
    client: Client,
    subscriptions: SelectAll<Subscriber>,
}

impl NatsInbox {
    pub(super) async fn subscribe(client: &Client, subjects: &[&str]) -> Result<Self, BusError> {
        let mut subscribers = Vec::with_capacity(subjects.len());
        for subject in subjects {
            subscribers.push(
                client
                    .queue_subscribe(subject.to_string(), QUEUE_GROUP.to_string())
                    .await?,
            );
        }
        Ok(Self {
            client: client.clone(),
            subscriptions: select_all(subscribers),
        })
    }

    /// Next request that expects a reply. Malformed frames are answered
    /// with a 400 frame in the background and skipped.
    pub(super) async fn next(&mut self) -> Option<BusMessage> {
        loop {
            let message = self.subscriptions.next().await?;
            let subject = message.subject.to_string();

            let Some(reply) = message.reply else {
                debug!("Ignoring {} without a reply subject", subject);
                continue;
            };

            match RpcRequest::from_slice(&message.payload) {
                Ok(request) => {
                    return Some(BusMessage {
                        subject,
                        request,
                        reply: Reply::Nats {
                            client: self.client.clone(),
                            subject: reply,
                        },
                    });
                }
                Err(e) => {
                    warn!("Malformed frame on {}: {}", subject, e);
                    let response = RpcResponse::error(None, RpcError::bad_request(e.to_string()));
                    let client = self.client.clone();
                    tokio::spawn(async move { publish(&client, reply, &response).await });
                }
            }
        }
    }
}

pub(super) async fn publish(
    client: &Client,
    subject: async_nats::Subject,
    response: &RpcResponse,
) {
    let text = match response.serialize() {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to serialize reply: {}", e);
            return;
        }
    };
    if let Err(e) = client.publish(subject, text.into()).await {
        warn!("Failed to publish reply: {}", e);
    }
}

pub(super) async fn request(
    client: &Client,
    subject: &str,
    data: Value,
    timeout: Duration,
) -> Result<Value, BusError> {
    let frame = RpcRequest::new(uuid::Uuid::new_v4().to_string(), subject, data);
    let payload = serde_json::to_vec(&frame).map_err(FrameError::from)?;

    let pending = client.request(subject.to_string(), payload.into());
    let message = tokio::time::timeout(timeout, pending)
        .await
        .map_err(|_| BusError::Timeout(subject.to_string()))?
        .map_err(|e| match e.kind() {
            RequestErrorKind::NoResponders => BusError::NoResponders(subject.to_string()),
            RequestErrorKind::TimedOut => BusError::Timeout(subject.to_string()),
            _ => BusError::Request(e),
        })?;

    RpcResponse::from_slice(&message.payload)?
        .into_result()
        .map_err(BusError::Remote)
}
