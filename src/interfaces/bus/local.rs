//! In-process backend: one tokio channel per subject

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::{BusError, BusMessage, Reply};
use crate::interfaces::rpc::RpcRequest;

/// Per-subject inbox capacity
const INBOX_CAPACITY: usize = 256;

#[derive(Clone, Default)]
pub(super) struct LocalBus {
    subjects: Arc<DashMap<String, mpsc::Sender<BusMessage>>>,
}

impl LocalBus {
    /// One inbox fed by several subjects. Subscribing a subject again
    /// replaces its previous responder.
    pub(super) fn subscribe_many(&self, subjects: &[&str]) -> mpsc::Receiver<BusMessage> {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        for subject in subjects {
            self.subjects.insert(subject.to_string(), tx.clone());
        }
        rx
    }

    pub(super) async fn request(
        &self,
        subject: &str,
        data: Value,
        timeout: Duration,
    ) -> Result<Value, BusError> {
        let sender = self
            .subjects
            .get(subject)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BusError::NoResponders(subject.to_string()))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let message = BusMessage {
            subject: subject.to_string(),
            request: RpcRequest::new(uuid::Uuid::new_v4().to_string(), subject, data),
            reply: Reply::Local(reply_tx),
        };

        let exchange = async {
            sender
                .send(message)
                .await
                .map_err(|_| BusError::NoResponders(subject.to_string()))?;
            reply_rx
                .await
                .map_err(|_| BusError::NoResponders(subject.to_string()))
        };

        let response = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| BusError::Timeout(subject.to_string()))??;

        response.into_result().map_err(BusError::Remote)
    }
}
