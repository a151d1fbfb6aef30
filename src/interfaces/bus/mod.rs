//! Message-bus transport
//!
//! Subject-addressed request/reply. A responder subscribes to subjects, a
//! requester publishes to one and waits for a single reply. With broker
//! servers configured the bus runs on NATS; otherwise it stays inside the
//! process on tokio channels.

mod local;
mod nats;
mod transport;

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::interfaces::rpc::{FrameError, RpcError, RpcRequest, RpcResponse};

pub use transport::BusTransport;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("No responders for subject {0}")]
    NoResponders(String),

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("Remote error: {0}")]
    Remote(RpcError),

    #[error("No bus servers configured")]
    NoServers,

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("Failed to connect to NATS: {0}")]
    Connect(#[from] async_nats::ConnectError),

    #[error("Failed to subscribe: {0}")]
    Subscribe(#[from] async_nats::client::SubscribeError),

    #[error("NATS request failed: {0}")]
    Request(async_nats::client::RequestError),
}

/// A request in flight, with the route its reply goes back on.
pub struct BusMessage {
    pub subject: String,
    pub request: RpcRequest,
    reply: Reply,
}

enum Reply {
    Local(oneshot::Sender<RpcResponse>),
    Nats {
        client: async_nats::Client,
        subject: async_nats::Subject,
    },
}

impl BusMessage {
    pub async fn respond(self, response: RpcResponse) {
        match self.reply {
            Reply::Local(tx) => {
                if tx.send(response).is_err() {
                    debug!("Requester for {} went away before the reply", self.subject);
                }
            }
            Reply::Nats { client, subject } => nats::publish(&client, subject, &response).await,
        }
    }
}

/// Stream of requests for the subjects a responder subscribed to.
pub struct Inbox(InboxKind);

enum InboxKind {
    Local(mpsc::Receiver<BusMessage>),
    Nats(nats::NatsInbox),
}

impl Inbox {
    pub async fn next(&mut self) -> Option<BusMessage> {
        match &mut self.0 {
            InboxKind::Local(rx) => rx.recv().await,
            InboxKind::Nats(inbox) => inbox.next().await,
        }
    }
}

#[derive(Clone)]
enum Backend {
    Local(local::LocalBus),
    Nats(async_nats::Client),
}

#[derive(Clone)]
pub struct MessageBus {
    backend: Backend,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    /// Bus confined to this process.
    pub fn new() -> Self {
        Self {
            backend: Backend::Local(local::LocalBus::default()),
        }
    }

    /// Bus backed by the NATS servers given.
    pub async fn connect(servers: &[String]) -> Result<Self, BusError> {
        Ok(Self {
            backend: Backend::Nats(nats::connect(servers).await?),
        })
    }

    pub fn is_local(&self) -> bool {
        matches!(self.backend, Backend::Local(_))
    }

    pub async fn subscribe(&self, subject: &str) -> Result<Inbox, BusError> {
        self.subscribe_many(&[subject]).await
    }

    /// One inbox fed by several subjects.
    pub async fn subscribe_many(&self, subjects: &[&str]) -> Result<Inbox, BusError> {
        let kind = match &self.backend {
            Backend::Local(bus) => InboxKind::Local(bus.subscribe_many(subjects)),
            Backend::Nats(client) => {
                InboxKind::Nats(nats::NatsInbox::subscribe(client, subjects).await?)
            }
        };
        Ok(Inbox(kind))
    }

    /// Publish `data` to `subject` and wait up to `timeout` for the reply.
    pub async fn request(
        &self,
        subject: &str,
        data: Value,
        timeout: Duration,
    ) -> Result<Value, BusError> {
        match &self.backend {
            Backend::Local(bus) => bus.request(subject, data, timeout).await,
            Backend::Nats(client) => nats::request(client, subject, data, timeout).await,
        }
    }
}
