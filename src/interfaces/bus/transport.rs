use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::{BusError, Inbox, MessageBus};
use crate::interfaces::rpc::RpcHandler;
use crate::shared::ShutdownSignal;

/// Serves an `RpcHandler` on the bus, one subject per pattern.
///
/// Requests are handled concurrently. On shutdown the subscriptions are
/// dropped first, then requests already being handled run to completion.
pub struct BusTransport {
    inbox: Inbox,
    handler: Arc<dyn RpcHandler>,
    shutdown: ShutdownSignal,
}

impl BusTransport {
    pub async fn attach(bus: &MessageBus, handler: Arc<dyn RpcHandler>) -> Result<Self, BusError> {
        let patterns = handler.patterns();
        let inbox = bus.subscribe_many(&patterns).await?;
        Ok(Self {
            inbox,
            handler,
            shutdown: ShutdownSignal::new(),
        })
    }

    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = signal;
        self
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Answer messages until shutdown or until the inbox closes.
    pub async fn run(self) {
        let Self {
            mut inbox,
            handler,
            shutdown,
        } = self;

        info!(
            "📨 RPC transport subscribed on bus: {}",
            handler.patterns().join(", ")
        );

        let stopped = shutdown.notified().wait();
        tokio::pin!(stopped);
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                message = inbox.next() => {
                    let Some(message) = message else {
                        warn!("Bus inbox closed");
                        break;
                    };
                    let handler = handler.clone();
                    in_flight.spawn(async move {
                        let response = handler.handle(message.request.clone()).await;
                        message.respond(response).await;
                    });
                }
                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = result {
                        error!("Bus request task failed: {}", e);
                    }
                }
                _ = &mut stopped => {
                    info!("🛑 Bus transport received shutdown signal");
                    break;
                }
            }
        }

        drop(inbox);
        if !in_flight.is_empty() {
            info!("⏳ Finishing {} in-flight bus request(s)", in_flight.len());
        }
        while let Some(result) = in_flight.join_next().await {
            if let Err(e) = result {
                error!("Bus request task failed: {}", e);
            }
        }
    }
}
