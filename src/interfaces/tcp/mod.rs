//! TCP transport for the RPC patterns

mod client;
mod server;

pub use client::{ClientError, TcpClient};
pub use server::TcpTransport;

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::*;
    use crate::application::ProductsService;
    use crate::infrastructure::InMemoryProductRepository;
    use crate::interfaces::rpc::{ProductsController, RpcErrorPolicy, RpcHandler};
    use crate::shared::ShutdownSignal;

    type TransportTask = tokio::task::JoinHandle<std::io::Result<()>>;

    async fn start() -> (SocketAddr, ShutdownSignal, TransportTask) {
        let repo = Arc::new(InMemoryProductRepository::connected());
        let service = Arc::new(ProductsService::new(repo));
        let handler: Arc<dyn RpcHandler> =
            Arc::new(ProductsController::new(service, RpcErrorPolicy::default()));

        let shutdown = ShutdownSignal::new();
        let transport = TcpTransport::bind("127.0.0.1:0", handler)
            .await
            .unwrap()
            .with_shutdown(shutdown.clone());
        let addr = transport.local_addr().unwrap();
        let task = tokio::spawn(transport.run());
        (addr, shutdown, task)
    }

    #[tokio::test]
    async fn widget_scenario_end_to_end() {
        let (addr, shutdown, task) = start().await;
        let mut client = TcpClient::connect(addr).await.unwrap();

        let created = client
            .send("create_product", json!({"name": "Widget", "price": 9.99}))
            .await
            .unwrap();
        assert_eq!(
            created,
            json!({"id": 1, "name": "Widget", "price": 9.99, "available": true})
        );

        let page = client
            .send("find_all_products", json!({"page": 1, "limit": 10}))
            .await
            .unwrap();
        assert_eq!(page["metadata"], json!({"page": 1, "totalPages": 1}));

        let removed = client.send("delete_product", json!({"id": 1})).await.unwrap();
        assert_eq!(removed["available"], Value::Bool(false));

        let err = client
            .send("find_one_product", json!({"id": 1}))
            .await
            .unwrap_err();
        match err {
            ClientError::Remote(e) => {
                assert_eq!(e.status, 400);
                assert_eq!(e.message, "Product with id 1 not found");
            }
            other => panic!("unexpected error: {other}"),
        }

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_pattern_is_reported_on_the_wire() {
        let (addr, shutdown, _task) = start().await;
        let mut client = TcpClient::connect(addr).await.unwrap();

        let err = client.send("drop_tables", json!({})).await.unwrap_err();
        match err {
            ClientError::Remote(e) => assert_eq!(e.status, 404),
            other => panic!("unexpected error: {other}"),
        }
        shutdown.trigger();
    }

    #[tokio::test]
    async fn malformed_line_gets_an_error_frame_and_connection_survives() {
        let (addr, shutdown, _task) = start().await;
        let mut client = TcpClient::connect(addr).await.unwrap();

        let reply = client.send_raw("not json").await.unwrap();
        let reply: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(reply["id"], Value::Null);
        assert_eq!(reply["err"]["status"], json!(400));
        assert_eq!(reply["isDisposed"], json!(true));

        let page = client.send("find_all_products", json!({})).await.unwrap();
        assert_eq!(page["data"], json!([]));
        shutdown.trigger();
    }

    #[tokio::test]
    async fn object_patterns_are_accepted() {
        let (addr, shutdown, _task) = start().await;
        let mut client = TcpClient::connect(addr).await.unwrap();

        let line = json!({
            "id": "abc",
            "pattern": {"cmd": "validate_products"},
            "data": {"ids": []}
        })
        .to_string();
        let reply: Value = serde_json::from_str(&client.send_raw(&line).await.unwrap()).unwrap();
        assert_eq!(reply["id"], json!("abc"));
        assert_eq!(reply["response"], json!([]));
        shutdown.trigger();
    }
}
