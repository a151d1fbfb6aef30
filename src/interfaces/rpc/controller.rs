//! Products message handlers
//!
//! Each handler validates its payload, calls the service and serializes the
//! result. No other logic lives here.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::dto::{
    CreateProductDto, DeleteProductDto, FindOneProductDto, PaginationDto, UpdateProductDto,
    ValidateProductsDto,
};
use super::error::{RpcError, RpcErrorPolicy};
use super::frame::{RpcRequest, RpcResponse};
use super::pattern::ProductPattern;
use super::validated::Validated;
use crate::application::ProductsService;
use crate::domain::ProductRepository;
use crate::shared::{AppError, AppResult, InfraError};

/// Anything a transport can hand a decoded request to.
#[async_trait]
pub trait RpcHandler: Send + Sync {
    /// Command names this handler serves.
    fn patterns(&self) -> Vec<&'static str>;

    async fn handle(&self, request: RpcRequest) -> RpcResponse;
}

pub struct ProductsController<R: ProductRepository> {
    service: Arc<ProductsService<R>>,
    errors: RpcErrorPolicy,
}

impl<R: ProductRepository> ProductsController<R> {
    pub fn new(service: Arc<ProductsService<R>>, errors: RpcErrorPolicy) -> Self {
        Self { service, errors }
    }

    pub async fn dispatch(&self, pattern: &str, data: Value) -> Result<Value, RpcError> {
        let Some(pattern) = ProductPattern::parse(pattern) else {
            warn!(pattern, "No handler for pattern");
            return Err(RpcError::no_handler());
        };
        debug!(%pattern, "Dispatching request");

        match pattern {
            ProductPattern::Create => self.create(data).await,
            ProductPattern::FindAll => self.find_all(data).await,
            ProductPattern::FindOne => self.find_one(data).await,
            ProductPattern::Update => self.update(data).await,
            ProductPattern::Delete => self.remove(data).await,
            ProductPattern::Validate => self.validate_products(data).await,
        }
    }

    async fn create(&self, data: Value) -> Result<Value, RpcError> {
        let Validated(dto) = Validated::<CreateProductDto>::from_value(data)?;
        self.reply(self.service.create(dto.into()).await)
    }

    async fn find_all(&self, data: Value) -> Result<Value, RpcError> {
        let Validated(dto) = Validated::<PaginationDto>::from_value(data)?;
        self.reply(self.service.find_all(dto.params()).await)
    }

    async fn find_one(&self, data: Value) -> Result<Value, RpcError> {
        let Validated(dto) = Validated::<FindOneProductDto>::from_value(data)?;
        self.reply(self.service.find_one(dto.id).await)
    }

    async fn update(&self, data: Value) -> Result<Value, RpcError> {
        let Validated(dto) = Validated::<UpdateProductDto>::from_value(data)?;
        let (id, patch) = dto.into_parts();
        self.reply(self.service.update(id, patch).await)
    }

    async fn remove(&self, data: Value) -> Result<Value, RpcError> {
        let Validated(dto) = Validated::<DeleteProductDto>::from_value(data)?;
        self.reply(self.service.remove(dto.id).await)
    }

    async fn validate_products(&self, data: Value) -> Result<Value, RpcError> {
        let Validated(dto) = Validated::<ValidateProductsDto>::from_value(data)?;
        self.reply(self.service.validate_products(&dto.ids).await)
    }

    fn reply<T: Serialize>(&self, result: AppResult<T>) -> Result<Value, RpcError> {
        let payload = result.map_err(|e| self.errors.to_rpc(&e))?;
        serde_json::to_value(payload)
            .map_err(|e| self.errors.to_rpc(&AppError::Infra(InfraError::Serialization(e))))
    }
}

#[async_trait]
impl<R: ProductRepository + 'static> RpcHandler for ProductsController<R> {
    fn patterns(&self) -> Vec<&'static str> {
        ProductPattern::ALL.iter().map(|p| p.as_str()).collect()
    }

    async fn handle(&self, request: RpcRequest) -> RpcResponse {
        let result = match request.pattern_name() {
            Ok(pattern) => self.dispatch(&pattern, request.data).await,
            Err(e) => Err(RpcError::bad_request(e.to_string())),
        };
        RpcResponse::from_result(request.id, result)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryProductRepository;
    use serde_json::json;

    fn controller() -> ProductsController<InMemoryProductRepository> {
        let repo = Arc::new(InMemoryProductRepository::connected());
        ProductsController::new(
            Arc::new(ProductsService::new(repo)),
            RpcErrorPolicy::default(),
        )
    }

    #[tokio::test]
    async fn widget_scenario_over_patterns() {
        let c = controller();

        let created = c
            .dispatch("create_product", json!({"name": "Widget", "price": 9.99}))
            .await
            .unwrap();
        assert_eq!(
            created,
            json!({"id": 1, "name": "Widget", "price": 9.99, "available": true})
        );

        let page = c
            .dispatch("find_all_products", json!({"page": 1, "limit": 10}))
            .await
            .unwrap();
        assert_eq!(page["data"].as_array().unwrap().len(), 1);
        assert_eq!(page["metadata"], json!({"page": 1, "totalPages": 1}));

        let removed = c.dispatch("delete_product", json!({"id": 1})).await.unwrap();
        assert_eq!(removed["available"], json!(false));

        let page = c.dispatch("find_all_products", json!({})).await.unwrap();
        assert_eq!(page, json!({"data": [], "metadata": {"page": 1, "totalPages": 0}}));

        let err = c
            .dispatch("find_one_product", json!({"id": 1}))
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::bad_request("Product with id 1 not found"));
    }

    #[tokio::test]
    async fn not_found_uses_the_configured_status() {
        let repo = Arc::new(InMemoryProductRepository::connected());
        let c = ProductsController::new(
            Arc::new(ProductsService::new(repo)),
            RpcErrorPolicy {
                not_found_status: 404,
            },
        );

        let err = c
            .dispatch("update_product", json!({"id": 5, "name": "x"}))
            .await
            .unwrap_err();
        assert_eq!(err.status, 404);
        assert_eq!(err.message, "Product with id 5 not found");
    }

    #[tokio::test]
    async fn update_rejects_fields_outside_the_patch() {
        let c = controller();
        c.dispatch("create_product", json!({"name": "Widget", "price": 1}))
            .await
            .unwrap();

        let err = c
            .dispatch("update_product", json!({"id": 1, "available": true}))
            .await
            .unwrap_err();
        assert_eq!(err.status, 400);

        let updated = c
            .dispatch("update_product", json!({"id": 1, "price": "2.5"}))
            .await
            .unwrap();
        assert_eq!(updated["price"], json!(2.5));
        assert_eq!(updated["name"], json!("Widget"));
    }

    #[tokio::test]
    async fn validate_products_reports_invalid_batches() {
        let c = controller();
        c.dispatch("create_product", json!({"name": "A", "price": 1}))
            .await
            .unwrap();

        let ok = c
            .dispatch("validate_products", json!({"ids": [1, 1]}))
            .await
            .unwrap();
        assert_eq!(ok.as_array().unwrap().len(), 1);

        let err = c
            .dispatch("validate_products", json!({"ids": [1, 2]}))
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::bad_request("Some products are invalid"));
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_the_service() {
        let c = controller();
        let err = c
            .dispatch("create_product", json!({"name": "A", "price": -1}))
            .await
            .unwrap_err();
        assert_eq!(err.status, 400);

        let page = c.dispatch("find_all_products", Value::Null).await.unwrap();
        assert_eq!(page["metadata"]["totalPages"], json!(0));
    }

    #[tokio::test]
    async fn unknown_pattern_has_no_handler() {
        let err = controller()
            .dispatch("drop_table", Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::no_handler());
    }

    #[tokio::test]
    async fn store_failure_is_internal_error() {
        let repo = Arc::new(InMemoryProductRepository::new());
        let c = ProductsController::new(
            Arc::new(ProductsService::new(repo)),
            RpcErrorPolicy::default(),
        );
        let err = c
            .dispatch("find_one_product", json!({"id": 1}))
            .await
            .unwrap_err();
        assert_eq!(err, RpcError::internal());
    }

    #[tokio::test]
    async fn handle_echoes_request_id() {
        let c = controller();
        let response = c
            .handle(RpcRequest::new(
                "req-1",
                "create_product",
                json!({"name": "A", "price": 2}),
            ))
            .await;
        assert_eq!(response.id.as_deref(), Some("req-1"));
        assert!(response.err.is_none());
        assert!(response.is_disposed);

        let response = c
            .handle(RpcRequest {
                id: Some("req-2".into()),
                pattern: json!({"nope": 1}),
                data: Value::Null,
            })
            .await;
        assert_eq!(response.id.as_deref(), Some("req-2"));
        assert_eq!(response.err.map(|e| e.status), Some(400));
    }

    #[test]
    fn serves_every_product_pattern() {
        let patterns = controller().patterns();
        assert_eq!(patterns.len(), 6);
        assert!(patterns.contains(&"validate_products"));
    }
}
