//! Product catalog service: application-layer orchestration
//!
//! Transport handlers are thin wrappers that delegate here. Every operation
//! talks to the store through the injected `ProductRepository`; nothing is
//! cached between calls.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{error, info};

use crate::domain::{NewProduct, Product, ProductPatch, ProductRepository};
use crate::shared::{AppResult, DomainError, PaginatedResult, PaginationParams};

/// Product service.
///
/// Generic over `R: ProductRepository` so it stays decoupled from the
/// concrete persistence layer.
pub struct ProductsService<R: ProductRepository> {
    repo: Arc<R>,
}

impl<R: ProductRepository> ProductsService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    // ── Lifecycle ───────────────────────────────────────────────

    pub async fn connect(&self) -> AppResult<()> {
        self.repo.connect().await?;
        info!("Connected to the database");
        Ok(())
    }

    pub async fn disconnect(&self) -> AppResult<()> {
        self.repo.disconnect().await?;
        info!("Disconnected from the database");
        Ok(())
    }

    // ── Commands (mutations) ────────────────────────────────────

    pub async fn create(&self, input: NewProduct) -> AppResult<Product> {
        let product = self.repo.insert(input).await?;
        info!(product_id = product.id, "Product created");
        Ok(product)
    }

    /// Partial update of an available product.
    pub async fn update(&self, id: i32, patch: ProductPatch) -> AppResult<Product> {
        self.find_one(id).await?;
        Ok(self.repo.update(id, patch).await?)
    }

    /// Soft delete. Returns the product as stored after the flag flip.
    pub async fn remove(&self, id: i32) -> AppResult<Product> {
        self.find_one(id).await?;
        let product = self.repo.set_available(id, false).await?;
        info!(product_id = id, "Product marked unavailable");
        Ok(product)
    }

    // ── Queries ─────────────────────────────────────────────────

    /// One page of available products.
    ///
    /// Count and slice are separate queries without a shared snapshot, so
    /// under concurrent writes `totalPages` may lag `data` slightly.
    pub async fn find_all(&self, params: PaginationParams) -> AppResult<PaginatedResult<Product>> {
        let total = self.repo.count_available().await?;

        let offset = params.offset();
        let data = if offset >= total {
            Vec::new()
        } else {
            self.repo.find_available_page(offset, params.limit).await?
        };

        Ok(PaginatedResult::new(data, total, params))
    }

    pub async fn find_one(&self, id: i32) -> AppResult<Product> {
        self.repo
            .find_available_by_id(id)
            .await?
            .ok_or_else(|| DomainError::ProductNotFound(id).into())
    }

    /// Resolve a batch of ids, failing if any of them does not exist.
    ///
    /// Duplicates are collapsed first. Availability is not checked here:
    /// only ids with no row at all make the batch invalid.
    pub async fn validate_products(&self, ids: &[i32]) -> AppResult<Vec<Product>> {
        let unique: BTreeSet<i32> = ids.iter().copied().collect();
        let unique: Vec<i32> = unique.into_iter().collect();

        let products = self.repo.find_by_ids(&unique).await?;

        if products.len() != unique.len() {
            let missing: Vec<i32> = unique
                .iter()
                .copied()
                .filter(|id| !products.iter().any(|p| p.id == *id))
                .collect();
            error!(?missing, "Some products are invalid");
            return Err(DomainError::InvalidProducts.into());
        }

        Ok(products)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryProductRepository;
    use crate::shared::{AppError, InfraError};

    fn service() -> ProductsService<InMemoryProductRepository> {
        ProductsService::new(Arc::new(InMemoryProductRepository::connected()))
    }

    async fn seed(service: &ProductsService<InMemoryProductRepository>, count: usize) {
        for i in 1..=count {
            service
                .create(NewProduct::new(format!("Product {}", i), i as f64))
                .await
                .unwrap();
        }
    }

    fn is_not_found(err: &AppError, expected: i32) -> bool {
        matches!(err, AppError::Domain(DomainError::ProductNotFound(id)) if *id == expected)
    }

    #[tokio::test]
    async fn widget_lifecycle() {
        let service = service();

        let widget = service
            .create(NewProduct::new("Widget", 9.99))
            .await
            .unwrap();
        assert_eq!(widget.id, 1);
        assert!(widget.available);

        let page = service.find_all(PaginationParams::new(1, 10)).await.unwrap();
        assert_eq!(page.data, vec![widget.clone()]);
        assert_eq!(page.metadata.page, 1);
        assert_eq!(page.metadata.total_pages, 1);

        let removed = service.remove(1).await.unwrap();
        assert_eq!(removed.id, 1);
        assert!(!removed.available);

        let page = service.find_all(PaginationParams::new(1, 10)).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.metadata.total_pages, 0);

        let err = service.find_one(1).await.unwrap_err();
        assert!(is_not_found(&err, 1));
        assert_eq!(err.to_string(), "Product with id 1 not found");
    }

    #[tokio::test]
    async fn create_then_find_one_round_trips() {
        let service = service();
        let created = service
            .create(NewProduct::new("Gadget", 12.5))
            .await
            .unwrap();

        let found = service.find_one(created.id).await.unwrap();
        assert_eq!(found.name, "Gadget");
        assert_eq!(found.price, 12.5);
        assert!(found.available);
    }

    #[tokio::test]
    async fn find_one_of_unknown_id_is_not_found() {
        let service = service();
        let err = service.find_one(404).await.unwrap_err();
        assert!(is_not_found(&err, 404));
    }

    #[tokio::test]
    async fn pages_are_bounded_by_limit() {
        let service = service();
        seed(&service, 7).await;

        let first = service.find_all(PaginationParams::new(1, 3)).await.unwrap();
        assert_eq!(first.data.len(), 3);
        assert_eq!(first.metadata.total_pages, 3);

        let last = service.find_all(PaginationParams::new(3, 3)).await.unwrap();
        assert_eq!(last.data.len(), 1);
        assert_eq!(last.data[0].id, 7);
        assert_eq!(last.metadata.page, 3);
    }

    #[tokio::test]
    async fn page_beyond_range_is_empty_not_an_error() {
        let service = service();
        seed(&service, 2).await;

        let page = service.find_all(PaginationParams::new(5, 10)).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.metadata.page, 5);
        assert_eq!(page.metadata.total_pages, 1);
    }

    #[tokio::test]
    async fn total_pages_ignore_removed_products() {
        let service = service();
        seed(&service, 4).await;
        service.remove(1).await.unwrap();
        service.remove(2).await.unwrap();

        let page = service.find_all(PaginationParams::new(1, 1)).await.unwrap();
        assert_eq!(page.metadata.total_pages, 2);
        assert_eq!(page.data[0].id, 3);
    }

    #[tokio::test]
    async fn update_changes_only_patched_fields() {
        let service = service();
        seed(&service, 1).await;

        let updated = service
            .update(
                1,
                ProductPatch {
                    name: Some("Renamed".into()),
                    price: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, 1);
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.price, 1.0);
    }

    #[tokio::test]
    async fn update_of_removed_product_is_not_found() {
        let service = service();
        seed(&service, 1).await;
        service.remove(1).await.unwrap();

        let err = service
            .update(1, ProductPatch::default())
            .await
            .unwrap_err();
        assert!(is_not_found(&err, 1));
    }

    #[tokio::test]
    async fn second_remove_is_not_found() {
        let service = service();
        seed(&service, 1).await;

        service.remove(1).await.unwrap();
        let err = service.remove(1).await.unwrap_err();
        assert!(is_not_found(&err, 1));
    }

    #[tokio::test]
    async fn validate_products_deduplicates_before_counting() {
        let service = service();
        seed(&service, 2).await;

        let products = service.validate_products(&[1, 1, 2]).await.unwrap();
        assert_eq!(products.len(), 2);
    }

    #[tokio::test]
    async fn validate_products_rejects_unknown_ids() {
        let service = service();
        seed(&service, 1).await;

        let err = service.validate_products(&[1, 99]).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::InvalidProducts)));
        assert_eq!(err.to_string(), "Some products are invalid");
    }

    #[tokio::test]
    async fn validate_products_counts_removed_products_as_existing() {
        let service = service();
        seed(&service, 2).await;
        service.remove(2).await.unwrap();

        let products = service.validate_products(&[1, 2]).await.unwrap();
        assert_eq!(products.len(), 2);
        assert!(!products[1].available);
    }

    #[tokio::test]
    async fn validate_products_of_empty_batch_is_empty() {
        let service = service();
        assert!(service.validate_products(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failures_propagate_untranslated() {
        let service = ProductsService::new(Arc::new(InMemoryProductRepository::new()));
        let err = service.find_one(1).await.unwrap_err();
        assert!(matches!(err, AppError::Infra(InfraError::Unavailable(_))));

        service.connect().await.unwrap();
        assert!(service.find_all(PaginationParams::default()).await.is_ok());

        service.disconnect().await.unwrap();
        assert!(service.create(NewProduct::new("A", 1.0)).await.is_err());
    }
}
