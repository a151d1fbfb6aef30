//! Product store interface

use async_trait::async_trait;

use super::model::{NewProduct, Product, ProductPatch};
use crate::shared::InfraResult;

/// Store access for products.
///
/// The service owns one of these by composition. `connect` and `disconnect`
/// bracket its use; the rest map one-to-one onto store queries.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn connect(&self) -> InfraResult<()>;
    async fn disconnect(&self) -> InfraResult<()>;

    /// Insert a new product with `available = true`.
    async fn insert(&self, product: NewProduct) -> InfraResult<Product>;

    async fn count_available(&self) -> InfraResult<u64>;

    /// Available products in insertion order, `limit` rows from `offset`.
    async fn find_available_page(&self, offset: u64, limit: u64) -> InfraResult<Vec<Product>>;

    async fn find_available_by_id(&self, id: i32) -> InfraResult<Option<Product>>;

    /// Apply a partial update and return the row as stored afterwards.
    async fn update(&self, id: i32, patch: ProductPatch) -> InfraResult<Product>;

    /// Set the availability flag and return the row as stored afterwards.
    async fn set_available(&self, id: i32, available: bool) -> InfraResult<Product>;

    /// Every product whose id is in `ids`, regardless of availability.
    async fn find_by_ids(&self, ids: &[i32]) -> InfraResult<Vec<Product>>;
}
