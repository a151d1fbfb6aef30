//! In-memory product store

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{NewProduct, Product, ProductPatch, ProductRepository};
use crate::shared::{InfraError, InfraResult};

/// In-memory store for development and testing.
///
/// Ids are handed out by a counter starting at 1, so ordering by id matches
/// insertion order the same way the SQL store does.
pub struct InMemoryProductRepository {
    products: DashMap<i32, Product>,
    next_id: AtomicI32,
    connected: AtomicBool,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            products: DashMap::new(),
            next_id: AtomicI32::new(1),
            connected: AtomicBool::new(false),
        }
    }

    /// A store that is already connected.
    pub fn connected() -> Self {
        let repo = Self::new();
        repo.connected.store(true, Ordering::SeqCst);
        repo
    }

    fn ensure_connected(&self) -> InfraResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(InfraError::Unavailable("in-memory store is not connected".into()))
        }
    }

    fn missing(id: i32) -> InfraError {
        InfraError::Database(sea_orm::DbErr::RecordNotFound(format!("product {}", id)))
    }

    fn sorted_available(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|entry| entry.available)
            .map(|entry| entry.value().clone())
            .collect();
        products.sort_by_key(|p| p.id);
        products
    }
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn connect(&self) -> InfraResult<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> InfraResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn insert(&self, new: NewProduct) -> InfraResult<Product> {
        self.ensure_connected()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let product = Product {
            id,
            name: new.name,
            price: new.price,
            available: true,
        };
        self.products.insert(id, product.clone());
        Ok(product)
    }

    async fn count_available(&self) -> InfraResult<u64> {
        self.ensure_connected()?;
        Ok(self.products.iter().filter(|entry| entry.available).count() as u64)
    }

    async fn find_available_page(&self, offset: u64, limit: u64) -> InfraResult<Vec<Product>> {
        self.ensure_connected()?;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .sorted_available()
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn find_available_by_id(&self, id: i32) -> InfraResult<Option<Product>> {
        self.ensure_connected()?;
        Ok(self
            .products
            .get(&id)
            .filter(|entry| entry.available)
            .map(|entry| entry.value().clone()))
    }

    async fn update(&self, id: i32, patch: ProductPatch) -> InfraResult<Product> {
        self.ensure_connected()?;
        let mut entry = self.products.get_mut(&id).ok_or_else(|| Self::missing(id))?;
        patch.apply_to(entry.value_mut());
        Ok(entry.value().clone())
    }

    async fn set_available(&self, id: i32, available: bool) -> InfraResult<Product> {
        self.ensure_connected()?;
        let mut entry = self.products.get_mut(&id).ok_or_else(|| Self::missing(id))?;
        entry.available = available;
        Ok(entry.value().clone())
    }

    async fn find_by_ids(&self, ids: &[i32]) -> InfraResult<Vec<Product>> {
        self.ensure_connected()?;
        let mut found: Vec<Product> = ids
            .iter()
            .filter_map(|id| self.products.get(id).map(|entry| entry.value().clone()))
            .collect();
        found.sort_by_key(|p| p.id);
        found.dedup_by_key(|p| p.id);
        Ok(found)
    }
}
