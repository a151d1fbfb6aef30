//! SeaORM implementation of ProductRepository

use async_trait::async_trait;
use log::{debug, info};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::domain::{NewProduct, Product, ProductPatch, ProductRepository};
use crate::infrastructure::database::entities::product;
use crate::shared::InfraResult;

// Upper bound the SQLite binder accepts for LIMIT/OFFSET values
const MAX_BIND: u64 = i64::MAX as u64;

// ── Conversion helpers ──────────────────────────────────────────

fn entity_to_domain(p: product::Model) -> Product {
    Product {
        id: p.id,
        name: p.name,
        price: p.price,
        available: p.available,
    }
}

fn missing_row(id: i32) -> DbErr {
    DbErr::RecordNotFound(format!("product {}", id))
}

// ── SeaOrmProductRepository ─────────────────────────────────────

pub struct SeaOrmProductRepository {
    db: DatabaseConnection,
}

impl SeaOrmProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: i32) -> InfraResult<product::Model> {
        let model = product::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| missing_row(id))?;
        Ok(model)
    }
}

#[async_trait]
impl ProductRepository for SeaOrmProductRepository {
    async fn connect(&self) -> InfraResult<()> {
        self.db.ping().await?;
        Ok(())
    }

    async fn disconnect(&self) -> InfraResult<()> {
        self.db.clone().close().await?;
        info!("Database connection closed");
        Ok(())
    }

    async fn insert(&self, new: NewProduct) -> InfraResult<Product> {
        let model = product::ActiveModel {
            name: Set(new.name),
            price: Set(new.price),
            available: Set(true),
            ..Default::default()
        };
        let result = model.insert(&self.db).await?;
        info!("Product saved: {} ({})", result.name, result.id);
        Ok(entity_to_domain(result))
    }

    async fn count_available(&self) -> InfraResult<u64> {
        let total = product::Entity::find()
            .filter(product::Column::Available.eq(true))
            .count(&self.db)
            .await?;
        Ok(total)
    }

    async fn find_available_page(&self, offset: u64, limit: u64) -> InfraResult<Vec<Product>> {
        let models = product::Entity::find()
            .filter(product::Column::Available.eq(true))
            .order_by_asc(product::Column::Id)
            .offset(offset.min(MAX_BIND))
            .limit(limit.min(MAX_BIND))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }

    async fn find_available_by_id(&self, id: i32) -> InfraResult<Option<Product>> {
        let model = product::Entity::find()
            .filter(product::Column::Id.eq(id))
            .filter(product::Column::Available.eq(true))
            .one(&self.db)
            .await?;
        Ok(model.map(entity_to_domain))
    }

    async fn update(&self, id: i32, patch: ProductPatch) -> InfraResult<Product> {
        let existing = self.find_model(id).await?;
        if patch.is_empty() {
            debug!("Empty patch for product {}, nothing to write", id);
            return Ok(entity_to_domain(existing));
        }

        let mut model: product::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            model.name = Set(name);
        }
        if let Some(price) = patch.price {
            model.price = Set(price);
        }
        let updated = model.update(&self.db).await?;
        info!("Product {} updated", updated.id);
        Ok(entity_to_domain(updated))
    }

    async fn set_available(&self, id: i32, available: bool) -> InfraResult<Product> {
        let existing = self.find_model(id).await?;
        let mut model: product::ActiveModel = existing.into();
        model.available = Set(available);
        let updated = model.update(&self.db).await?;
        info!("Product {} availability set to {}", updated.id, updated.available);
        Ok(entity_to_domain(updated))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> InfraResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = product::Entity::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(product::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(entity_to_domain).collect())
    }
}

// ── Tests ──────────────────────────────────────────────────────
