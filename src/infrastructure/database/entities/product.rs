//! Product entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product row. Rows are never deleted; `available = false` is a soft delete.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Store-generated id
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(column_type = "Double")]
    pub price: f64,

    /// Soft-delete flag, defaults to true
    pub available: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
