//! Request DTOs
//!
//! Unknown fields are rejected. Numeric fields accept either a JSON number or
//! a string holding one (`"2"` → `2`).

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::domain::{NewProduct, ProductPatch};
use crate::shared::{PaginationParams, DEFAULT_LIMIT, DEFAULT_PAGE};

// ── Numeric coercion ───────────────────────────────────────────

fn coerce<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let number = match value {
        Value::Number(n) => n,
        Value::String(s) => s
            .trim()
            .parse::<serde_json::Number>()
            .map_err(|_| de::Error::custom(format!("expected a number, got {:?}", s)))?,
        other => {
            return Err(de::Error::custom(format!(
                "expected a number, got {}",
                other
            )))
        }
    };
    serde_json::from_value(Value::Number(number)).map_err(de::Error::custom)
}

fn coerce_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    coerce(value).map(Some).map_err(de::Error::custom)
}

// ── Products ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateProductDto {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[serde(deserialize_with = "coerce")]
    #[validate(range(exclusive_min = 0.0, message = "price must be a positive number"))]
    pub price: f64,
}

impl From<CreateProductDto> for NewProduct {
    fn from(dto: CreateProductDto) -> Self {
        NewProduct::new(dto.name, dto.price)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductDto {
    #[serde(deserialize_with = "coerce")]
    #[validate(range(min = 1, message = "id must be a positive number"))]
    pub id: i32,
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "coerce_opt")]
    #[validate(range(exclusive_min = 0.0, message = "price must be a positive number"))]
    pub price: Option<f64>,
}

impl UpdateProductDto {
    /// Split into the target id and the patch; the id never reaches the patch.
    pub fn into_parts(self) -> (i32, ProductPatch) {
        (
            self.id,
            ProductPatch {
                name: self.name,
                price: self.price,
            },
        )
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct FindOneProductDto {
    #[serde(deserialize_with = "coerce")]
    #[validate(range(min = 1, message = "id must be a positive number"))]
    pub id: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct DeleteProductDto {
    #[serde(deserialize_with = "coerce")]
    #[validate(range(min = 1, message = "id must be a positive number"))]
    pub id: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ValidateProductsDto {
    pub ids: Vec<i32>,
}

// ── Pagination ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PaginationDto {
    #[serde(default, deserialize_with = "coerce_opt")]
    #[validate(range(min = 1, message = "page must be a positive number"))]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "coerce_opt")]
    #[validate(range(min = 1, message = "limit must be a positive number"))]
    pub limit: Option<u64>,
}

impl PaginationDto {
    pub fn params(&self) -> PaginationParams {
        PaginationParams::new(
            self.page.unwrap_or(DEFAULT_PAGE),
            self.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}
