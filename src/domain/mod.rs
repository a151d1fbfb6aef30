pub mod product;

// Re-export commonly used types
pub use product::{NewProduct, Product, ProductPatch, ProductRepository};

// Re-export errors from shared for convenience
pub use crate::shared::errors::{AppError, AppResult, DomainError};
