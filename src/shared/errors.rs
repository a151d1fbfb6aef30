use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Product with id {0} not found")]
    ProductNotFound(i32),

    #[error("Some products are invalid")]
    InvalidProducts,
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),
}

/// Result type for store operations
pub type InfraResult<T> = Result<T, InfraError>;

/// Result type for service operations
pub type AppResult<T> = Result<T, AppError>;
