//! # Products microservice
//!
//! Product catalog behind an RPC boundary. Six message patterns cover create,
//! paginated listing, lookup, partial update, soft delete and batch
//! validation of product ids.
//!
//! ## Architecture
//!
//! - **domain**: `Product` and the `ProductRepository` store interface
//! - **application**: `ProductsService`, the only place business rules live
//! - **infrastructure**: SeaORM persistence and an in-memory store
//! - **interfaces**: RPC framing and handlers, TCP and message-bus (NATS) transports
//! - **server**: runtime wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryProductRepository, SeaOrmProductRepository,
};

pub use application::ProductsService;
pub use interfaces::{MessageBus, ProductsController, TcpClient, TcpTransport};
