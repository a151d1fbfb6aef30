//! Product aggregate
//!
//! Contains the Product entity, its create/patch payloads, and the
//! store-access interface.

pub mod model;
pub mod repository;

pub use model::{NewProduct, Product, ProductPatch};
pub use repository::ProductRepository;
