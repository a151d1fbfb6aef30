//! Application layer - use-cases over the domain

pub mod products;

pub use products::ProductsService;
