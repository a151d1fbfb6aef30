//! Product catalog use-cases

mod service;

pub use service::ProductsService;
