//! RPC boundary: framing, request DTOs, validation and the products handlers

pub mod controller;
pub mod dto;
pub mod error;
pub mod frame;
pub mod pattern;
pub mod validated;

pub use controller::{ProductsController, RpcHandler};
pub use error::{RpcError, RpcErrorPolicy};
pub use frame::{FrameError, RpcRequest, RpcResponse};
pub use pattern::ProductPattern;
pub use validated::{Validated, ValidationRejection};
