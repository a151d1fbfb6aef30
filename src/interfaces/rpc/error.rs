//! Caller-visible failures
//!
//! Every failure crossing the RPC boundary is flattened into
//! `{"status": <u16>, "message": <string>}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::shared::{AppError, DomainError};

pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const NO_HANDLER_MESSAGE: &str =
    "There is no matching message handler defined in the remote service.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message} (status {status})")]
pub struct RpcError {
    pub status: u16,
    pub message: String,
}

impl RpcError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(STATUS_BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(STATUS_INTERNAL_ERROR, INTERNAL_ERROR_MESSAGE)
    }

    pub fn no_handler() -> Self {
        Self::new(STATUS_NOT_FOUND, NO_HANDLER_MESSAGE)
    }
}

/// Status codes chosen per deployment.
///
/// A missing product is reported as bad-request by default; deployments that
/// want a semantic not-found set `not_found_status = 404`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcErrorPolicy {
    pub not_found_status: u16,
}

impl Default for RpcErrorPolicy {
    fn default() -> Self {
        Self {
            not_found_status: STATUS_BAD_REQUEST,
        }
    }
}

impl RpcErrorPolicy {
    pub fn to_rpc(&self, err: &AppError) -> RpcError {
        match err {
            AppError::Domain(e @ DomainError::ProductNotFound(_)) => {
                RpcError::new(self.not_found_status, e.to_string())
            }
            AppError::Domain(e @ DomainError::InvalidProducts) => {
                RpcError::bad_request(e.to_string())
            }
            AppError::Infra(e) => {
                error!(error = %e, "Store failure");
                RpcError::internal()
            }
        }
    }
}
