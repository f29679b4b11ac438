//! Search a single contract's status by id.
//!
//! Independent of the [`Synchronizer`](crate::Synchronizer): a lookup never
//! reads or writes the snapshot. It only reports enough for the caller to
//! open the detail view, which fetches the contract itself.

use std::sync::Arc;

use contract_intel_core::ContractStatus;
use thiserror::Error;
use tracing::info;

use crate::error::{ErrorKind, ServiceError};
use crate::service::ContractService;

pub const EMPTY_ID_MESSAGE: &str = "Please enter a Contract ID.";
pub const NOT_FOUND_MESSAGE: &str = "Contract not found or error fetching status.";

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub id: String,
    pub status: ContractStatus,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The id was empty; nothing was sent.
    #[error("Please enter a Contract ID.")]
    Validation,

    /// The service answered but did not produce a status. Holds the
    /// service's own detail when it gave one.
    #[error("{0}")]
    Rejected(String),

    /// No response from the service.
    #[error("Error searching: {0}")]
    Transport(String),
}

pub struct Lookup {
    service: Arc<dyn ContractService>,
}

impl Lookup {
    pub fn new(service: Arc<dyn ContractService>) -> Self {
        Self { service }
    }

    pub async fn find_status(&self, id: &str) -> Result<StatusReport, LookupError> {
        if id.trim().is_empty() {
            return Err(LookupError::Validation);
        }

        match self.service.get_status(id).await {
            Ok(status) => {
                info!(id, status = %status, "contract status found");
                Ok(StatusReport {
                    id: id.to_string(),
                    status,
                })
            }
            Err(err) => Err(classify(err)),
        }
    }
}

fn classify(err: ServiceError) -> LookupError {
    if err.kind() == ErrorKind::Network {
        return LookupError::Transport(err.to_string());
    }
    match err.server_detail() {
        Some(detail) => LookupError::Rejected(detail.to_string()),
        None => LookupError::Rejected(NOT_FOUND_MESSAGE.to_string()),
    }
}
