use async_trait::async_trait;
use contract_intel_core::{Contract, ContractStatus, UploadReceipt};

use crate::error::ServiceError;

/// Request/response contract of the remote contract service.
///
/// Every call is a single request: no retries, caching or deduplication.
/// All calls except [`upload_contract`](ContractService::upload_contract)
/// are safe to repeat; each upload creates a new contract.
#[async_trait]
pub trait ContractService: Send + Sync {
    /// Every contract the service knows about.
    async fn list_contracts(&self) -> Result<Vec<Contract>, ServiceError>;

    /// The full record for `id`, including any extracted data.
    async fn get_contract(&self, id: &str) -> Result<Contract, ServiceError>;

    /// Only the processing status for `id`.
    async fn get_status(&self, id: &str) -> Result<ContractStatus, ServiceError>;

    /// Submit one file for processing.
    async fn upload_contract(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, ServiceError>;
}
