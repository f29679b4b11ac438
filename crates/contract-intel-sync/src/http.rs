//! HTTP client for the remote contract service.

use async_trait::async_trait;
use contract_intel_core::{Contract, ContractStatus, ErrorBody, StatusResponse, UploadReceipt};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ServiceError;
use crate::service::ContractService;

/// reqwest-backed [`ContractService`].
#[derive(Debug, Clone)]
pub struct ContractClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ContractClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let base_url = Url::parse(config.base_url()).map_err(|e| {
            ServiceError::Validation(format!("invalid service URL {}: {e}", config.base_url()))
        })?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Link to the original uploaded file. Handed to the user, never fetched.
    pub fn download_url(&self, id: &str) -> String {
        self.endpoint(&["contracts", id, "download"]).to_string()
    }

    /// Join percent-encoded path segments onto the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<Response, ServiceError> {
        debug!(url = %url, "GET");
        Ok(self.client.get(url).send().await?)
    }
}

#[async_trait]
impl ContractService for ContractClient {
    async fn list_contracts(&self) -> Result<Vec<Contract>, ServiceError> {
        let url = self.endpoint(&["contracts"]);
        info!(url = %url, "listing contracts");
        let resp = self.get(url).await?;
        if !resp.status().is_success() {
            return Err(rejection(resp, false).await);
        }
        let contracts: Vec<Contract> = read_json(resp).await?;
        info!(count = contracts.len(), "listed contracts");
        Ok(contracts)
    }

    async fn get_contract(&self, id: &str) -> Result<Contract, ServiceError> {
        let url = self.endpoint(&["contracts", id]);
        info!(url = %url, "fetching contract");
        let resp = self.get(url).await?;
        if !resp.status().is_success() {
            return Err(rejection(resp, true).await);
        }
        read_json(resp).await
    }

    async fn get_status(&self, id: &str) -> Result<ContractStatus, ServiceError> {
        let url = self.endpoint(&["contracts", id, "status"]);
        info!(url = %url, "fetching contract status");
        let resp = self.get(url).await?;
        if !resp.status().is_success() {
            return Err(rejection(resp, true).await);
        }
        let body: StatusResponse = read_json(resp).await?;
        Ok(body.status)
    }

    async fn upload_contract(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, ServiceError> {
        if file_name.trim().is_empty() {
            return Err(ServiceError::Validation("No file selected.".into()));
        }
        if bytes.is_empty() {
            return Err(ServiceError::Validation(format!("{file_name} is empty.")));
        }

        let url = self.endpoint(&["contracts", "upload"]);
        info!(url = %url, file = file_name, size = bytes.len(), "uploading contract");
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?;
        let form = Form::new().part("file", part);

        let resp = self.client.post(url).multipart(form).send().await?;
        if !resp.status().is_success() {
            return Err(rejection(resp, false).await);
        }
        let receipt: UploadReceipt = read_json(resp).await?;
        info!(contract_id = %receipt.contract_id, "upload accepted");
        Ok(receipt)
    }
}

fn mime_for(file_name: &str) -> &'static str {
    if file_name.to_ascii_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

/// Decode a 2xx body. Anything that does not parse counts as an HTTP failure.
async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ServiceError> {
    let status = resp.status().as_u16();
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| ServiceError::Decode { status, source })
}

/// Turn a non-2xx response into an error, keeping the service's `detail`.
async fn rejection(resp: Response, not_found_is_distinct: bool) -> ServiceError {
    let status = resp.status();
    let detail = match resp.bytes().await {
        Ok(bytes) => serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.detail),
        Err(_) => None,
    };
    info!(status = status.as_u16(), detail = ?detail, "service rejected request");

    if not_found_is_distinct && status == StatusCode::NOT_FOUND {
        return ServiceError::NotFound { detail };
    }
    ServiceError::Http {
        status: status.as_u16(),
        detail,
        reason: status.canonical_reason().unwrap_or_default().to_string(),
    }
}
