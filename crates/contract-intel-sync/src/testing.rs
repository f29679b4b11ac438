//! In-memory contract service for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use contract_intel_core::{Contract, ContractStatus, UploadReceipt};
use tokio::sync::oneshot;

use crate::error::ServiceError;
use crate::service::ContractService;

pub(crate) type ListingResult = Result<Vec<Contract>, ServiceError>;

enum Listing {
    Ready(ListingResult),
    Deferred(oneshot::Receiver<ListingResult>),
}

/// Serves `remote` unless a listing has been scripted for the next call.
#[derive(Default)]
pub(crate) struct ScriptedService {
    remote: Mutex<Vec<Contract>>,
    listings: Mutex<VecDeque<Listing>>,
    rejections: Mutex<HashMap<String, (u16, Option<String>)>>,
    unreachable: Mutex<HashSet<String>>,
    fail_uploads: Mutex<Option<String>>,
    list_calls: AtomicUsize,
    status_calls: AtomicUsize,
    upload_calls: AtomicUsize,
}

pub(crate) fn contract(id: &str, status: &str) -> Contract {
    Contract::new(id, ContractStatus::from(status))
}

pub(crate) fn http_error(status: u16) -> ServiceError {
    ServiceError::Http {
        status,
        detail: None,
        reason: "Internal Server Error".into(),
    }
}

impl ScriptedService {
    pub fn with_remote(contracts: Vec<Contract>) -> Self {
        let service = Self::default();
        service.set_remote(contracts);
        service
    }

    pub fn set_remote(&self, contracts: Vec<Contract>) {
        *self.remote.lock().unwrap() = contracts;
    }

    /// The next listing call answers with `result` immediately.
    pub fn push_listing(&self, result: ListingResult) {
        self.listings
            .lock()
            .unwrap()
            .push_back(Listing::Ready(result));
    }

    /// The next listing call waits until the returned sender fires.
    pub fn defer_listing(&self) -> oneshot::Sender<ListingResult> {
        let (tx, rx) = oneshot::channel();
        self.listings
            .lock()
            .unwrap()
            .push_back(Listing::Deferred(rx));
        tx
    }

    /// Answer status lookups for `id` with a non-2xx response.
    pub fn reject(&self, id: &str, status: u16, detail: Option<&str>) {
        self.rejections
            .lock()
            .unwrap()
            .insert(id.to_string(), (status, detail.map(str::to_string)));
    }

    /// Status lookups for `id` fail without any response.
    pub fn unreachable(&self, id: &str) {
        self.unreachable.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_uploads(&self, detail: &str) {
        *self.fail_uploads.lock().unwrap() = Some(detail.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractService for ScriptedService {
    async fn list_contracts(&self) -> Result<Vec<Contract>, ServiceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.listings.lock().unwrap().pop_front();
        match scripted {
            Some(Listing::Ready(result)) => result,
            Some(Listing::Deferred(rx)) => rx.await.unwrap_or_else(|_| Err(http_error(503))),
            None => Ok(self.remote.lock().unwrap().clone()),
        }
    }

    async fn get_contract(&self, id: &str) -> Result<Contract, ServiceError> {
        self.remote
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(ServiceError::NotFound {
                detail: Some("Contract not found".into()),
            })
    }

    async fn get_status(&self, id: &str) -> Result<ContractStatus, ServiceError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.lock().unwrap().contains(id) {
            return Err(ServiceError::Network(Box::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))));
        }
        let rejection = self.rejections.lock().unwrap().get(id).cloned();
        if let Some((status, detail)) = rejection {
            return Err(if status == 404 {
                ServiceError::NotFound { detail }
            } else {
                ServiceError::Http {
                    status,
                    detail,
                    reason: "Internal Server Error".into(),
                }
            });
        }
        self.get_contract(id).await.map(|c| c.status)
    }

    async fn upload_contract(
        &self,
        file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<UploadReceipt, ServiceError> {
        let n = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(detail) = self.fail_uploads.lock().unwrap().clone() {
            return Err(ServiceError::Http {
                status: 500,
                detail: Some(detail),
                reason: "Internal Server Error".into(),
            });
        }
        let id = format!("up-{n}");
        let mut created = contract(&id, "pending");
        created.filename = Some(file_name.to_string());
        self.remote.lock().unwrap().push(created);
        Ok(UploadReceipt {
            contract_id: id,
            message: Some("Contract uploaded and queued for processing".into()),
        })
    }
}
