//! Local read replica of the service's contract listing.
//!
//! The [`Synchronizer`] holds the latest [`Snapshot`] and replaces it
//! wholesale on every successful listing. Refreshes are not serialised: when
//! a timer tick and a manual refresh overlap, whichever response resolves
//! last is the snapshot that remains.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use contract_intel_core::{Contract, UploadReceipt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::service::ContractService;
use crate::upload::UploadFile;

/// One complete listing as applied locally. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    contracts: Vec<Contract>,
    index: HashMap<String, usize>,
    refreshed_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl Snapshot {
    /// Build from a listing, keeping service order. A repeated id keeps its
    /// first occurrence.
    fn from_listing(listing: Vec<Contract>, generation: u64) -> Self {
        let mut contracts = Vec::with_capacity(listing.len());
        let mut index = HashMap::with_capacity(listing.len());
        for contract in listing {
            if index.contains_key(&contract.id) {
                warn!(id = %contract.id, "duplicate contract id in listing, keeping first");
                continue;
            }
            index.insert(contract.id.clone(), contracts.len());
            contracts.push(contract);
        }
        Self {
            contracts,
            index,
            refreshed_at: Some(Utc::now()),
            generation,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Contract> {
        self.index.get(id).map(|&i| &self.contracts[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn contracts(&self) -> &[Contract] {
        &self.contracts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.iter()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// When this listing was applied. `None` before the first refresh.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Number of listings applied so far, including this one.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Owns the current [`Snapshot`] and keeps it in step with the service.
pub struct Synchronizer {
    service: Arc<dyn ContractService>,
    current: watch::Sender<Arc<Snapshot>>,
}

impl Synchronizer {
    pub fn new(service: Arc<dyn ContractService>) -> Self {
        let (current, _) = watch::channel(Arc::new(Snapshot::default()));
        Self { service, current }
    }

    /// The latest applied snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.borrow())
    }

    /// Receiver that observes every applied snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.current.subscribe()
    }

    /// Fetch the full listing and replace the snapshot with it.
    ///
    /// On failure the previous snapshot stays in place; the error is logged
    /// and handed back for callers that want it.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, ServiceError> {
        match self.service.list_contracts().await {
            Ok(listing) => {
                let snapshot = self.apply(listing);
                info!(
                    generation = snapshot.generation(),
                    count = snapshot.len(),
                    "contract snapshot replaced"
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "contract refresh failed, keeping previous snapshot");
                Err(e)
            }
        }
    }

    /// Upload one file, then refresh straight away so the new contract shows
    /// up without waiting for the next tick.
    pub async fn upload(&self, file: UploadFile) -> Result<UploadReceipt, ServiceError> {
        let receipt = self
            .service
            .upload_contract(&file.file_name, file.bytes)
            .await?;
        // Failure is already logged by refresh; the upload itself succeeded.
        let _ = self.refresh().await;
        Ok(receipt)
    }

    /// Refresh now and then every `period` until the handle is stopped or
    /// dropped.
    pub fn start_polling(self: &Arc<Self>, period: Duration) -> PollHandle {
        // tokio's interval panics on a zero period.
        let period = period.max(Duration::from_millis(1));
        let sync = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!("poll tick");
                let _ = sync.refresh().await;
            }
        });
        info!(period_ms = period.as_millis() as u64, "contract polling started");
        PollHandle {
            task: Some(task),
            period,
        }
    }

    fn apply(&self, listing: Vec<Contract>) -> Arc<Snapshot> {
        let mut applied = None;
        self.current.send_modify(|current| {
            let next = Arc::new(Snapshot::from_listing(listing, current.generation + 1));
            *current = Arc::clone(&next);
            applied = Some(next);
        });
        applied.unwrap_or_else(|| self.snapshot())
    }
}

/// Scoped ownership of a polling task.
///
/// The task never outlives the handle: [`stop`](PollHandle::stop) cancels it
/// and waits until it is gone, and dropping the handle cancels it too.
#[derive(Debug)]
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
    period: Duration,
}

impl PollHandle {
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the poller, including a refresh it may have in flight. Once
    /// this returns the poller can no longer touch the snapshot.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            info!("contract polling stopped");
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
