//! Sync layer: contract service client, snapshot synchronizer, status lookup.

pub mod config;
pub mod error;
pub mod lookup;
pub mod service;
pub mod synchronizer;
pub mod upload;

#[cfg(feature = "http")]
pub mod http;

#[cfg(test)]
mod testing;

pub use config::ClientConfig;
pub use error::{ErrorKind, ServiceError};
pub use lookup::{Lookup, LookupError, StatusReport};
pub use service::ContractService;
pub use synchronizer::{PollHandle, Snapshot, Synchronizer};
pub use upload::{UploadFile, outcome_message};

#[cfg(feature = "http")]
pub use http::ContractClient;
