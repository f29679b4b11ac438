//! Single-file submissions and the messages shown for them.

use std::io;
use std::path::{Path, PathBuf};

use contract_intel_core::UploadReceipt;
use tracing::warn;

use crate::error::{ErrorKind, ServiceError};

/// One file ready to be sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk, naming it after the last path component.
    pub async fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// Read the first of several selected files. The rest are ignored: the
    /// service takes one file per submission.
    pub async fn first_of(paths: &[PathBuf]) -> io::Result<Option<Self>> {
        let Some(first) = paths.first() else {
            return Ok(None);
        };
        if paths.len() > 1 {
            warn!(
                ignored = paths.len() - 1,
                "only the first selected file is uploaded"
            );
        }
        Self::from_path(first).await.map(Some)
    }
}

/// Message reported to the user after an upload attempt.
pub fn outcome_message(file_name: &str, result: &Result<UploadReceipt, ServiceError>) -> String {
    let err = match result {
        Ok(receipt) => {
            return format!(
                "File {file_name} uploaded successfully! Contract ID: {}",
                receipt.contract_id
            );
        }
        Err(err) => err,
    };

    if let Some(detail) = err.server_detail() {
        return format!("Failed to upload {file_name}: {detail}");
    }
    match (err.kind(), err) {
        (_, ServiceError::Http { reason, .. }) => {
            format!("Failed to upload {file_name}: {reason}")
        }
        (ErrorKind::Validation, _) => format!("Failed to upload {file_name}: {err}"),
        _ => format!("Error uploading {file_name}: {err}"),
    }
}
