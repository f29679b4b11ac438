//! Terminal rendering for the list, search and detail views.

use std::io::{self, Write};

use contract_intel_core::DetailView;
use contract_intel_sync::{ErrorKind, ServiceError, Snapshot, StatusReport};

const ID_WIDTH: usize = 38;
const STATUS_WIDTH: usize = 12;
const FILE_WIDTH: usize = 28;

pub const EMPTY_LIST_MESSAGE: &str = "No contracts uploaded yet.";

// ── List view ──

/// Print the snapshot as a table, one row per contract in service order.
///
/// Completed contracts also get their download link.
pub fn write_contract_table(
    w: &mut dyn Write,
    snapshot: &Snapshot,
    download_url: &dyn Fn(&str) -> String,
) -> io::Result<()> {
    match snapshot.refreshed_at() {
        Some(at) => writeln!(
            w,
            "=== Contracts ({}) refreshed {} ===",
            snapshot.len(),
            at.format("%Y-%m-%d %H:%M:%S UTC")
        )?,
        None => writeln!(w, "=== Contracts ===")?,
    }

    if snapshot.is_empty() {
        writeln!(w, "{EMPTY_LIST_MESSAGE}")?;
        return Ok(());
    }

    writeln!(
        w,
        "  {:<ID_WIDTH$} {:<STATUS_WIDTH$} {:<FILE_WIDTH$} ACTIONS",
        "CONTRACT ID", "STATUS", "FILE"
    )?;
    for contract in snapshot.iter() {
        let file = contract.filename.as_deref().unwrap_or("-");
        write!(
            w,
            "  {:<ID_WIDTH$} {:<STATUS_WIDTH$} {:<FILE_WIDTH$}",
            contract.id,
            contract.status.as_str(),
            truncate(file, FILE_WIDTH)
        )?;
        write!(w, " show")?;
        if contract.status.is_completed() {
            write!(w, "  download: {}", download_url(&contract.id))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = s.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

// ── Search view ──

pub fn write_status_report(w: &mut dyn Write, report: &StatusReport) -> io::Result<()> {
    writeln!(w, "  {:<14} {}", "Contract ID:", report.id)?;
    writeln!(w, "  {:<14} {}", "Status:", report.status)?;
    writeln!(w, "  View details: contract-intel show {}", report.id)
}

// ── Detail view ──

pub fn write_detail(
    w: &mut dyn Write,
    view: &DetailView,
    download_url: Option<&str>,
) -> io::Result<()> {
    write!(w, "{view}")?;
    if let (DetailView::Completed(_), Some(url)) = (view, download_url) {
        writeln!(w)?;
        writeln!(w, "Download Original Contract: {url}")?;
    }
    Ok(())
}

/// Message shown when the detail fetch itself fails.
pub fn detail_error_message(err: &ServiceError) -> String {
    match (err.kind(), err) {
        (ErrorKind::NotFound, _) => format!(
            "Failed to fetch contract details: {}",
            err.server_detail().unwrap_or("Not Found")
        ),
        (_, ServiceError::Http { reason, detail, .. }) => format!(
            "Failed to fetch contract details: {}",
            detail.as_deref().unwrap_or(reason.as_str())
        ),
        _ => format!("Error fetching contract details: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_intel_core::{Contract, ContractStatus, present};
    use contract_intel_sync::{ContractService, Synchronizer};
    use std::sync::Arc;

    struct FixedListing(Vec<Contract>);

    #[async_trait::async_trait]
    impl ContractService for FixedListing {
        async fn list_contracts(&self) -> Result<Vec<Contract>, ServiceError> {
            Ok(self.0.clone())
        }
        async fn get_contract(&self, _id: &str) -> Result<Contract, ServiceError> {
            Err(ServiceError::NotFound { detail: None })
        }
        async fn get_status(&self, _id: &str) -> Result<ContractStatus, ServiceError> {
            Err(ServiceError::NotFound { detail: None })
        }
        async fn upload_contract(
            &self,
            _file_name: &str,
            _bytes: Vec<u8>,
        ) -> Result<contract_intel_core::UploadReceipt, ServiceError> {
            Err(ServiceError::Validation("read-only".into()))
        }
    }

    async fn snapshot_of(contracts: Vec<Contract>) -> Arc<Snapshot> {
        let sync = Synchronizer::new(Arc::new(FixedListing(contracts)));
        sync.refresh().await.unwrap()
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn link(id: &str) -> String {
        format!("http://localhost:8000/contracts/{id}/download")
    }

    #[tokio::test]
    async fn empty_list_says_so() {
        let snapshot = snapshot_of(vec![]).await;
        let text = render(|w| write_contract_table(w, &snapshot, &link));
        assert!(text.contains(EMPTY_LIST_MESSAGE));
        assert!(!text.contains("CONTRACT ID"));
    }

    #[tokio::test]
    async fn only_completed_rows_get_download_link() {
        let mut done = Contract::new("c-1", ContractStatus::Completed);
        done.filename = Some("lease.pdf".into());
        let waiting = Contract::new("c-2", ContractStatus::Pending);
        let snapshot = snapshot_of(vec![done, waiting]).await;

        let text = render(|w| write_contract_table(w, &snapshot, &link));
        let rows: Vec<&str> = text.lines().filter(|l| l.contains("c-")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("lease.pdf"));
        assert!(rows[0].contains("download: http://localhost:8000/contracts/c-1/download"));
        assert!(rows[1].contains("pending"));
        assert!(!rows[1].contains("download"));
        assert!(text.starts_with("=== Contracts (2) refreshed "));
    }

    #[test]
    fn long_file_names_are_truncated() {
        let name = "a".repeat(40);
        let short = truncate(&name, FILE_WIDTH);
        assert_eq!(short.chars().count(), FILE_WIDTH);
        assert!(short.ends_with("..."));
        assert_eq!(truncate("nda.pdf", FILE_WIDTH), "nda.pdf");
    }

    #[test]
    fn status_report_points_to_detail_view() {
        let report = StatusReport {
            id: "c-9".into(),
            status: ContractStatus::Processing,
        };
        let text = render(|w| write_status_report(w, &report));
        assert!(text.contains("c-9"));
        assert!(text.contains("processing"));
        assert!(text.contains("contract-intel show c-9"));
    }

    #[test]
    fn detail_link_only_for_completed() {
        let mut contract = Contract::new("c-1", ContractStatus::Completed);
        contract.extracted_data = Some(serde_json::Map::new());
        let url = link("c-1");

        let text = render(|w| write_detail(w, &present(&contract), Some(url.as_str())));
        assert!(text.contains("Download Original Contract: http://localhost:8000/contracts/c-1/download"));

        let pending = Contract::new("c-2", ContractStatus::Pending);
        let text = render(|w| write_detail(w, &present(&pending), Some(url.as_str())));
        assert!(!text.contains("Download"));
    }

    #[test]
    fn detail_errors() {
        let not_found = ServiceError::NotFound {
            detail: Some("Contract not found".into()),
        };
        assert_eq!(
            detail_error_message(&not_found),
            "Failed to fetch contract details: Contract not found"
        );

        let server = ServiceError::Http {
            status: 500,
            detail: None,
            reason: "Internal Server Error".into(),
        };
        assert_eq!(
            detail_error_message(&server),
            "Failed to fetch contract details: Internal Server Error"
        );
    }
}
