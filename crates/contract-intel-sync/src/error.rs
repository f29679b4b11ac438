use thiserror::Error;

/// Broad classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any request was made.
    Validation,
    NotFound,
    /// The service answered, but not with a usable 2xx body.
    Http,
    /// No response was received.
    Network,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("contract not found{}", detail_suffix(.detail))]
    NotFound { detail: Option<String> },

    #[error("server returned {status}{}", detail_suffix(.detail))]
    Http {
        status: u16,
        /// `detail` from the JSON error body, when the service sent one.
        detail: Option<String>,
        /// Reason phrase of the status line.
        reason: String,
    },

    #[cfg(feature = "http")]
    #[error("malformed response body (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The transport gave up before a response arrived.
    #[error("request failed: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(Box::new(err))
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Http { .. } => ErrorKind::Http,
            #[cfg(feature = "http")]
            Self::Decode { .. } => ErrorKind::Http,
            Self::Network(_) => ErrorKind::Network,
        }
    }

    /// Error detail supplied by the service itself, if any.
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            Self::NotFound { detail } | Self::Http { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}
