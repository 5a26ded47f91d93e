//! Errors at the asset API boundary

use crate::types::FolderId;
use thiserror::Error;

/// Failure of a single asset API call
///
/// Every variant is scoped to one request; none of them imply the service is
/// permanently unusable.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS, connect/read timeout
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    /// HTTP success but the envelope reported an error
    #[error("{endpoint} rejected the request: {message}")]
    Rejected {
        endpoint: &'static str,
        message: String,
    },

    /// Body did not match the expected shape
    #[error("unexpected response from {endpoint}: {reason}")]
    Decode {
        endpoint: &'static str,
        reason: String,
    },

    /// Creation refused because a matching folder already exists
    #[error("folder '{name}' already exists (id {existing})")]
    DuplicateFolder { name: String, existing: FolderId },
}

impl ApiError {
    /// HTTP status when the server answered with one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Transport { source, .. } if source.is_timeout())
    }
}
