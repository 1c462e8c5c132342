//! Error types for maclookup.
//!
//! "Not found" is never an error: absent manufacturers are `Ok(None)`.
//! Everything here is either an upstream failure, a persistence failure,
//! or a configuration / input problem.

use thiserror::Error;

/// Result type alias using `LookupError`.
pub type Result<T> = std::result::Result<T, LookupError>;

/// Main error type for all maclookup operations.
#[derive(Debug, Error)]
pub enum LookupError {
    // ═══════════════════════════════════════════════════════════════════════════
    // UPSTREAM ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// HTTP request failed at the socket, TLS or timeout layer.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Upstream answered with a non-success status code.
    #[error("Upstream returned status {status}: {body}")]
    UpstreamStatus {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Upstream response body could not be parsed.
    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // PERSISTENCE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Snapshot store rejected a read or write.
    #[error("Storage error for '{name}': {reason}")]
    Storage {
        /// Binding name of the snapshot
        name: String,
        /// What went wrong
        reason: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot was written by an unknown format version.
    #[error("Snapshot version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build writes
        expected: u32,
        /// Version found on disk
        actual: u32,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // INPUT & CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// MAC string too short to carry a prefix.
    #[error("Invalid MAC '{0}': need at least 8 characters")]
    InvalidMac(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LookupError {
    /// Returns true if this error came from talking to the upstream service.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LookupError::Http(_) | LookupError::UpstreamStatus { .. } | LookupError::Decode(_)
        )
    }

    /// Returns true if this error came from the durable snapshot.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            LookupError::Storage { .. }
                | LookupError::Io(_)
                | LookupError::Json(_)
                | LookupError::VersionMismatch { .. }
        )
    }

    /// Returns true if retrying the same call later may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            LookupError::Http(_) => true,
            LookupError::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LookupError::UpstreamStatus {
            status: 503,
            body: "busy".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn test_error_classification() {
        assert!(LookupError::Http("reset".into()).is_transport());
        assert!(LookupError::Decode("eof".into()).is_transport());
        assert!(!LookupError::InvalidMac("aa".into()).is_transport());

        assert!(LookupError::Storage { name: "x".into(), reason: "y".into() }.is_persistence());
        assert!(!LookupError::Http("reset".into()).is_persistence());
    }

    #[test]
    fn test_recoverable_statuses() {
        assert!(LookupError::Http("timeout".into()).is_recoverable());
        assert!(LookupError::UpstreamStatus { status: 429, body: String::new() }.is_recoverable());
        assert!(LookupError::UpstreamStatus { status: 502, body: String::new() }.is_recoverable());
        assert!(!LookupError::UpstreamStatus { status: 401, body: String::new() }.is_recoverable());
        assert!(!LookupError::Decode("bad".into()).is_recoverable());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let result: Result<serde_json::Value> = json_result.map_err(LookupError::from);
        assert!(matches!(result, Err(LookupError::Json(_))));
    }
}
