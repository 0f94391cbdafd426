//! Error types for conference session orchestration

/// Result type alias using roomlink Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while orchestrating a conference session
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Signalling runtime could not be acquired; the context is unusable
    #[error("Signalling context failed: {0}")]
    ContextFailed(String),

    /// Connection handshake or resource acquisition failed; no partial
    /// connection is retained
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Conference join failed; no callback registration or media session
    /// is retained
    #[error("Join failed: {0}")]
    JoinFailed(String),

    /// An asynchronous negotiation step failed; the negotiation task is
    /// aborted and the delegate is notified
    #[error("Negotiation error: {0}")]
    Negotiation(String),

    /// Signalling engine operation error
    #[error("Signalling error: {0}")]
    Signalling(String),

    /// Media session operation error
    #[error("Media error: {0}")]
    Media(String),

    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The session has terminated and the handle is no longer valid
    #[error("Session terminated")]
    Terminated,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is a resource-acquisition failure (context,
    /// connection, or join construction failed all-or-nothing)
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(
            self,
            Error::ContextFailed(_) | Error::ConnectionFailed(_) | Error::JoinFailed(_)
        )
    }

    /// Check if this error aborted a negotiation task
    pub fn is_negotiation(&self) -> bool {
        matches!(self, Error::Negotiation(_))
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidConfig("test".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: test");

        let err = Error::JoinFailed("room full".to_string());
        assert_eq!(err.to_string(), "Join failed: room full");
    }

    #[test]
    fn test_error_is_acquisition_failure() {
        assert!(Error::ConnectionFailed("test".to_string()).is_acquisition_failure());
        assert!(Error::JoinFailed("test".to_string()).is_acquisition_failure());
        assert!(!Error::Negotiation("test".to_string()).is_acquisition_failure());
    }

    #[test]
    fn test_error_is_negotiation() {
        assert!(Error::Negotiation("bad sdp".to_string()).is_negotiation());
        assert!(!Error::Terminated.is_negotiation());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }
}
