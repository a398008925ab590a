//! Common error type for the transfer pipelines

use esferry_client::ClientError;

/// Error that aborts a transfer run.
///
/// Per-document conditions (a skipped payload on export, a retryable write
/// failure on import) are handled inside the pipelines and never surface
/// here.
#[derive(Debug)]
pub enum TransferError {
    /// Remote read/write failure
    Client(ClientError),
    /// Local file failure
    Io(std::io::Error),
    /// Run cut short by a shutdown request
    Interrupted,
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "IO: {e}"),
            Self::Interrupted => write!(f, "interrupted by shutdown request"),
        }
    }
}

impl std::error::Error for TransferError {}

impl From<ClientError> for TransferError {
    fn from(e: ClientError) -> Self {
        Self::Client(e)
    }
}

impl From<std::io::Error> for TransferError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
