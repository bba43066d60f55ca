use thiserror::Error;

/// Failure of a single backend call. The backend reports errors as opaque
/// human-readable text; `Status` keeps that body verbatim so the UI layer can
/// surface it unchanged.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// The text an operator should see for this failure.
    pub fn surface_message(&self) -> String {
        self.to_string()
    }
}
