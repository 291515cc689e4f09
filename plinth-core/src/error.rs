use thiserror::Error;

/// Failure reported by the database backend itself, as opposed to a misuse of the API.
///
/// Drivers wrap it into the crate [`Error`](crate::Error) so that callers can recover the
/// backend code with `downcast_ref::<DriverError>()`.
#[derive(Debug, Clone, Error)]
#[error("{}{}", .code.as_deref().map(|c| format!("[{c}] ")).unwrap_or_default(), .message)]
pub struct DriverError {
    /// SQLSTATE or backend specific result code.
    pub code: Option<String>,
    pub message: String,
}

impl DriverError {
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
