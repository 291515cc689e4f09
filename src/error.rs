use thiserror::Error as ThisError;

/// Failures with a meaning of their own for the data-access layer.
///
/// They travel inside [`plinth_core::Error`], use `downcast_ref::<plinth::Error>()` to
/// branch on them.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Cannot insert an empty list of rows")]
    EmptyInsert,
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),
    #[error("{}{}", .code.as_deref().map(|c| format!("[{c}] ")).unwrap_or_default(), .message)]
    SqlExecution {
        code: Option<String>,
        message: String,
    },
    #[error("Table `{0}` does not exist")]
    TableNotFound(String),
}

impl Error {
    /// Package any error coming out of a driver, keeping the backend code when present.
    pub fn sql_execution(error: &plinth_core::Error) -> Self {
        let code = error
            .chain()
            .find_map(|e| e.downcast_ref::<plinth_core::DriverError>())
            .and_then(|e| e.code.clone());
        Error::SqlExecution {
            code,
            message: format!("{:#}", error),
        }
    }
}
