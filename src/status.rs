use plinth_core::Result;

/// Outcome of a record persistence call.
///
/// Persistence never propagates failures, the formatted error ends up in `error`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Status {
    pub status: bool,
    pub error: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            status: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: false,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status
    }
}

impl<T> From<Result<T>> for Status {
    fn from(value: Result<T>) -> Self {
        match value {
            Ok(..) => Status::ok(),
            Err(e) => Status::failed(format!("{:#}", e)),
        }
    }
}
