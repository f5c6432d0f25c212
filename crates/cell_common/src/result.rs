//! Common result and error types for the Cell toolchain.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an inconsistency in data handed over by a collaborator
/// (resolver or code generator), not a user-facing simulation failure.
pub type CellResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in a collaborator, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("duplicate element 'a'");
        assert_eq!(format!("{err}"), "internal error: duplicate element 'a'");
    }

    #[test]
    fn err_path() {
        let r: CellResult<i32> = Err(InternalError::new("test error"));
        let err = r.err().unwrap();
        assert_eq!(err.message, "test error");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }
}
