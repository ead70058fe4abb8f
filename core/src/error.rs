use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad classes of failure surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input: empty name, negative number, out-of-range count.
    Validation,
    /// A referenced food, slot, entry or saved view does not exist.
    NotFound,
    /// The underlying file or database could not be read or written.
    Storage,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode session state: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Database(_) | Error::Io(_) | Error::Json(_) | Error::Csv(_) | Error::Xlsx(_) => {
                ErrorKind::Storage
            }
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Error::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(Error::not_found("x").kind(), ErrorKind::NotFound);
        let io = Error::from(std::io::Error::other("disk full"));
        assert_eq!(io.kind(), ErrorKind::Storage);
        assert!(!io.is_not_found());
    }

    #[test]
    fn test_display_is_message_only_for_user_errors() {
        assert_eq!(
            Error::validation("Food name must not be empty").to_string(),
            "Food name must not be empty"
        );
    }
}
