use thiserror::Error;

pub type SheetResult<T> = Result<T, SheetError>;

/// Boxed error returned by import consumers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Row {row}: {message}")]
    Validation { row: u32, message: String },

    #[error("{message}")]
    Import {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Export error: {0}")]
    Export(String),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SheetError {
    /// Wrap a failure raised by an import consumer.
    pub fn import(source: BoxError) -> Self {
        SheetError::Import {
            message: source.to_string(),
            source,
        }
    }

    /// HTTP-equivalent status code: 422 for row validation, 400 for a
    /// malformed upload, 500 for everything else.
    pub fn status(&self) -> u16 {
        match self {
            SheetError::Validation { .. } => 422,
            SheetError::Upload(_) => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_status_and_message() {
        let err = SheetError::Validation {
            row: 3,
            message: "The id field is required.".to_string(),
        };
        assert_eq!(err.status(), 422);
        assert_eq!(err.to_string(), "Row 3: The id field is required.");
    }

    #[test]
    fn test_import_wraps_cause() {
        let cause: BoxError = "duplicate key".into();
        let err = SheetError::import(cause);
        assert_eq!(err.status(), 500);
        assert_eq!(err.to_string(), "duplicate key");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_upload_is_client_error() {
        let err = SheetError::Upload("missing boundary".to_string());
        assert_eq!(err.status(), 400);
        assert_eq!(err.to_string(), "Upload error: missing boundary");
    }

    #[test]
    fn test_io_from() {
        let err: SheetError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, SheetError::Io(_)));
        assert_eq!(err.status(), 500);
    }
}
