use thiserror::Error;

/// Main error type for HOPEZIP
#[derive(Error, Debug)]
pub enum HopeError {
    #[error("OCR request failed: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR service still rate limiting after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("File I/O error: {path}")]
    FileIO {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Spreadsheet error: {message}")]
    Spreadsheet {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Archive error: {path}")]
    Archive {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("No valid images found in {folder}")]
    NoValidImages { folder: String },

    #[error("General error: {0}")]
    General(#[from] anyhow::Error),
}

impl HopeError {
    /// Create an OCR error with context
    pub fn ocr(message: impl Into<String>) -> Self {
        Self::Ocr {
            message: message.into(),
            source: None,
        }
    }

    /// Create an OCR error with source
    pub fn ocr_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Ocr {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a file I/O error
    pub fn file_io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileIO {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn spreadsheet(message: impl Into<String>) -> Self {
        Self::Spreadsheet {
            message: message.into(),
            source: None,
        }
    }

    pub fn spreadsheet_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Spreadsheet {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn archive(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Archive {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Check if error is recoverable (the batch can skip the item and continue)
    pub fn is_recoverable(&self) -> bool {
        match self {
            HopeError::Ocr { .. } => true,
            HopeError::RateLimited { .. } => true,
            HopeError::FileIO { .. } => true,
            HopeError::Configuration { .. } => false,
            HopeError::NoValidImages { .. } => false,
            HopeError::Spreadsheet { .. } => false,
            HopeError::Archive { .. } => false,
            HopeError::General(_) => true,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            HopeError::Ocr { .. } => {
                "📷 The OCR service could not read this image.".to_string()
            }
            HopeError::RateLimited { attempts } => {
                format!("⏳ OCR service kept rate limiting after {} attempts. Try fewer workers.", attempts)
            }
            HopeError::FileIO { path, .. } => {
                format!("📁 File access error at {}. Check permissions and disk space.", path)
            }
            HopeError::Configuration { message } => {
                format!("⚙️  Configuration problem: {}", message)
            }
            HopeError::NoValidImages { folder } => {
                format!("🖼️  No usable images in {}. Supported: jpg, jpeg, png, bmp, tif.", folder)
            }
            _ => "Something went wrong. Check the logs for details.".to_string(),
        }
    }
}

/// Result type alias for convenience
pub type HopeResult<T> = Result<T, HopeError>;

/// Error context for adding the offending path to I/O failures
pub trait ErrorContext<T> {
    fn with_path(self, path: &std::path::Path) -> HopeResult<T>;
}

impl<T> ErrorContext<T> for Result<T, std::io::Error> {
    fn with_path(self, path: &std::path::Path) -> HopeResult<T> {
        self.map_err(|e| HopeError::file_io(path.display().to_string(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(HopeError::ocr("bad response").is_recoverable());
        assert!(HopeError::RateLimited { attempts: 3 }.is_recoverable());
        assert!(!HopeError::configuration("missing key").is_recoverable());
        assert!(!HopeError::NoValidImages { folder: "x".into() }.is_recoverable());
    }

    #[test]
    fn test_with_path_context() {
        let err: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let wrapped = err.with_path(std::path::Path::new("/tmp/a.jpg")).unwrap_err();
        assert!(matches!(wrapped, HopeError::FileIO { ref path, .. } if path == "/tmp/a.jpg"));
    }
}
