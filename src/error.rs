//! Error types for corpus loading, persistence, and interchange.

extern crate alloc;

use alloc::string::String;
use core::fmt;

/// Top-level error for `verse-stream` operations.
///
/// Every failure in this system is recoverable at the operation boundary:
/// load errors surface as an inline error state, storage errors leave the
/// in-memory state applied, import errors reject the payload without
/// touching existing highlights.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerseError {
    /// Corpus resource could not be read.
    Io(String),
    /// Corpus text violated a hard parser limit.
    Corpus(String),
    /// Persisted state could not be written or read.
    Storage(StorageError),
    /// Highlight payload failed structural validation.
    Import(ImportError),
}

impl fmt::Display for VerseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::Corpus(msg) => write!(f, "Corpus error: {}", msg),
            Self::Storage(err) => write!(f, "Storage error: {}", err),
            Self::Import(err) => write!(f, "Import error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for VerseError {}

impl From<StorageError> for VerseError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<ImportError> for VerseError {
    fn from(err: ImportError) -> Self {
        Self::Import(err)
    }
}

/// Why a persisted write or read failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// The backing store refused the value for size reasons.
    QuotaExceeded,
    /// Underlying I/O failure.
    Io,
    /// State could not be serialized or deserialized.
    Serialize,
}

impl StorageErrorKind {
    /// Stable machine-readable tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QuotaExceeded => "quota_exceeded",
            Self::Io => "io",
            Self::Serialize => "serialize",
        }
    }
}

/// Structured persistence failure with the key it occurred on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageError {
    /// Store key the operation targeted.
    pub key: String,
    /// Failure class.
    pub kind: StorageErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl StorageError {
    /// Build a storage error for a key.
    pub fn new(key: impl Into<String>, kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            message: message.into(),
        }
    }

    /// Whether the failure is a quota refusal (state is kept in memory).
    pub fn is_quota(&self) -> bool {
        matches!(self.kind, StorageErrorKind::QuotaExceeded)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [key={}]",
            self.kind.as_str(),
            self.message,
            self.key
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StorageError {}

/// Why an imported highlight payload was rejected.
///
/// Rejection is all-or-nothing: a payload that fails structural validation
/// never partially mutates the existing highlight state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportError {
    /// Payload was not valid JSON or had the wrong shape.
    Malformed(String),
    /// Payload version is not one this build understands.
    UnsupportedVersion(String),
    /// A reference string exceeded the allowed length.
    ReferenceTooLong { actual: usize, limit: usize },
    /// A phrase span had a non-increasing or out-of-range offset pair.
    InvalidSpan { start: usize, end: usize },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed payload: {}", msg),
            Self::UnsupportedVersion(v) => write!(f, "unsupported payload version: {}", v),
            Self::ReferenceTooLong { actual, limit } => {
                write!(f, "reference exceeds length limit ({} > {})", actual, limit)
            }
            Self::InvalidSpan { start, end } => {
                write!(f, "invalid phrase span ({}..{})", start, end)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ImportError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn storage_error_display_includes_key_and_kind() {
        let err = StorageError::new("vs.highlights", StorageErrorKind::QuotaExceeded, "value too large");
        let rendered = err.to_string();
        assert!(rendered.contains("quota_exceeded"));
        assert!(rendered.contains("key=vs.highlights"));
        assert!(err.is_quota());
    }

    #[test]
    fn import_error_display() {
        let err = ImportError::InvalidSpan { start: 5, end: 5 };
        assert_eq!(err.to_string(), "invalid phrase span (5..5)");
        let err = ImportError::UnsupportedVersion("9.9".to_string());
        assert!(err.to_string().contains("9.9"));
    }

    #[test]
    fn verse_error_from_storage() {
        let err: VerseError =
            StorageError::new("k", StorageErrorKind::Io, "disk gone").into();
        assert!(matches!(err, VerseError::Storage(_)));
    }
}
