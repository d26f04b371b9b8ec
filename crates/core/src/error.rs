//! Error types for legacy presentation decoding.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding a legacy presentation.
///
/// Every variant produced by the record decoder carries the structural path
/// (for example `Slide > drawing > OfficeArtDg > groupShape`) at which
/// decoding stopped. There is no partial result: the first error aborts the
/// whole decode.
#[derive(Error, Debug)]
pub enum Error {
    /// A fixed header field did not match its mandated constant, or a
    /// structural invariant was violated.
    #[error("Format error at {path}: {message}")]
    Format { path: String, message: String },

    /// A record, blip or property that is valid in the file format but not
    /// supported by this decoder.
    #[error("Not implemented at {path}: {feature}")]
    NotImplemented { path: String, feature: String },

    /// A read would run past the end of the buffer or of the enclosing
    /// container.
    #[error("Decode error at {path}: need {needed} bytes at offset {offset}, {available} available")]
    Decode {
        path: String,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The caller's cancellation flag was raised mid-decode.
    #[error("Decoding cancelled")]
    Cancelled,

    /// A mandatory stream is missing from the container.
    #[error("Missing stream: {0}")]
    MissingStream(String),

    /// OLE/CFB container error.
    #[error("OLE/CFB error: {0}")]
    CfbError(String),

    /// Failed to read from the underlying file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::Format`] error.
    pub fn format(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build a [`Error::NotImplemented`] error.
    pub fn not_implemented(path: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::NotImplemented {
            path: path.into(),
            feature: feature.into(),
        }
    }

    /// True for format errors, including the "not implemented" subkind.
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::NotImplemented { .. })
    }

    /// True for bounds violations.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// The structural path recorded with the error, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Format { path, .. }
            | Self::NotImplemented { path, .. }
            | Self::Decode { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = Error::not_implemented("Document > exObjList", "ExternalOleEmbed");
        assert!(err.is_format());
        assert!(!err.is_decode());
        assert_eq!(err.path(), Some("Document > exObjList"));
        assert_eq!(
            err.to_string(),
            "Not implemented at Document > exObjList: ExternalOleEmbed"
        );

        let err = Error::Decode {
            path: "Slide".into(),
            offset: 10,
            needed: 4,
            available: 2,
        };
        assert!(err.is_decode());
        assert!(!err.is_format());
        assert!(Error::Cancelled.path().is_none());
    }
}
