use thiserror::Error;

/// Construction-time configuration failures.
///
/// These surface synchronously from [`FormParserBuilder::build`], before any
/// request is processed.
///
/// [`FormParserBuilder::build`]: crate::FormParserBuilder::build
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid size limit {value:?}: {reason}")]
    InvalidLimit { value: String, reason: String },
}

impl ConfigError {
    pub fn invalid_limit<V: ToString, R: ToString>(value: V, reason: R) -> Self {
        Self::InvalidLimit { value: value.to_string(), reason: reason.to_string() }
    }
}

/// Per-request failures.
///
/// Every failure of a single request resolves through the `Result` returned
/// by [`FormParser::process`]; nothing is thrown past that boundary once
/// stream consumption has begun.
///
/// [`FormParser::process`]: crate::FormParser::process
#[derive(Error, Debug)]
pub enum MultipartError {
    /// The content type declares multipart but carries no usable boundary.
    /// Returned before any stream consumption.
    #[error("invalid content type: {reason}")]
    InvalidContentType { reason: String },

    /// Mid-stream protocol violation reported by the decoder. Fields and
    /// files aggregated before the error remain attached to the context.
    #[error("multipart decode error: {source}")]
    Decode {
        #[from]
        source: multer::Error,
    },

    /// The fallback parser could not read or decode a non-multipart body.
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },
}

impl MultipartError {
    pub fn invalid_content_type<S: ToString>(str: S) -> Self {
        Self::InvalidContentType { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }
}
