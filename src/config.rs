//! Parser configuration and its builder.
//!
//! Configuration is resolved once when the parser is built and is immutable
//! afterwards, so a single [`FormParser`] can be shared freely across
//! concurrent requests.
//!
//! [`FormParser`]: crate::FormParser

use crate::error::ConfigError;
use crate::parser::FormParser;
use tracing::warn;
use ubyte::ByteUnit;

/// Files larger than this are never buffered, whatever the configured
/// limit says. Buffering is in-memory; anything bigger wants a streaming
/// solution instead of this parser.
pub const HARD_LIMIT: u64 = 250 * 1024 * 1024;

/// A per-file size limit, given either as a byte count or as a human
/// readable quantity such as `"3mb"`.
///
/// String forms are parsed when the parser is built; an unparsable string
/// is a [`ConfigError::InvalidLimit`].
#[derive(Debug, Clone)]
pub enum Limit {
    Bytes(u64),
    Text(String),
}

impl From<u64> for Limit {
    fn from(bytes: u64) -> Self {
        Limit::Bytes(bytes)
    }
}

impl From<&str> for Limit {
    fn from(text: &str) -> Self {
        Limit::Text(text.to_string())
    }
}

impl From<String> for Limit {
    fn from(text: String) -> Self {
        Limit::Text(text)
    }
}

/// Builder for [`FormParser`].
///
/// Unset options take their documented defaults: `limit` defaults to
/// [`HARD_LIMIT`], `multi` and `fallback` default to off.
///
/// # Example
/// ```
/// # use multipart_body::FormParser;
/// let parser = FormParser::builder()
///     .limit("3mb")
///     .multi(true)
///     .build()
///     .unwrap();
/// ```
///
/// [`FormParser`]: crate::FormParser
#[derive(Debug, Clone, Default)]
pub struct FormParserBuilder {
    limit: Option<Limit>,
    multi: bool,
    fallback: bool,
}

impl FormParserBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of bytes buffered per file. Content beyond
    /// the limit marks the file truncated and is discarded.
    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// When enabled, repeated file field names accumulate into an ordered
    /// sequence instead of overwriting each other.
    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    /// When enabled, non-multipart requests are handed to the fallback body
    /// parser instead of passing through untouched.
    pub fn fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Resolves the configuration into an immutable [`FormParser`].
    ///
    /// A malformed limit string fails here, before any request is
    /// processed. A limit above [`HARD_LIMIT`] is clamped down with a
    /// warning rather than rejected.
    ///
    /// [`FormParser`]: crate::FormParser
    pub fn build(self) -> Result<FormParser, ConfigError> {
        let limit = resolve_limit(self.limit)?;
        Ok(FormParser::from_parts(limit, self.multi, self.fallback))
    }
}

fn resolve_limit(limit: Option<Limit>) -> Result<u64, ConfigError> {
    let bytes = match limit {
        None => HARD_LIMIT,
        Some(Limit::Bytes(bytes)) => bytes,
        Some(Limit::Text(text)) => {
            text.parse::<ByteUnit>().map_err(|e| ConfigError::invalid_limit(&text, e))?.as_u64()
        }
    };

    if bytes > HARD_LIMIT {
        warn!(
            requested = bytes,
            max = HARD_LIMIT,
            "file size limit set too high, clamping to {}; larger files need a streaming solution",
            ByteUnit::from(HARD_LIMIT)
        );
        Ok(HARD_LIMIT)
    } else {
        Ok(bytes)
    }
}
