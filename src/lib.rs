//! multipart/form-data body aggregation for async http services
//!
//! This crate sits between a server's request pipeline and its handlers:
//! it consumes a streamed `multipart/form-data` request body and produces
//! two synchronous-looking views for the handler, a map of plain fields and
//! a map of fully buffered file uploads with their metadata. The multipart
//! decoding itself is delegated to [`multer`]; this crate is the adapter
//! around it: content classification, per-file size limiting and buffering,
//! single/multi aggregation policy, and one success-or-error outcome per
//! request.
//!
//! # Features
//!
//! - Fields and files aggregated in stream order, last write wins
//! - Per-file size limit with truncation instead of rejection
//! - Human readable limits (`"3mb"`), clamped to a hard in-memory ceiling
//! - Optional accumulation of repeated file field names into sequences
//! - Optional fallback parsing of urlencoded and JSON bodies
//! - Merge-into-existing contract for contexts pre-populated upstream
//!
//! # Example
//!
//! ```
//! use multipart_body::{FormContext, FormParser};
//!
//! # fn main() -> Result<(), multipart_body::ConfigError> {
//! let parser = FormParser::builder()
//!     .limit("3mb")
//!     .multi(true)
//!     .build()?;
//!
//! // per request:
//! let mut ctx = FormContext::new();
//! // parser.process(&headers, body_stream, &mut ctx).await?;
//! // ctx.body / ctx.files are now ready for the handler
//! # ctx.body = None;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod fallback;
mod form;
mod parser;

pub use config::{FormParserBuilder, HARD_LIMIT, Limit};
pub use error::{ConfigError, MultipartError};
pub use form::{FieldMap, FileMap, FormContext, FormFile};
pub use parser::FormParser;
