//! The form parser: drives a streaming multipart decoder over one request
//! body and aggregates what it emits into the request's [`FormContext`].
//!
//! The actual multipart decoding (boundary tracking, part header parsing)
//! is delegated to [`multer`]; this module owns everything around it:
//! content classification, per-file buffering against the size limit,
//! aggregation policy, and the single success-or-error outcome per request.
//!
//! # Example
//! ```no_run
//! # use http::HeaderMap;
//! # use multipart_body::{FormContext, FormParser};
//! # async fn handle(headers: HeaderMap, body: http_body_util::Full<bytes::Bytes>) {
//! let parser = FormParser::builder().limit("3mb").build().unwrap();
//!
//! let mut ctx = FormContext::new();
//! let request = http::Request::builder().body(body).unwrap();
//! match parser.parse_request(request, &mut ctx).await {
//!     Ok(()) => { /* ctx.body / ctx.files are ready for the handler */ }
//!     Err(_e) => { /* respond with a client error */ }
//! }
//! # }
//! ```

use crate::config::FormParserBuilder;
use crate::error::MultipartError;
use crate::fallback;
use crate::form::{FormContext, FormFile};
use bytes::{Bytes, BytesMut};
use futures::Stream;
use http::{HeaderMap, Request, header};
use http_body::Body;
use http_body_util::BodyDataStream;
use mime::Mime;
use multer::{Field, Multipart};
use std::error::Error;
use tracing::{debug, trace};

/// Parses `multipart/form-data` request bodies into a [`FormContext`].
///
/// Built once via [`FormParser::builder`], then shared across concurrent
/// requests; it holds only resolved, read-only configuration.
#[derive(Debug, Clone)]
pub struct FormParser {
    limit: u64,
    multi: bool,
    fallback: bool,
}

/// One file's content pulled off the wire. `received` counts every byte
/// the decoder emitted, including bytes discarded after truncation.
struct BufferedFile {
    data: Bytes,
    received: u64,
    truncated: bool,
}

impl FormParser {
    pub fn builder() -> FormParserBuilder {
        FormParserBuilder::new()
    }

    pub(crate) fn from_parts(limit: u64, multi: bool, fallback: bool) -> Self {
        Self { limit, multi, fallback }
    }

    /// The effective per-file size limit in bytes, after clamping.
    pub fn size_limit(&self) -> u64 {
        self.limit
    }

    /// Whether repeated file field names accumulate into a sequence.
    pub fn is_multi(&self) -> bool {
        self.multi
    }

    /// Whether non-multipart bodies are handed to the fallback parser.
    pub fn has_fallback(&self) -> bool {
        self.fallback
    }

    /// Convenience over [`process`] for an [`http::Request`] whose body
    /// yields [`Bytes`] frames.
    ///
    /// [`process`]: FormParser::process
    pub async fn parse_request<B>(&self, request: Request<B>, ctx: &mut FormContext) -> Result<(), MultipartError>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        let (parts, body) = request.into_parts();
        self.process(&parts.headers, BodyDataStream::new(body), ctx).await
    }

    /// Consumes one request body and aggregates it into `ctx`.
    ///
    /// - `multipart/form-data`: fields land in `ctx.body` (last write
    ///   wins), files are buffered into `ctx.files`. Both maps are
    ///   initialized only here, and only if absent, so values placed by an
    ///   earlier processing step are merged into.
    /// - anything else: handed to the fallback parser when enabled,
    ///   otherwise a no-op pass-through that leaves `ctx` untouched.
    ///
    /// The returned `Result` is the request's single completion signal: a
    /// multipart content type without a boundary fails before the stream is
    /// touched, and a decode error mid-stream fails while keeping whatever
    /// was aggregated before it.
    pub async fn process<S, D, E>(&self, headers: &HeaderMap, stream: S, ctx: &mut FormContext) -> Result<(), MultipartError>
    where
        S: Stream<Item = Result<D, E>> + Send + 'static,
        D: Into<Bytes> + 'static,
        E: Into<Box<dyn Error + Send + Sync>> + 'static,
    {
        let Some(mime) = content_type(headers) else {
            return Ok(());
        };

        if mime.type_() == mime::MULTIPART && mime.subtype() == mime::FORM_DATA {
            let boundary = mime
                .get_param(mime::BOUNDARY)
                .ok_or_else(|| MultipartError::invalid_content_type("multipart form without boundary"))?;
            let multipart = Multipart::new(stream, boundary.as_str());

            ctx.body_mut();
            ctx.files_mut();
            self.aggregate(multipart, ctx).await
        } else if self.fallback {
            fallback::parse(&mime, stream, ctx).await
        } else {
            Ok(())
        }
    }

    async fn aggregate(&self, mut multipart: Multipart<'static>, ctx: &mut FormContext) -> Result<(), MultipartError> {
        loop {
            match multipart.next_field().await {
                Err(e) => {
                    debug!(error = %e, "error parsing form");
                    return Err(e.into());
                }
                Ok(None) => {
                    trace!("finished form parsing");
                    return Ok(());
                }
                Ok(Some(field)) => self.handle_part(field, ctx).await?,
            }
        }
    }

    async fn handle_part(&self, field: Field<'static>, ctx: &mut FormContext) -> Result<(), MultipartError> {
        let name = field.name().unwrap_or_default().to_string();

        // A part carrying a filename or its own content type is a file;
        // a bare part is a plain field.
        if field.file_name().is_none() && field.content_type().is_none() {
            let value = field.text().await?;
            trace!(field = %name, value = %value, "received field");
            ctx.body_mut().insert(name, value);
            return Ok(());
        }

        let filename = field.file_name().filter(|n| !n.is_empty()).map(str::to_string);
        let encoding = field
            .headers()
            .get("content-transfer-encoding")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("7bit")
            .to_string();
        let mimetype =
            field.content_type().map(Mime::to_string).unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

        match self.buffer_file(field).await {
            Err(e) => {
                // Unusable content fails the file, not the request; the
                // decoder reports stream-level errors on the next part.
                debug!(field = %name, error = %e, "dropping file after buffering failure");
                Ok(())
            }
            Ok(buffered) if buffered.received == 0 && filename.is_none() => {
                trace!(field = %name, "dropping empty unnamed file part");
                Ok(())
            }
            Ok(buffered) => {
                let file = if buffered.truncated {
                    FormFile::truncated(filename, encoding, mimetype)
                } else {
                    FormFile::buffered(buffered.data, filename, encoding, mimetype)
                };
                debug!(field = %name, size = ?file.size(), truncated = file.is_truncated(), "received file");

                let files = ctx.files_mut();
                if self.multi {
                    files.push(name, file);
                } else {
                    files.replace(name, file);
                }
                Ok(())
            }
        }
    }

    /// Buffers one file's chunks. Once the running total passes the size
    /// limit, already-buffered bytes are released and the remainder of the
    /// part is drained without buffering, so the decoder can reach the
    /// parts behind it.
    async fn buffer_file(&self, mut field: Field<'static>) -> Result<BufferedFile, multer::Error> {
        let mut buf = BytesMut::new();
        let mut received = 0u64;
        let mut truncated = false;

        while let Some(chunk) = field.chunk().await? {
            received += chunk.len() as u64;
            if truncated {
                continue;
            }
            if received > self.limit {
                truncated = true;
                buf = BytesMut::new();
                continue;
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(BufferedFile { data: buf.freeze(), received, truncated })
    }
}

fn content_type(headers: &HeaderMap) -> Option<Mime> {
    headers.get(header::CONTENT_TYPE)?.to_str().ok()?.parse().ok()
}
