//! Body parsing for non-multipart requests.
//!
//! Only reached when the parser was built with `fallback(true)`. Populates
//! the context's `body` from urlencoded or JSON payloads; `files` is never
//! touched here.

use crate::error::MultipartError;
use crate::form::FormContext;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use mime::Mime;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::pin::pin;
use tracing::trace;

pub(crate) async fn parse<S, D, E>(mime: &Mime, stream: S, ctx: &mut FormContext) -> Result<(), MultipartError>
where
    S: Stream<Item = Result<D, E>>,
    D: Into<Bytes>,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    if mime.type_() != mime::APPLICATION {
        return Ok(());
    }

    if mime.subtype() == mime::WWW_FORM_URLENCODED {
        let bytes = collect(stream).await?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes)
            .map_err(|e| MultipartError::invalid_body(format!("malformed urlencoded body: {e}")))?;
        trace!(pairs = pairs.len(), "parsed urlencoded body");
        ctx.body_mut().extend(pairs);
        Ok(())
    } else if mime.subtype() == mime::JSON {
        let bytes = collect(stream).await?;
        let object: HashMap<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|e| MultipartError::invalid_body(format!("malformed json body: {e}")))?;
        trace!(members = object.len(), "parsed json body");
        let body = ctx.body_mut();
        for (key, value) in object {
            let rendered = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            body.insert(key, rendered);
        }
        Ok(())
    } else {
        // Anything else passes through untouched.
        Ok(())
    }
}

async fn collect<S, D, E>(stream: S) -> Result<Bytes, MultipartError>
where
    S: Stream<Item = Result<D, E>>,
    D: Into<Bytes>,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    let mut stream = pin!(stream);
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk: Bytes = match chunk {
            Ok(chunk) => chunk.into(),
            Err(e) => {
                let reason: Box<dyn Error + Send + Sync> = e.into();
                return Err(MultipartError::invalid_body(format!("failed to read body: {reason}")));
            }
        };
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}
