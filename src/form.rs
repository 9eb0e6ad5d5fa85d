//! Aggregation output containers attached to a request.
//!
//! This module contains the in-memory views produced by the parser:
//! - `FormFile`: one fully buffered upload with its metadata
//! - `FileMap`: field name to ordered uploads mapping
//! - `FormContext`: the per-request carrier holding `body` and `files`

use bytes::Bytes;
use std::collections::HashMap;

/// Plain form fields by name, last write wins for duplicate names.
pub type FieldMap = HashMap<String, String>;

/// One uploaded file, fully buffered.
///
/// Either the content was buffered completely and both [`data`] and
/// [`size`] are present, or the upload exceeded the configured size limit
/// and both are absent with [`is_truncated`] set. The two constructors are
/// the only ways to build an entry, so no third state exists.
///
/// [`data`]: FormFile::data
/// [`size`]: FormFile::size
/// [`is_truncated`]: FormFile::is_truncated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    data: Option<Bytes>,
    name: Option<String>,
    encoding: String,
    mimetype: String,
    truncated: bool,
}

impl FormFile {
    /// Creates an entry for a completely buffered upload.
    pub fn buffered(
        data: impl Into<Bytes>,
        name: Option<String>,
        encoding: impl Into<String>,
        mimetype: impl Into<String>,
    ) -> Self {
        Self {
            data: Some(data.into()),
            name,
            encoding: encoding.into(),
            mimetype: mimetype.into(),
            truncated: false,
        }
    }

    /// Creates an entry for an upload the decoder stopped reading early
    /// because it exceeded the size limit. Content and size are discarded.
    pub fn truncated(name: Option<String>, encoding: impl Into<String>, mimetype: impl Into<String>) -> Self {
        Self { data: None, name, encoding: encoding.into(), mimetype: mimetype.into(), truncated: true }
    }

    /// The buffered content, absent when the upload was truncated.
    pub fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    /// The client-supplied filename, if any was sent.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The transfer encoding reported by the decoder.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// The content type reported by the decoder.
    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// True when content exceeded the size limit and was discarded.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Byte length of the buffered content, absent when truncated.
    pub fn size(&self) -> Option<usize> {
        self.data.as_ref().map(Bytes::len)
    }
}

/// Uploaded files by field name, in arrival order.
///
/// A name appears as a key only if at least one usable file part arrived
/// under it. Whether repeated names accumulate or overwrite is decided by
/// the parser configuration, not stored here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMap {
    entries: HashMap<String, Vec<FormFile>>,
}

impl FileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recently received file under `name`.
    pub fn get(&self, name: &str) -> Option<&FormFile> {
        self.entries.get(name).and_then(|files| files.last())
    }

    /// Returns every file received under `name`, preserving arrival order.
    pub fn get_all(&self, name: &str) -> Option<&[FormFile]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of distinct field names holding files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FormFile])> {
        self.entries.iter().map(|(name, files)| (name.as_str(), files.as_slice()))
    }

    /// Appends under `name`, creating the sequence on first arrival.
    pub(crate) fn push(&mut self, name: String, file: FormFile) {
        self.entries.entry(name).or_default().push(file);
    }

    /// Replaces whatever was previously stored under `name`.
    pub(crate) fn replace(&mut self, name: String, file: FormFile) {
        self.entries.insert(name, vec![file]);
    }
}

/// The per-request carrier the parser aggregates into.
///
/// Both maps start absent. The parser initializes them to empty maps only
/// when it actually begins multipart aggregation; a context pre-populated by
/// an earlier processing step is merged into, never replaced. After the
/// parser returns, the context is handed off to the downstream handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormContext {
    pub body: Option<FieldMap>,
    pub files: Option<FileMap>,
}

impl FormContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn body_mut(&mut self) -> &mut FieldMap {
        self.body.get_or_insert_with(FieldMap::new)
    }

    pub(crate) fn files_mut(&mut self) -> &mut FileMap {
        self.files.get_or_insert_with(FileMap::new)
    }
}
