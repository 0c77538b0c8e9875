//! `multipart/form-data` body construction.
//!
//! Each encode call draws a fresh boundary token, so concurrent requests never
//! share one and a part body can't collide with a boundary from another form.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::codec::Codecs;
use crate::error::{BoxError, EncodingError};

type BodyThunk = Arc<dyn Fn(&Codecs) -> Result<Bytes, BoxError> + Send + Sync>;

/// One field of a multipart form.
///
/// The body is produced lazily, when the request is encoded, and receives the
/// codecs in effect for that request.
#[derive(Clone)]
pub struct Part {
    content_type: Option<String>,
    disposition: Vec<String>,
    body: BodyThunk,
}

impl Part {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Codecs) -> Result<Bytes, BoxError> + Send + Sync + 'static,
    {
        Self {
            content_type: None,
            disposition: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// A JSON-encoded value, with `Content-Type: application/json`.
    pub fn json<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Part::new(move |codecs| Ok(Bytes::from(codecs.json_encoder.encode(&value)?)))
            .with_content_type("application/json")
    }

    pub fn text(text: impl Into<String>) -> Self {
        let text = Bytes::from(text.into());
        Part::new(move |_| Ok(text.clone())).with_content_type("text/plain; charset=utf-8")
    }

    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Part::new(move |_| Ok(bytes.clone()))
    }

    /// The contents of the file at `path`, read at encode time. Adds a
    /// `filename` disposition parameter; setting a content type is up to the
    /// caller.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let part = Part::new(move |_| Ok(Bytes::from(std::fs::read(&path)?)));
        match filename {
            Some(name) => part.with_disposition(format!("filename=\"{}\"", escape_quoted(&name))),
            None => part,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Append a parameter to this part's `Content-Disposition` header.
    pub fn with_disposition(mut self, parameter: impl Into<String>) -> Self {
        self.disposition.push(parameter.into());
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn disposition(&self) -> &[String] {
        &self.disposition
    }

    fn write_to(&self, name: &str, codecs: &Codecs, out: &mut Vec<u8>) -> Result<(), BoxError> {
        let body = (self.body)(codecs)?;

        let mut disposition = format!("form-data; name=\"{}\"", escape_quoted(name));
        for parameter in &self.disposition {
            disposition.push_str("; ");
            disposition.push_str(parameter);
        }
        out.extend_from_slice(format!("Content-Disposition: {disposition}\r\n").as_bytes());
        if let Some(content_type) = &self.content_type {
            out.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&body);
        out.extend_from_slice(b"\r\n");
        Ok(())
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Part")
            .field("content_type", &self.content_type)
            .field("disposition", &self.disposition)
            .finish_non_exhaustive()
    }
}

pub(crate) fn boundary() -> String {
    format!("courier-{}", Uuid::new_v4().simple())
}

pub(crate) fn encode_form(
    parts: &[(String, Part)],
    boundary: &str,
    codecs: &Codecs,
) -> Result<Vec<u8>, EncodingError> {
    let mut body = Vec::new();
    for (name, part) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        part.write_to(name, codecs, &mut body)
            .map_err(|source| EncodingError::Part {
                field: name.clone(),
                source,
            })?;
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    Ok(body)
}

// Field names and filenames go inside quoted strings; quotes and line breaks
// are percent-escaped as browsers do.
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
