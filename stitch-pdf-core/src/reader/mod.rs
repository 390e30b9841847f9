//! Recursive-descent reader for PDF object syntax.
//!
//! [`read_object`] consumes one value from a seekable byte stream. The
//! surrounding document supplies a [`ReadContext`]: its identity (stamped
//! into every indirect reference), the strictness switch, a diagnostic sink
//! for recoverable conditions, and optionally a [`Resolver`] so a stream's
//! indirect `/Length` can be chased mid-parse.

mod dictionary;
mod object;

pub use object::read_object;

use std::io::{Read, Seek, SeekFrom};

use crate::diagnostics::DiagnosticSink;
use crate::error::{PdfError, Result};
use crate::objects::{DocumentId, ObjRef, Object};

/// Looks up the target of an indirect reference during parsing. The caller's
/// sink is passed along so diagnostics from the nested parse reach it.
pub trait Resolver {
    fn resolve(&mut self, r: ObjRef, sink: &mut dyn DiagnosticSink) -> Result<Object>;
}

/// State threaded through a parse.
pub struct ReadContext<'a> {
    pub doc: DocumentId,
    pub strict: bool,
    pub sink: &'a mut dyn DiagnosticSink,
    pub resolver: Option<&'a mut dyn Resolver>,
}

impl<'a> ReadContext<'a> {
    pub fn new(doc: DocumentId, strict: bool, sink: &'a mut dyn DiagnosticSink) -> Self {
        ReadContext {
            doc,
            strict,
            sink,
            resolver: None,
        }
    }

    /// Context for fragments that belong to no document, such as content
    /// stream operands.
    pub fn anonymous(sink: &'a mut dyn DiagnosticSink) -> Self {
        Self::new(DocumentId::next(), false, sink)
    }

    pub(crate) fn warn(&mut self, message: &str) {
        self.sink.warning(message);
    }

    pub(crate) fn resolve(&mut self, r: ObjRef) -> Result<Object> {
        match self.resolver.as_deref_mut() {
            Some(resolver) => resolver.resolve(r, &mut *self.sink),
            None => Err(PdfError::Consistency(format!(
                "cannot resolve {r} without a document"
            ))),
        }
    }
}

pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\x00' | b'\t' | b'\n' | b'\x0c' | b'\r' | b' ')
}

pub(crate) fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

pub(crate) fn read_byte<R: Read>(r: &mut R) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    match r.read(&mut buf)? {
        0 => Ok(None),
        _ => Ok(Some(buf[0])),
    }
}

pub(crate) fn tell<R: Seek>(r: &mut R) -> Result<u64> {
    Ok(r.stream_position()?)
}

pub(crate) fn seek_back<R: Seek>(r: &mut R, n: u64) -> Result<()> {
    r.seek(SeekFrom::Current(-(n as i64)))?;
    Ok(())
}

/// Skips whitespace and returns the first byte after it, consumed.
pub(crate) fn read_non_whitespace<R: Read>(r: &mut R) -> Result<Option<u8>> {
    loop {
        match read_byte(r)? {
            Some(b) if is_whitespace(b) => continue,
            other => return Ok(other),
        }
    }
}

/// Reads up to `n` bytes without moving the position.
pub(crate) fn peek_bytes<R: Read + Seek>(r: &mut R, n: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    let mut total = 0;
    while total < n {
        let k = r.read(&mut buf[total..])?;
        if k == 0 {
            break;
        }
        total += k;
    }
    buf.truncate(total);
    seek_back(r, total as u64)?;
    Ok(buf)
}

/// Reads exactly `n` bytes, reporting truncation with the current offset.
pub(crate) fn read_exact<R: Read + Seek>(r: &mut R, n: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    let mut total = 0;
    while total < n {
        let k = r.read(&mut buf[total..])?;
        if k == 0 {
            return Err(PdfError::StreamTruncated {
                offset: tell(r)?,
            });
        }
        total += k;
    }
    Ok(buf)
}

/// Consumes input up to and including the next EOL byte.
pub(crate) fn skip_to_eol<R: Read>(r: &mut R) -> Result<()> {
    loop {
        match read_byte(r)? {
            None | Some(b'\n') | Some(b'\r') => return Ok(()),
            Some(_) => continue,
        }
    }
}
