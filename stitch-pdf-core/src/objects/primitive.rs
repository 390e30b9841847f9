//! Primitive PDF values and the tagged `Object` union.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::encoding::{decode_pdf_doc, encode_pdf_doc};
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, StreamObject};

/// Identity of an open document. References compare equal only when they
/// name the same object number in the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Allocates a fresh, process-unique identity.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        DocumentId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Indirect reference: object number, generation, owning document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub id: u64,
    pub gen: u32,
    pub doc: DocumentId,
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

/// Real number preserving the textual form PDF expects: integral values
/// render without a decimal point, everything else with up to five
/// fractional digits, trailing zeros stripped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Real(pub f64);

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
            return write!(f, "{}", v as i64);
        }
        let mut s = format!("{v:.5}");
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        f.write_str(&s)
    }
}

/// Name object, stored without the leading slash. Equality and hashing go
/// by the decoded string value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Name(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name(s.to_string())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

/// How a text string was decoded from its input bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    PdfDoc,
    Utf16Be,
}

/// PDF string: decoded text when one of the two text encodings applies,
/// otherwise the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfString {
    Text {
        value: String,
        /// `None` for strings built in memory rather than parsed.
        source: Option<TextSource>,
    },
    Bytes(Vec<u8>),
}

impl PdfString {
    /// A fresh in-memory text string.
    pub fn text(value: impl Into<String>) -> Self {
        PdfString::Text {
            value: value.into(),
            source: None,
        }
    }

    /// Promotes raw input bytes to text where possible. A UTF-16BE byte
    /// order mark wins; otherwise a clean PDFDocEncoding round-trip;
    /// otherwise the bytes are kept as-is.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        if bytes.starts_with(&[0xfe, 0xff]) {
            let rest = &bytes[2..];
            if rest.len() % 2 == 0 {
                let units: Vec<u16> = rest
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                if let Ok(value) = String::from_utf16(&units) {
                    return PdfString::Text {
                        value,
                        source: Some(TextSource::Utf16Be),
                    };
                }
            }
            return PdfString::Bytes(bytes);
        }
        match decode_pdf_doc(&bytes) {
            Some(value) => PdfString::Text {
                value,
                source: Some(TextSource::PdfDoc),
            },
            None => PdfString::Bytes(bytes),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PdfString::Text { value, .. } => Some(value),
            PdfString::Bytes(_) => None,
        }
    }

    /// The exact bytes this string was parsed from.
    pub fn original_bytes(&self) -> Result<Vec<u8>> {
        match self {
            PdfString::Bytes(bytes) => Ok(bytes.clone()),
            PdfString::Text { value, source } => match source {
                Some(TextSource::Utf16Be) => Ok(utf16_with_bom(value)),
                Some(TextSource::PdfDoc) => encode_pdf_doc(value).ok_or_else(|| {
                    PdfError::Consistency(
                        "text string no longer representable in its source encoding".to_string(),
                    )
                }),
                None => Err(PdfError::UnsupportedOperation(
                    "string was not parsed from input, original bytes unknown".to_string(),
                )),
            },
        }
    }

    /// The bytes to write: PDFDocEncoding when it fits, else BOM + UTF-16BE.
    pub(crate) fn output_bytes(&self) -> Vec<u8> {
        match self {
            PdfString::Bytes(bytes) => bytes.clone(),
            PdfString::Text { value, .. } => {
                encode_pdf_doc(value).unwrap_or_else(|| utf16_with_bom(value))
            }
        }
    }
}

fn utf16_with_bom(value: &str) -> Vec<u8> {
    let mut out = vec![0xfe, 0xff];
    for unit in value.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Any PDF value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(Real),
    Name(Name),
    String(PdfString),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(StreamObject),
    Reference(ObjRef),
}

impl Object {
    pub fn name(s: &str) -> Self {
        Object::Name(Name::from(s))
    }

    pub fn text(s: &str) -> Self {
        Object::String(PdfString::text(s))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Integer or real, as f64. Positional destination fields accept both.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(n) => Some(*n as f64),
            Object::Real(Real(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&StreamObject> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Object::Boolean(v)
    }
}

impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Object::Integer(v)
    }
}

impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Object::Real(Real(v))
    }
}

impl From<Name> for Object {
    fn from(v: Name) -> Self {
        Object::Name(v)
    }
}

impl From<PdfString> for Object {
    fn from(v: PdfString) -> Self {
        Object::String(v)
    }
}

impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Self {
        Object::Array(v)
    }
}

impl From<Dictionary> for Object {
    fn from(v: Dictionary) -> Self {
        Object::Dictionary(v)
    }
}

impl From<StreamObject> for Object {
    fn from(v: StreamObject) -> Self {
        Object::Stream(v)
    }
}

impl From<ObjRef> for Object {
    fn from(v: ObjRef) -> Self {
        Object::Reference(v)
    }
}
