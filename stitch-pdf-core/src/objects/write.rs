//! Canonical serialization of PDF values.

use std::io::Write;

use crate::encryption::rc4;
use crate::error::Result;
use crate::objects::{Object, PdfString};

/// Writes `obj` in PDF syntax. With an encryption key, string and stream
/// payloads are RC4-transformed on the way out.
pub fn write_object<W: Write>(w: &mut W, obj: &Object, key: Option<&[u8]>) -> Result<()> {
    match obj {
        Object::Null => w.write_all(b"null")?,
        Object::Boolean(true) => w.write_all(b"true")?,
        Object::Boolean(false) => w.write_all(b"false")?,
        Object::Integer(n) => write!(w, "{n}")?,
        Object::Real(r) => write!(w, "{r}")?,
        Object::Name(n) => write!(w, "{n}")?,
        Object::String(s) => write_string(w, s, key)?,
        Object::Array(items) => {
            w.write_all(b"[")?;
            for item in items {
                w.write_all(b" ")?;
                write_object(w, item, key)?;
            }
            w.write_all(b" ]")?;
        }
        Object::Dictionary(dict) => {
            w.write_all(b"<<\n")?;
            for (name, value) in dict.iter() {
                write!(w, "{name} ")?;
                write_object(w, value, key)?;
                w.write_all(b"\n")?;
            }
            w.write_all(b">>")?;
        }
        Object::Stream(stream) => {
            let data = match key {
                Some(key) => rc4(key, stream.raw_data()),
                None => stream.raw_data().to_vec(),
            };
            let mut dict = stream.dict().clone();
            dict.set("Length", data.len() as i64);
            write_object(w, &Object::Dictionary(dict), key)?;
            w.write_all(b"\nstream\n")?;
            w.write_all(&data)?;
            w.write_all(b"\nendstream")?;
        }
        Object::Reference(r) => write!(w, "{r}")?,
    }
    Ok(())
}

fn write_string<W: Write>(w: &mut W, s: &PdfString, key: Option<&[u8]>) -> Result<()> {
    match s {
        PdfString::Text { .. } => {
            let bytes = s.output_bytes();
            match key {
                Some(key) => write_hex_string(w, &rc4(key, &bytes)),
                None => write_literal_string(w, &bytes),
            }
        }
        PdfString::Bytes(bytes) => {
            let encrypted;
            let payload = match key {
                Some(key) => {
                    encrypted = rc4(key, bytes);
                    &encrypted
                }
                None => bytes,
            };
            write_hex_string(w, payload)
        }
    }
}

fn write_literal_string<W: Write>(w: &mut W, bytes: &[u8]) -> Result<()> {
    w.write_all(b"(")?;
    for &b in bytes {
        // anything outside alphanumerics and spaces is octal-escaped
        if b.is_ascii_alphanumeric() || b == b' ' {
            w.write_all(&[b])?;
        } else {
            write!(w, "\\{b:03o}")?;
        }
    }
    w.write_all(b")")?;
    Ok(())
}

fn write_hex_string<W: Write>(w: &mut W, bytes: &[u8]) -> Result<()> {
    w.write_all(b"<")?;
    for b in bytes {
        write!(w, "{b:02x}")?;
    }
    w.write_all(b">")?;
    Ok(())
}
