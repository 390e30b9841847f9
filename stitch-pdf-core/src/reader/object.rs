//! Tokenizer for individual PDF values.

use std::io::{Read, Seek};

use lazy_static::lazy_static;
use regex::bytes::Regex;

use crate::encoding::cp1252_char;
use crate::error::{PdfError, Result};
use crate::objects::{Name, ObjRef, Object, PdfString, Real};
use crate::reader::dictionary::read_dictionary_or_stream;
use crate::reader::{
    is_delimiter, is_whitespace, peek_bytes, read_byte, read_exact, read_non_whitespace,
    seek_back, skip_to_eol, tell, ReadContext,
};

lazy_static! {
    // Disambiguates "12 0 R" from a bare number. The trailing class
    // requires one byte of lookahead beyond the R.
    static ref INDIRECT: Regex =
        Regex::new(r"(?-u)^[+-]?\d+\s+\d+\s+R[^a-zA-Z]").expect("indirect reference pattern");
}

/// Reads one object, dispatching on its first non-whitespace byte.
pub fn read_object<R: Read + Seek>(r: &mut R, cx: &mut ReadContext) -> Result<Object> {
    loop {
        let offset = tell(r)?;
        let Some(b) = read_byte(r)? else {
            return Err(PdfError::StreamTruncated { offset });
        };
        match b {
            b if is_whitespace(b) => continue,
            b'%' => {
                skip_to_eol(r)?;
                continue;
            }
            b'/' => {
                seek_back(r, 1)?;
                return read_name(r, cx);
            }
            b'<' => {
                let second = read_byte(r)?;
                if second == Some(b'<') {
                    seek_back(r, 2)?;
                    return read_dictionary_or_stream(r, cx);
                }
                if second.is_some() {
                    seek_back(r, 1)?;
                }
                return read_hex_string(r);
            }
            b'[' => return read_array(r, cx),
            b'(' => return read_literal_string(r, cx),
            b't' | b'f' => {
                seek_back(r, 1)?;
                return read_boolean(r);
            }
            b'n' => {
                seek_back(r, 1)?;
                return read_null(r);
            }
            b'0'..=b'9' | b'+' | b'-' | b'.' => {
                seek_back(r, 1)?;
                return read_number_or_reference(r, cx);
            }
            other => {
                return Err(PdfError::read(
                    offset,
                    format!("unexpected byte {:#04x} at start of object", other),
                ))
            }
        }
    }
}

fn read_boolean<R: Read + Seek>(r: &mut R) -> Result<Object> {
    let offset = tell(r)?;
    let word = read_exact(r, 4)?;
    match word.as_slice() {
        b"true" => Ok(Object::Boolean(true)),
        b"fals" => {
            let e = read_exact(r, 1)?;
            if e == b"e" {
                Ok(Object::Boolean(false))
            } else {
                Err(PdfError::read(offset, "could not read boolean object"))
            }
        }
        _ => Err(PdfError::read(offset, "could not read boolean object")),
    }
}

fn read_null<R: Read + Seek>(r: &mut R) -> Result<Object> {
    let offset = tell(r)?;
    let word = read_exact(r, 4)?;
    if word == b"null" {
        Ok(Object::Null)
    } else {
        Err(PdfError::read(offset, "could not read null object"))
    }
}

fn read_array<R: Read + Seek>(r: &mut R, cx: &mut ReadContext) -> Result<Object> {
    // positioned just past the opening bracket
    let mut items = Vec::new();
    loop {
        let Some(b) = read_non_whitespace(r)? else {
            return Err(PdfError::StreamTruncated { offset: tell(r)? });
        };
        if b == b']' {
            return Ok(Object::Array(items));
        }
        seek_back(r, 1)?;
        items.push(read_object(r, cx)?);
    }
}

fn read_name<R: Read + Seek>(r: &mut R, cx: &mut ReadContext) -> Result<Object> {
    let offset = tell(r)?;
    let slash = read_exact(r, 1)?;
    if slash != b"/" {
        return Err(PdfError::read(offset, "name read error"));
    }
    let mut raw = Vec::new();
    loop {
        match read_byte(r)? {
            None => break,
            Some(b) if is_whitespace(b) || is_delimiter(b) => {
                seek_back(r, 1)?;
                break;
            }
            Some(b) => raw.push(b),
        }
    }
    match std::str::from_utf8(&raw) {
        Ok(s) => Ok(Object::Name(Name::from(s))),
        Err(_) => {
            let mut decoded = String::with_capacity(raw.len());
            let clean = raw.iter().all(|&b| match cp1252_char(b) {
                Some(c) => {
                    decoded.push(c);
                    true
                }
                None => false,
            });
            if clean {
                Ok(Object::Name(Name::new(decoded)))
            } else if cx.strict {
                Err(PdfError::read(offset, "illegal character in name object"))
            } else {
                cx.warn("illegal character in name object");
                let literal: String = raw.iter().map(|&b| char::from(b)).collect();
                Ok(Object::Name(Name::new(literal)))
            }
        }
    }
}

/// Literal string body, opening parenthesis already consumed.
fn read_literal_string<R: Read + Seek>(r: &mut R, cx: &mut ReadContext) -> Result<Object> {
    let mut depth = 0usize;
    let mut out = Vec::new();
    loop {
        let Some(b) = read_byte(r)? else {
            return Err(PdfError::StreamTruncated { offset: tell(r)? });
        };
        match b {
            b'(' => {
                depth += 1;
                out.push(b'(');
            }
            b')' => {
                if depth == 0 {
                    return Ok(Object::String(PdfString::from_bytes(out)));
                }
                depth -= 1;
                out.push(b')');
            }
            b'\\' => {
                let Some(esc) = read_byte(r)? else {
                    return Err(PdfError::StreamTruncated { offset: tell(r)? });
                };
                match esc {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'(' | b')' | b'/' | b'\\' | b' ' | b'%' | b'<' | b'>' | b'[' | b']'
                    | b'#' | b'_' | b'&' | b'$' => out.push(esc),
                    b'0'..=b'7' => {
                        // up to three octal digits, high-order overflow ignored
                        let mut value = (esc - b'0') as u32;
                        for _ in 0..2 {
                            match read_byte(r)? {
                                Some(d @ b'0'..=b'7') => {
                                    value = value * 8 + (d - b'0') as u32;
                                }
                                Some(_) => {
                                    seek_back(r, 1)?;
                                    break;
                                }
                                None => break,
                            }
                        }
                        out.push((value & 0xff) as u8);
                    }
                    b'\n' | b'\r' => {
                        // escaped line break: swallow the paired EOL byte,
                        // contribute nothing
                        match read_byte(r)? {
                            Some(b'\n') | Some(b'\r') | None => {}
                            Some(_) => seek_back(r, 1)?,
                        }
                    }
                    other => {
                        cx.warn(&format!(
                            "unexpected escaped character in string: {:?}",
                            char::from(other)
                        ));
                        out.push(other);
                    }
                }
            }
            other => out.push(other),
        }
    }
}

/// Hex string body, opening angle bracket already consumed.
fn read_hex_string<R: Read + Seek>(r: &mut R) -> Result<Object> {
    let mut digits = Vec::new();
    loop {
        let Some(b) = read_non_whitespace(r)? else {
            return Err(PdfError::StreamTruncated { offset: tell(r)? });
        };
        if b == b'>' {
            break;
        }
        digits.push(b);
    }
    if digits.len() % 2 == 1 {
        // odd nibble count: the final digit is padded with zero
        digits.push(b'0');
    }
    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        let hi = hex_value(pair[0]);
        let lo = hex_value(pair[1]);
        match (hi, lo) {
            (Some(h), Some(l)) => bytes.push(h << 4 | l),
            _ => {
                return Err(PdfError::read(
                    tell(r)?,
                    "invalid digit in hexadecimal string",
                ))
            }
        }
    }
    Ok(Object::String(PdfString::from_bytes(bytes)))
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn read_number_or_reference<R: Read + Seek>(r: &mut R, cx: &mut ReadContext) -> Result<Object> {
    let ahead = peek_bytes(r, 20)?;
    if INDIRECT.is_match(&ahead) {
        read_reference(r, cx)
    } else {
        read_number(r, cx)
    }
}

fn read_number<R: Read + Seek>(r: &mut R, cx: &mut ReadContext) -> Result<Object> {
    let offset = tell(r)?;
    let mut digits = Vec::new();
    loop {
        match read_byte(r)? {
            Some(b @ (b'0'..=b'9' | b'+' | b'-' | b'.')) => digits.push(b),
            Some(_) => {
                seek_back(r, 1)?;
                break;
            }
            None => break,
        }
    }
    let text = String::from_utf8_lossy(&digits);
    if text.contains('.') {
        match text.parse::<f64>() {
            Ok(v) => Ok(Object::Real(Real(v))),
            Err(_) => {
                cx.warn(&format!("could not parse real number {text:?}, using 0"));
                Ok(Object::Real(Real(0.0)))
            }
        }
    } else {
        text.parse::<i64>()
            .map(Object::Integer)
            .map_err(|_| PdfError::read(offset, format!("could not parse integer {text:?}")))
    }
}

fn read_reference<R: Read + Seek>(r: &mut R, cx: &mut ReadContext) -> Result<Object> {
    let offset = tell(r)?;
    let mut id_digits = Vec::new();
    loop {
        let Some(b) = read_byte(r)? else {
            return Err(PdfError::StreamTruncated { offset: tell(r)? });
        };
        if is_whitespace(b) {
            break;
        }
        id_digits.push(b);
    }
    let mut gen_digits = Vec::new();
    loop {
        let Some(b) = read_byte(r)? else {
            return Err(PdfError::StreamTruncated { offset: tell(r)? });
        };
        if is_whitespace(b) {
            if gen_digits.is_empty() {
                continue;
            }
            break;
        }
        gen_digits.push(b);
    }
    if read_non_whitespace(r)? != Some(b'R') {
        return Err(PdfError::read(
            tell(r)?,
            "error reading indirect object reference",
        ));
    }
    let id = parse_digits(&id_digits, offset)?;
    let gen = parse_digits(&gen_digits, offset)? as u32;
    Ok(Object::Reference(ObjRef {
        id,
        gen,
        doc: cx.doc,
    }))
}

fn parse_digits(digits: &[u8], offset: u64) -> Result<u64> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| PdfError::read(offset, "malformed indirect object reference"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::BufferSink;
    use crate::objects::DocumentId;
    use std::io::Cursor;

    fn parse(input: &[u8]) -> Object {
        let mut sink = BufferSink::default();
        let mut cx = ReadContext::new(DocumentId::next(), true, &mut sink);
        read_object(&mut Cursor::new(input), &mut cx).unwrap()
    }

    fn parse_err(input: &[u8]) -> PdfError {
        let mut sink = BufferSink::default();
        let mut cx = ReadContext::new(DocumentId::next(), true, &mut sink);
        read_object(&mut Cursor::new(input), &mut cx).unwrap_err()
    }

    #[test]
    fn test_booleans_and_null() {
        assert_eq!(parse(b"true"), Object::Boolean(true));
        assert_eq!(parse(b"false "), Object::Boolean(false));
        assert_eq!(parse(b"null"), Object::Null);
        assert!(matches!(parse_err(b"nule"), PdfError::Read { .. }));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse(b"42"), Object::Integer(42));
        assert_eq!(parse(b"-7 "), Object::Integer(-7));
        assert_eq!(parse(b"+3"), Object::Integer(3));
        assert_eq!(parse(b"3.14"), Object::Real(Real(3.14)));
        assert_eq!(parse(b"-.5"), Object::Real(Real(-0.5)));
    }

    #[test]
    fn test_invalid_real_degrades_to_zero() {
        let mut sink = BufferSink::default();
        let mut cx = ReadContext::new(DocumentId::next(), true, &mut sink);
        let obj = read_object(&mut Cursor::new(b"1.2.3 ".as_slice()), &mut cx).unwrap();
        assert_eq!(obj, Object::Real(Real(0.0)));
        assert_eq!(sink.messages.len(), 1);
    }

    #[test]
    fn test_reference_vs_number() {
        let doc = DocumentId::next();
        let mut sink = BufferSink::default();
        let mut cx = ReadContext::new(doc, true, &mut sink);
        let obj = read_object(&mut Cursor::new(b"12 0 R ".as_slice()), &mut cx).unwrap();
        assert_eq!(obj, Object::Reference(ObjRef { id: 12, gen: 0, doc }));

        // two integers that are not a reference stay separate
        let mut cursor = Cursor::new(b"12 0 RB".as_slice());
        let first = read_object(&mut cursor, &mut cx).unwrap();
        assert_eq!(first, Object::Integer(12));
    }

    #[test]
    fn test_name_plain() {
        assert_eq!(parse(b"/Type "), Object::name("Type"));
        assert_eq!(parse(b"/Kids["), Object::name("Kids"));
    }

    #[test]
    fn test_name_illegal_byte_strict_vs_lenient() {
        let input = b"/Na\x81me ";
        let mut sink = BufferSink::default();
        let mut strict = ReadContext::new(DocumentId::next(), true, &mut sink);
        assert!(read_object(&mut Cursor::new(input.as_slice()), &mut strict).is_err());

        let mut sink = BufferSink::default();
        let mut lenient = ReadContext::new(DocumentId::next(), false, &mut sink);
        let obj = read_object(&mut Cursor::new(input.as_slice()), &mut lenient).unwrap();
        assert_eq!(obj, Object::Name(Name::new("Na\u{81}me")));
        assert_eq!(sink.messages.len(), 1);
    }

    #[test]
    fn test_literal_string_simple() {
        let obj = parse(b"(hello world)");
        assert_eq!(obj, Object::text("hello world"));
    }

    #[test]
    fn test_literal_string_balanced_parens() {
        let obj = parse(b"(a (nested) b)");
        assert_eq!(obj, Object::text("a (nested) b"));
    }

    #[test]
    fn test_literal_string_escapes() {
        // octal, escaped EOL, escaped close paren
        let obj = parse(b"(\\101\n\\))");
        assert_eq!(obj, Object::text("A\n)"));
    }

    #[test]
    fn test_escaped_line_break_consumes_pair() {
        let obj = parse(b"(one\\\r\ntwo)");
        assert_eq!(obj, Object::text("onetwo"));
    }

    #[test]
    fn test_octal_overflow_masked() {
        let obj = parse(b"(\\777)");
        let s = obj.as_string().unwrap();
        assert_eq!(s.original_bytes().unwrap(), vec![0xff]);
    }

    #[test]
    fn test_unknown_escape_warns_and_keeps_byte() {
        let mut sink = BufferSink::default();
        let mut cx = ReadContext::new(DocumentId::next(), true, &mut sink);
        let obj = read_object(&mut Cursor::new(b"(a\\zb)".as_slice()), &mut cx).unwrap();
        assert_eq!(obj, Object::text("azb"));
        assert_eq!(sink.messages.len(), 1);
    }

    #[test]
    fn test_hex_string() {
        let obj = parse(b"<48 65 6C6C 6F>");
        assert_eq!(obj, Object::text("Hello"));
    }

    #[test]
    fn test_hex_string_odd_length_padded() {
        let obj = parse(b"<414>");
        let s = obj.as_string().unwrap();
        assert_eq!(s.original_bytes().unwrap(), vec![0x41, 0x40]);
    }

    #[test]
    fn test_hex_string_truncated() {
        assert!(matches!(
            parse_err(b"<4142"),
            PdfError::StreamTruncated { .. }
        ));
    }

    #[test]
    fn test_array_nested() {
        let obj = parse(b"[ 1 [ 2 3 ] /Fit ]");
        assert_eq!(
            obj,
            Object::Array(vec![
                Object::Integer(1),
                Object::Array(vec![Object::Integer(2), Object::Integer(3)]),
                Object::name("Fit"),
            ])
        );
    }

    #[test]
    fn test_comment_skipped() {
        assert_eq!(parse(b"% page count\n17"), Object::Integer(17));
    }

    #[test]
    fn test_string_round_trip_through_writer() {
        use crate::objects::write_object;
        let original = parse(b"(line one\\nline two)");
        let mut out = Vec::new();
        write_object(&mut out, &original, None).unwrap();
        assert_eq!(parse(&out), original);
    }

    #[test]
    fn test_eof_is_truncation() {
        assert!(matches!(parse_err(b"   "), PdfError::StreamTruncated { .. }));
        assert!(matches!(parse_err(b"(open"), PdfError::StreamTruncated { .. }));
    }
}
