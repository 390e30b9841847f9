//! Content stream tokenizing and re-serialization.
//!
//! A content stream is a flat sequence of operand lists, each terminated by
//! an operator. Inline images (`BI ... ID ... EI`) get their own entry kind
//! because their payload is raw bytes, not object syntax.

use std::io::Cursor;

use crate::diagnostics::DiagnosticSink;
use crate::error::{PdfError, Result};
use crate::objects::{write_object, Dictionary, Object};
use crate::reader::{
    is_delimiter, is_whitespace, read_byte, read_exact, read_non_whitespace, read_object,
    seek_back, skip_to_eol, tell, ReadContext,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ContentEntry {
    Operation {
        operands: Vec<Object>,
        operator: String,
    },
    InlineImage {
        settings: Dictionary,
        data: Vec<u8>,
    },
}

/// Parsed content stream, order-preserving.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentStream {
    pub entries: Vec<ContentEntry>,
}

impl ContentStream {
    /// Tokenizes `data` into `(operands, operator)` entries. Operands use
    /// the full object reader; indirect references never occur inside
    /// content, so parsing happens against an anonymous context.
    pub fn parse(data: &[u8], sink: &mut dyn DiagnosticSink) -> Result<ContentStream> {
        let mut cx = ReadContext::anonymous(sink);
        let mut cur = Cursor::new(data);
        let mut entries = Vec::new();
        let mut operands = Vec::new();
        loop {
            let Some(b) = read_non_whitespace(&mut cur)? else {
                break;
            };
            if b.is_ascii_alphabetic() || b == b'\'' || b == b'"' {
                seek_back(&mut cur, 1)?;
                let operator = read_operator(&mut cur)?;
                if operator == "BI" {
                    if !operands.is_empty() {
                        return Err(PdfError::read(
                            tell(&mut cur)?,
                            "inline image preceded by stray operands",
                        ));
                    }
                    entries.push(read_inline_image(&mut cur, &mut cx)?);
                } else {
                    entries.push(ContentEntry::Operation {
                        operands: std::mem::take(&mut operands),
                        operator,
                    });
                }
            } else if b == b'%' {
                skip_to_eol(&mut cur)?;
            } else {
                seek_back(&mut cur, 1)?;
                operands.push(read_object(&mut cur, &mut cx)?);
            }
        }
        Ok(ContentStream { entries })
    }

    /// The exact inverse of [`ContentStream::parse`]: operands separated by
    /// spaces, the operator last, one entry per line.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for entry in &self.entries {
            match entry {
                ContentEntry::Operation { operands, operator } => {
                    for operand in operands {
                        write_object(&mut out, operand, None)?;
                        out.push(b' ');
                    }
                    out.extend_from_slice(operator.as_bytes());
                    out.push(b'\n');
                }
                ContentEntry::InlineImage { settings, data } => {
                    out.extend_from_slice(b"BI");
                    let mut dict_text = Vec::new();
                    write_object(&mut dict_text, &Object::Dictionary(settings.clone()), None)?;
                    // strip the enclosing << >>
                    out.extend_from_slice(&dict_text[2..dict_text.len() - 2]);
                    out.extend_from_slice(b"ID ");
                    out.extend_from_slice(data);
                    out.extend_from_slice(b"EI\n");
                }
            }
        }
        Ok(out)
    }
}

fn read_operator(cur: &mut Cursor<&[u8]>) -> Result<String> {
    let mut raw = Vec::new();
    loop {
        match read_byte(cur)? {
            None => break,
            Some(b) if is_whitespace(b) || is_delimiter(b) => {
                seek_back(cur, 1)?;
                break;
            }
            Some(b) => raw.push(b),
        }
    }
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

/// Inline image sub-parser, entered just after `BI`.
fn read_inline_image(cur: &mut Cursor<&[u8]>, cx: &mut ReadContext) -> Result<ContentEntry> {
    let mut settings = Dictionary::new();
    loop {
        let Some(b) = read_non_whitespace(cur)? else {
            return Err(PdfError::StreamTruncated { offset: tell(cur)? });
        };
        seek_back(cur, 1)?;
        if b == b'I' {
            break;
        }
        let key = match read_object(cur, cx)? {
            Object::Name(name) => name,
            other => {
                return Err(PdfError::read(
                    tell(cur)?,
                    format!("inline image setting key is not a name: {other:?}"),
                ))
            }
        };
        let value = read_object(cur, cx)?;
        settings.set(key, value);
    }
    // "ID" plus the single separator byte after it
    let marker = read_exact(cur, 3)?;
    if &marker[..2] != b"ID" {
        return Err(PdfError::read(
            tell(cur)?,
            "inline image data must start with ID",
        ));
    }

    let mut data = Vec::new();
    loop {
        let Some(b) = read_byte(cur)? else {
            return Err(PdfError::StreamTruncated { offset: tell(cur)? });
        };
        if b != b'E' {
            data.push(b);
            continue;
        }
        match read_byte(cur)? {
            Some(b'I') => {
                // candidate terminator. Image data may itself contain EI,
                // so require trailing whitespace and a Q operator (or the
                // end of the stream) before accepting it.
                let mut lookahead = vec![b'E', b'I'];
                let mut saw_whitespace = false;
                let accepted = loop {
                    match read_byte(cur)? {
                        None => break true,
                        Some(w) if is_whitespace(w) => {
                            saw_whitespace = true;
                            lookahead.push(w);
                        }
                        Some(b'Q') if saw_whitespace => {
                            seek_back(cur, 1)?;
                            break true;
                        }
                        Some(_) => {
                            seek_back(cur, 1)?;
                            break false;
                        }
                    }
                };
                if accepted {
                    return Ok(ContentEntry::InlineImage { settings, data });
                }
                data.extend_from_slice(&lookahead);
            }
            Some(_) => {
                seek_back(cur, 1)?;
                data.push(b'E');
            }
            None => {
                return Err(PdfError::StreamTruncated { offset: tell(cur)? });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::BufferSink;
    use crate::objects::Real;

    fn parse(data: &[u8]) -> ContentStream {
        let mut sink = BufferSink::default();
        ContentStream::parse(data, &mut sink).unwrap()
    }

    #[test]
    fn test_basic_operations() {
        let cs = parse(b"q\n1 0 0 1 72 720 cm\nBT /F1 12 Tf (Hi) Tj ET\nQ");
        let ops: Vec<&str> = cs
            .entries
            .iter()
            .map(|e| match e {
                ContentEntry::Operation { operator, .. } => operator.as_str(),
                _ => "image",
            })
            .collect();
        assert_eq!(ops, vec!["q", "cm", "BT", "Tf", "Tj", "ET", "Q"]);

        match &cs.entries[1] {
            ContentEntry::Operation { operands, .. } => {
                assert_eq!(operands.len(), 6);
                assert_eq!(operands[4], Object::Integer(72));
            }
            _ => panic!("expected operation"),
        }
    }

    #[test]
    fn test_quote_operators() {
        let cs = parse(b"(a) ' (b) \"");
        match &cs.entries[0] {
            ContentEntry::Operation { operator, operands } => {
                assert_eq!(operator, "'");
                assert_eq!(operands, &vec![Object::text("a")]);
            }
            _ => panic!("expected operation"),
        }
    }

    #[test]
    fn test_comment_in_operator_position() {
        let cs = parse(b"q % save state\nQ");
        assert_eq!(cs.entries.len(), 2);
    }

    #[test]
    fn test_inline_image_basic() {
        let cs = parse(b"BI /W 1 /H 1 ID \x00\xff\x10 EI Q");
        assert_eq!(cs.entries.len(), 2);
        match &cs.entries[0] {
            ContentEntry::InlineImage { settings, data } => {
                assert_eq!(settings.get("W").and_then(Object::as_integer), Some(1));
                assert_eq!(data, &vec![0x00, 0xff, 0x10, b' ']);
            }
            _ => panic!("expected inline image"),
        }
    }

    #[test]
    fn test_inline_image_with_embedded_ei() {
        // the first EI is not followed by whitespace and Q, so it is data
        let cs = parse(b"BI /W 1 /H 1 ID \x45\x49xx EI Q");
        match &cs.entries[0] {
            ContentEntry::InlineImage { data, .. } => {
                assert_eq!(data, b"EIxx ");
            }
            _ => panic!("expected inline image"),
        }
    }

    #[test]
    fn test_inline_image_terminated_by_end_of_stream() {
        let cs = parse(b"BI /W 1 /H 1 ID ab EI");
        match &cs.entries[0] {
            ContentEntry::InlineImage { data, .. } => assert_eq!(data, b"ab "),
            _ => panic!("expected inline image"),
        }
    }

    #[test]
    fn test_unterminated_inline_image() {
        let mut sink = BufferSink::default();
        let err = ContentStream::parse(b"BI /W 1 ID data without end", &mut sink).unwrap_err();
        assert!(matches!(err, PdfError::StreamTruncated { .. }));
    }

    #[test]
    fn test_round_trip_stability() {
        let input: &[u8] = b"q\n0.5 0 0 0.5 0 0 cm\nBT /F1 9.5 Tf (text (nested)) Tj ET\nQ\n";
        let first = parse(input);
        let serialized = first.to_bytes().unwrap();
        let second = parse(&serialized);
        assert_eq!(first, second);
        // a second serialize pass is byte-identical
        assert_eq!(serialized, second.to_bytes().unwrap());
    }

    #[test]
    fn test_round_trip_with_inline_image() {
        let input: &[u8] = b"q\nBI\n/W 2\n/H 2\nID \x01\x02\x03\x04 EI\nQ\n";
        let first = parse(input);
        let serialized = first.to_bytes().unwrap();
        let second = parse(&serialized);
        assert_eq!(first, second);
    }

    #[test]
    fn test_real_operands() {
        let cs = parse(b"0.57 w");
        match &cs.entries[0] {
            ContentEntry::Operation { operands, .. } => {
                assert_eq!(operands[0], Object::Real(Real(0.57)));
            }
            _ => panic!("expected operation"),
        }
    }
}
