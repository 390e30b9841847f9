//! PDFDocEncoding and the CP1252 fallback used for name objects.
//!
//! PDFDocEncoding is the single-byte text encoding PDF uses for strings
//! outside content streams. Four code points (0x16, 0x7F, 0x9F, 0xAD) are
//! unassigned; a byte string touching one of them cannot be represented as
//! text and stays a byte string.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref PDF_DOC_MAP: [char; 256] = build_forward_table();
    static ref PDF_DOC_REV: HashMap<char, u8> = {
        let mut rev = HashMap::new();
        for (byte, &ch) in PDF_DOC_MAP.iter().enumerate() {
            if ch != '\u{0}' {
                rev.entry(ch).or_insert(byte as u8);
            }
        }
        rev
    };
}

// Code points 0x80..=0x9E, the only range that departs from Latin-1.
const PDF_DOC_HIGH: [char; 31] = [
    '\u{2022}', '\u{2020}', '\u{2021}', '\u{2026}', '\u{2014}', '\u{2013}',
    '\u{0192}', '\u{2044}', '\u{2039}', '\u{203a}', '\u{2212}', '\u{2030}',
    '\u{201e}', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}', '\u{201a}',
    '\u{2122}', '\u{fb01}', '\u{fb02}', '\u{0141}', '\u{0152}', '\u{0160}',
    '\u{0178}', '\u{017d}', '\u{0131}', '\u{0142}', '\u{0153}', '\u{0161}',
    '\u{017e}',
];

fn build_forward_table() -> [char; 256] {
    // '\u{0}' marks an unassigned slot. Byte 0x00 maps there as well, so a
    // NUL byte is never decodable as text.
    let mut table = ['\u{0}'; 256];
    for b in 0x01..=0x15u8 {
        table[b as usize] = char::from(b);
    }
    table[0x17] = '\u{17}';
    let accents = [
        '\u{2d8}', '\u{2c7}', '\u{2c6}', '\u{2d9}', '\u{2dd}', '\u{2db}',
        '\u{2da}', '\u{2dc}',
    ];
    for (i, &c) in accents.iter().enumerate() {
        table[0x18 + i] = c;
    }
    for b in 0x20..=0x7eu8 {
        table[b as usize] = char::from(b);
    }
    for (i, &c) in PDF_DOC_HIGH.iter().enumerate() {
        table[0x80 + i] = c;
    }
    table[0xa0] = '\u{20ac}';
    for b in 0xa1..=0xffu8 {
        if b != 0xad {
            table[b as usize] = char::from(b);
        }
    }
    table
}

/// Decodes PDFDocEncoding bytes, or `None` if any byte is unassigned.
pub fn decode_pdf_doc(bytes: &[u8]) -> Option<String> {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        let c = PDF_DOC_MAP[b as usize];
        if c == '\u{0}' {
            return None;
        }
        out.push(c);
    }
    Some(out)
}

/// Encodes text as PDFDocEncoding, or `None` if a character has no slot.
pub fn encode_pdf_doc(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        out.push(*PDF_DOC_REV.get(&c)?);
    }
    Some(out)
}

/// CP1252 mapping for a single byte, `None` for the five undefined slots.
pub(crate) fn cp1252_char(byte: u8) -> Option<char> {
    const HIGH: [u32; 32] = [
        0x20ac, 0, 0x201a, 0x0192, 0x201e, 0x2026, 0x2020, 0x2021, 0x02c6,
        0x2030, 0x0160, 0x2039, 0x0152, 0, 0x017d, 0, 0, 0x2018, 0x2019,
        0x201c, 0x201d, 0x2022, 0x2013, 0x2014, 0x02dc, 0x2122, 0x0161,
        0x203a, 0x0153, 0, 0x017e, 0x0178,
    ];
    if (0x80..=0x9f).contains(&byte) {
        let cp = HIGH[(byte - 0x80) as usize];
        char::from_u32(cp).filter(|_| cp != 0)
    } else {
        Some(char::from(byte))
    }
}
