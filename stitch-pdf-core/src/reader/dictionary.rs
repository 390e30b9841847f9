//! Dictionary and stream parsing.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, StreamObject};
use crate::reader::object::read_object;
use crate::reader::{
    read_byte, read_exact, read_non_whitespace, seek_back, skip_to_eol, tell, ReadContext,
};

/// Reads `<< ... >>`, and the stream payload that may follow it.
///
/// The closing check is deliberately loose: after a `>` ends the entry list,
/// exactly one more byte is consumed without inspection. Real-world files
/// close with `>>`, and damaged ones that close with a single `>` still
/// parse.
pub fn read_dictionary_or_stream<R: Read + Seek>(
    r: &mut R,
    cx: &mut ReadContext,
) -> Result<Object> {
    let start = tell(r)?;
    let opening = read_exact(r, 2)?;
    if opening != b"<<" {
        return Err(PdfError::read(start, "dictionary read error"));
    }

    let mut dict = Dictionary::new();
    loop {
        let offset = tell(r)?;
        let Some(b) = read_byte(r)? else {
            return Err(PdfError::StreamTruncated { offset });
        };
        match b {
            // NULs and whitespace between entries are skipped
            b'\x00' | b'\t' | b'\n' | b'\x0c' | b'\r' | b' ' => continue,
            b'%' => {
                skip_to_eol(r)?;
                continue;
            }
            b'>' => {
                let _ = read_byte(r)?;
                break;
            }
            _ => {
                seek_back(r, 1)?;
            }
        }

        let key = match read_object(r, cx)? {
            Object::Name(name) => name,
            other => {
                return Err(PdfError::read(
                    offset,
                    format!("dictionary key is not a name: {other:?}"),
                ))
            }
        };
        let value = read_object(r, cx)?;
        if !dict.contains_key(key.as_str()) {
            dict.set(key, value);
        } else if cx.strict {
            return Err(PdfError::read(
                tell(r)?,
                format!("multiple definitions in dictionary for key {key}"),
            ));
        } else {
            cx.warn(&format!(
                "multiple definitions in dictionary for key {key}"
            ));
        }
    }

    // a stream keyword may follow the dictionary
    let after_dict = tell(r)?;
    if read_non_whitespace(r)? == Some(b's') {
        let keyword = read_exact(r, 5).unwrap_or_default();
        if keyword == b"tream" {
            return read_stream_payload(r, cx, dict);
        }
    }
    r.seek(SeekFrom::Start(after_dict))?;
    Ok(Object::Dictionary(dict))
}

fn read_stream_payload<R: Read + Seek>(
    r: &mut R,
    cx: &mut ReadContext,
    mut dict: Dictionary,
) -> Result<Object> {
    // some writers put spaces between the keyword and the EOL
    let mut eol = read_byte(r)?;
    while eol == Some(b' ') {
        eol = read_byte(r)?;
    }
    match eol {
        Some(b'\n') => {}
        Some(b'\r') => {
            // CRLF or bare CR
            if read_byte(r)? != Some(b'\n') {
                seek_back(r, 1)?;
            }
        }
        _ => {
            return Err(PdfError::stream_format(
                tell(r)?,
                "stream keyword not followed by end of line",
            ))
        }
    }

    let length = match dict.remove("Length") {
        None => {
            return Err(PdfError::stream_format(
                tell(r)?,
                "stream length not defined",
            ))
        }
        Some(Object::Reference(len_ref)) => {
            let here = tell(r)?;
            let resolved = cx.resolve(len_ref)?;
            r.seek(SeekFrom::Start(here))?;
            resolved
        }
        Some(direct) => direct,
    };
    let length = match length.as_integer() {
        Some(n) if n >= 0 => n as usize,
        _ => {
            return Err(PdfError::stream_format(
                tell(r)?,
                "stream length is not a non-negative integer",
            ))
        }
    };

    let mut data = read_exact(r, length)?;

    // the declared length is untrustworthy; verify the endstream marker
    let mut marker = Vec::with_capacity(9);
    if let Some(e) = read_non_whitespace(r)? {
        marker.push(e);
    }
    let mut rest = vec![0u8; 8];
    let got = r.read(&mut rest)?;
    marker.extend_from_slice(&rest[..got]);
    if marker != b"endstream" {
        // a common off-by-one: the length included the EOL before the
        // marker. Back up and look again.
        let failed_at = tell(r)?;
        r.seek(SeekFrom::Current(-10))?;
        let retry = read_exact(r, 9)?;
        if retry == b"endstream" {
            data.pop();
        } else {
            r.seek(SeekFrom::Start(failed_at))?;
            return Err(PdfError::stream_format(
                failed_at,
                "unable to find 'endstream' marker after stream",
            ));
        }
    }

    Ok(Object::Stream(StreamObject::new(dict, data)))
}
