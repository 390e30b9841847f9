//! Stream filter support.
//!
//! The stream object hands its `/Filter` chain and raw payload here and gets
//! plain bytes back. FlateDecode (zlib, with PNG predictors) is the only
//! implemented codec; anything else fails with [`PdfError::UnsupportedFilter`].

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object};

/// Runs the stream's filter chain over `data`, first filter first.
pub fn decode(dict: &Dictionary, data: &[u8]) -> Result<Vec<u8>> {
    let names = filter_names(dict)?;
    let parms = parms_list(dict, names.len());
    let mut current = data.to_vec();
    for (name, parm) in names.iter().zip(parms) {
        current = match name.as_str() {
            "FlateDecode" | "Fl" => flate_decode(&current, parm)?,
            other => return Err(PdfError::UnsupportedFilter(other.to_string())),
        };
    }
    Ok(current)
}

/// Deflate-compresses `data` for a `/FlateDecode` stream.
pub fn flate_encode(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // writing to a Vec cannot fail
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

fn filter_names(dict: &Dictionary) -> Result<Vec<String>> {
    match dict.get("Filter") {
        None => Ok(Vec::new()),
        Some(Object::Name(n)) => Ok(vec![n.as_str().to_string()]),
        Some(Object::Array(items)) => items
            .iter()
            .map(|item| match item {
                Object::Name(n) => Ok(n.as_str().to_string()),
                other => Err(PdfError::Consistency(format!(
                    "filter chain entry is not a name: {other:?}"
                ))),
            })
            .collect(),
        Some(other) => Err(PdfError::Consistency(format!(
            "/Filter is neither a name nor an array: {other:?}"
        ))),
    }
}

fn parms_list(dict: &Dictionary, count: usize) -> Vec<Option<Dictionary>> {
    let mut out = vec![None; count];
    match dict.get("DecodeParms") {
        Some(Object::Dictionary(d)) => {
            if let Some(slot) = out.first_mut() {
                *slot = Some(d.clone());
            }
        }
        Some(Object::Array(items)) => {
            for (slot, item) in out.iter_mut().zip(items) {
                if let Object::Dictionary(d) = item {
                    *slot = Some(d.clone());
                }
            }
        }
        _ => {}
    }
    out
}

fn flate_decode(data: &[u8], parm: Option<Dictionary>) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(|e| {
        PdfError::stream_format(0, format!("invalid flate data: {e}"))
    })?;

    let Some(parm) = parm else { return Ok(out) };
    let predictor = parm
        .get("Predictor")
        .and_then(Object::as_integer)
        .unwrap_or(1);
    match predictor {
        1 => Ok(out),
        p if p >= 10 => {
            let columns = parm.get("Columns").and_then(Object::as_integer).unwrap_or(1) as usize;
            let colors = parm.get("Colors").and_then(Object::as_integer).unwrap_or(1) as usize;
            let bits = parm
                .get("BitsPerComponent")
                .and_then(Object::as_integer)
                .unwrap_or(8) as usize;
            let bpp = (colors * bits).div_ceil(8);
            let row_len = (columns * colors * bits).div_ceil(8);
            undo_png_prediction(&out, row_len, bpp)
        }
        other => Err(PdfError::UnsupportedOperation(format!(
            "flate predictor {other}"
        ))),
    }
}

fn undo_png_prediction(data: &[u8], row_len: usize, bpp: usize) -> Result<Vec<u8>> {
    if row_len == 0 || data.len() % (row_len + 1) != 0 {
        return Err(PdfError::stream_format(
            0,
            "predicted data is not a whole number of rows".to_string(),
        ));
    }
    let mut out = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_len];
    for chunk in data.chunks_exact(row_len + 1) {
        let tag = chunk[0];
        let mut row = chunk[1..].to_vec();
        match tag {
            0 => {}
            1 => {
                for i in bpp..row_len {
                    row[i] = row[i].wrapping_add(row[i - bpp]);
                }
            }
            2 => {
                for i in 0..row_len {
                    row[i] = row[i].wrapping_add(prev[i]);
                }
            }
            3 => {
                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                    let up = prev[i] as u16;
                    row[i] = row[i].wrapping_add(((left + up) / 2) as u8);
                }
            }
            4 => {
                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    let up = prev[i];
                    let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
                    row[i] = row[i].wrapping_add(paeth(left, up, up_left));
                }
            }
            other => {
                return Err(PdfError::stream_format(
                    0,
                    format!("unknown PNG predictor tag {other}"),
                ))
            }
        }
        out.extend_from_slice(&row);
        prev = row;
    }
    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Name;

    fn flate_dict() -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::name("FlateDecode"));
        dict
    }

    #[test]
    fn test_no_filter_is_identity() {
        assert_eq!(decode(&Dictionary::new(), b"raw").unwrap(), b"raw");
    }

    #[test]
    fn test_flate_round_trip() {
        let plain = b"0 0 612 792 re f".repeat(8);
        let packed = flate_encode(&plain);
        assert!(packed.len() < plain.len());
        assert_eq!(decode(&flate_dict(), &packed).unwrap(), plain);
    }

    #[test]
    fn test_filter_chain_array() {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::Array(vec![Object::name("FlateDecode")]));
        let packed = flate_encode(b"chained");
        assert_eq!(decode(&dict, &packed).unwrap(), b"chained");
    }

    #[test]
    fn test_unknown_filter() {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::Name(Name::from("JBIG2Decode")));
        let err = decode(&dict, b"").unwrap_err();
        assert!(matches!(err, PdfError::UnsupportedFilter(name) if name == "JBIG2Decode"));
    }

    #[test]
    fn test_corrupt_flate_data() {
        let err = decode(&flate_dict(), b"not zlib").unwrap_err();
        assert!(matches!(err, PdfError::StreamFormat { .. }));
    }

    #[test]
    fn test_png_up_predictor() {
        // two rows of four bytes, predictor tag 2 (Up)
        let mut predicted = vec![2, 10, 20, 30, 40];
        predicted.extend_from_slice(&[2, 1, 1, 1, 1]);
        let packed = flate_encode(&predicted);
        let mut dict = flate_dict();
        let mut parm = Dictionary::new();
        parm.set("Predictor", 15i64);
        parm.set("Columns", 4i64);
        dict.set("DecodeParms", parm);
        let out = decode(&dict, &packed).unwrap();
        assert_eq!(out, vec![10, 20, 30, 40, 11, 21, 31, 41]);
    }
}
