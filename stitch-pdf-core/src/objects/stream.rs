//! PDF stream object: dictionary plus payload.
//!
//! Whether a stream is encoded is derived from its own `/Filter` entry.
//! The decoded payload is computed once on first access and memoized; after
//! that the filter chain and the payload are frozen.

use crate::error::{PdfError, Result};
use crate::filters;
use crate::objects::{Dictionary, Name, Object};

#[derive(Debug, Clone)]
pub struct StreamObject {
    dict: Dictionary,
    data: Vec<u8>,
    decoded: Option<Vec<u8>>,
}

impl PartialEq for StreamObject {
    fn eq(&self, other: &Self) -> bool {
        // the memo is derived state
        self.dict == other.dict && self.data == other.data
    }
}

impl StreamObject {
    /// A stream as read from input. `data` is the raw payload, possibly
    /// still filtered. The dictionary must not carry `/Length`; it is
    /// synthesized at write time.
    pub fn new(dict: Dictionary, data: Vec<u8>) -> Self {
        StreamObject {
            dict,
            data,
            decoded: None,
        }
    }

    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    /// Unchecked mutable access for rewriting references during import.
    /// [`StreamObject::insert`] is the guarded path.
    pub(crate) fn dict_mut(&mut self) -> &mut Dictionary {
        &mut self.dict
    }

    /// Updates a dictionary entry. Once the decoded payload has been
    /// materialized the filter chain is frozen.
    pub fn insert(&mut self, key: impl Into<Name>, value: impl Into<Object>) -> Result<()> {
        let key = key.into();
        if self.decoded.is_some() && (key.as_str() == "Filter" || key.as_str() == "DecodeParms") {
            return Err(PdfError::UnsupportedOperation(
                "cannot change the filter chain of a decoded stream".to_string(),
            ));
        }
        self.dict.set(key, value);
        Ok(())
    }

    pub fn is_encoded(&self) -> bool {
        self.dict.contains_key("Filter")
    }

    /// The payload exactly as stored, without applying filters.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// The decoded payload. Runs the filter chain on first call and caches
    /// the result.
    pub fn data(&mut self) -> Result<&[u8]> {
        if !self.is_encoded() {
            return Ok(&self.data);
        }
        if self.decoded.is_none() {
            let plain = filters::decode(&self.dict, &self.data)?;
            self.decoded = Some(plain);
        }
        Ok(self.decoded.as_deref().unwrap_or_default())
    }

    /// Replaces the payload of a decoded stream. Refused for encoded
    /// streams, since the replacement bytes would not match the filter
    /// chain.
    pub fn set_data(&mut self, data: Vec<u8>) -> Result<()> {
        if self.is_encoded() {
            return Err(PdfError::UnsupportedOperation(
                "cannot set data on an encoded stream".to_string(),
            ));
        }
        self.data = data;
        Ok(())
    }

    /// A copy of this stream with its payload deflate-compressed and
    /// `/FlateDecode` prepended to the filter chain.
    pub fn flate_encode(&self) -> StreamObject {
        let mut dict = self.dict.clone();
        let flate = Object::name("FlateDecode");
        let filter = match dict.remove("Filter") {
            Some(Object::Array(mut existing)) => {
                existing.insert(0, flate);
                Object::Array(existing)
            }
            Some(single) => Object::Array(vec![flate, single]),
            None => flate,
        };
        dict.set("Filter", filter);
        StreamObject {
            dict,
            data: filters::flate_encode(&self.data),
            decoded: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_stream(data: &[u8]) -> StreamObject {
        StreamObject::new(Dictionary::new(), data.to_vec())
    }

    #[test]
    fn test_plain_data_passthrough() {
        let mut s = plain_stream(b"q BT ET Q");
        assert!(!s.is_encoded());
        assert_eq!(s.data().unwrap(), b"q BT ET Q");
    }

    #[test]
    fn test_set_data_on_plain_stream() {
        let mut s = plain_stream(b"old");
        s.set_data(b"new".to_vec()).unwrap();
        assert_eq!(s.data().unwrap(), b"new");
    }

    #[test]
    fn test_set_data_on_encoded_stream_rejected() {
        let mut s = plain_stream(b"anything").flate_encode();
        assert!(s.is_encoded());
        let err = s.set_data(b"replacement".to_vec()).unwrap_err();
        assert!(matches!(err, PdfError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_flate_round_trip() {
        let mut encoded = plain_stream(b"stream payload stream payload").flate_encode();
        assert_ne!(encoded.raw_data(), b"stream payload stream payload");
        assert_eq!(encoded.data().unwrap(), b"stream payload stream payload");
        // second access hits the memo
        assert_eq!(encoded.data().unwrap(), b"stream payload stream payload");
    }

    #[test]
    fn test_flate_encode_prepends_to_existing_chain() {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::name("ASCIIHexDecode"));
        let s = StreamObject::new(dict, b"41".to_vec()).flate_encode();
        let filters = s.dict().get("Filter").and_then(Object::as_array).unwrap();
        assert_eq!(filters[0], Object::name("FlateDecode"));
        assert_eq!(filters[1], Object::name("ASCIIHexDecode"));
    }

    #[test]
    fn test_filter_frozen_after_decode() {
        let mut s = plain_stream(b"payload").flate_encode();
        s.data().unwrap();
        let err = s.insert("Filter", Object::Null).unwrap_err();
        assert!(matches!(err, PdfError::UnsupportedOperation(_)));
        // unrelated keys stay writable
        s.insert("Subtype", Object::name("Form")).unwrap();
    }
}
