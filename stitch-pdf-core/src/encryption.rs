//! RC4 stream cipher primitive.
//!
//! The same transform serves encryption and decryption. Key derivation and
//! the standard security handler live outside this crate.

/// Applies RC4 with `key` over `data`. An empty key is the identity.
pub fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    if key.is_empty() {
        return data.to_vec();
    }
    let mut s: [u8; 256] = [0; 256];
    for (i, slot) in s.iter_mut().enumerate() {
        *slot = i as u8;
    }
    let mut j: u8 = 0;
    for i in 0..256 {
        j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
        s.swap(i, j as usize);
    }

    let mut out = Vec::with_capacity(data.len());
    let mut i: u8 = 0;
    let mut j: u8 = 0;
    for &b in data {
        i = i.wrapping_add(1);
        j = j.wrapping_add(s[i as usize]);
        s.swap(i as usize, j as usize);
        let k = s[(s[i as usize].wrapping_add(s[j as usize])) as usize];
        out.push(b ^ k);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rc4_symmetric() {
        let key = b"document key";
        let plain = b"stream payload bytes";
        let cipher = rc4(key, plain);
        assert_ne!(cipher, plain);
        assert_eq!(rc4(key, &cipher), plain);
    }

    #[test]
    fn test_rc4_known_vector() {
        // RFC 6229 style vector: key "Key", plaintext "Plaintext"
        let cipher = rc4(b"Key", b"Plaintext");
        assert_eq!(
            cipher,
            vec![0xbb, 0xf3, 0x16, 0xe8, 0xd9, 0x40, 0xaf, 0x0a, 0xd3]
        );
    }

    #[test]
    fn test_empty_key_is_identity() {
        assert_eq!(rc4(b"", b"abc"), b"abc");
    }
}
