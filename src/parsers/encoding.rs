//! Character-encoding detection for text-like inputs.
//!
//! Order of evidence: byte-order mark, a UTF-16 NUL pattern, valid UTF-8,
//! then Windows-1252 for remaining 8-bit text. Input that fits none of
//! these is decoded as lossy UTF-8.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

const UTF16_PROBE_BYTES: usize = 512;

/// Decoded text plus the name of the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static str,
}

pub fn detect_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Some(encoding);
    }
    if let Some(encoding) = sniff_utf16(bytes) {
        return Some(encoding);
    }
    if std::str::from_utf8(bytes).is_ok() {
        return Some(UTF_8);
    }
    if bytes.contains(&0) {
        return None;
    }
    Some(WINDOWS_1252)
}

/// Decode `bytes`, stripping any byte-order mark.
pub fn decode_text(bytes: &[u8]) -> Decoded {
    let encoding = detect_encoding(bytes).unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = used.name(), "malformed sequences replaced while decoding");
    }
    Decoded {
        text: text.into_owned(),
        encoding: used.name(),
    }
}

/// BOM-less UTF-16 shows up as ASCII text with every other byte zero.
fn sniff_utf16(bytes: &[u8]) -> Option<&'static Encoding> {
    let probe = &bytes[..bytes.len().min(UTF16_PROBE_BYTES)];
    let pairs = probe.len() / 2;
    if pairs < 2 {
        return None;
    }
    let even_zeros = probe.iter().step_by(2).filter(|b| **b == 0).count();
    let odd_zeros = probe.iter().skip(1).step_by(2).filter(|b| **b == 0).count();
    let mostly = |n: usize| n * 10 >= pairs * 4;
    let rarely = |n: usize| n * 20 <= pairs;

    if mostly(odd_zeros) && rarely(even_zeros) {
        Some(UTF_16LE)
    } else if mostly(even_zeros) && rarely(odd_zeros) {
        Some(UTF_16BE)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn plain_utf8() {
        let decoded = decode_text("Age Range,Count\n25-34,3\n".as_bytes());
        assert_eq!(decoded.encoding, "UTF-8");
        assert!(decoded.text.starts_with("Age Range"));
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Insight,Insight Value");
        let decoded = decode_text(&bytes);
        assert_eq!(decoded.encoding, "UTF-8");
        assert_eq!(decoded.text, "Insight,Insight Value");
    }

    #[test]
    fn utf16_with_and_without_bom() {
        let mut with_bom = vec![0xFF, 0xFE];
        with_bom.extend(utf16le("Gender,Count"));
        let decoded = decode_text(&with_bom);
        assert_eq!(decoded.encoding, "UTF-16LE");
        assert_eq!(decoded.text, "Gender,Count");

        let decoded = decode_text(&utf16le("Gender,Count"));
        assert_eq!(decoded.encoding, "UTF-16LE");
        assert_eq!(decoded.text, "Gender,Count");
    }

    #[test]
    fn latin1_bytes_fall_back_to_windows_1252() {
        let decoded = decode_text(b"caf\xe9 visitors");
        assert_eq!(decoded.encoding, "windows-1252");
        assert_eq!(decoded.text, "café visitors");
    }

    #[test]
    fn binary_noise_is_undecidable() {
        assert_eq!(detect_encoding(&[0x00, 0xFF, 0x13, 0x00, 0x00, 0x9A, 0xC3]), None);
        assert_eq!(decode_text(&[0x00, 0xFF, 0x13]).encoding, "UTF-8");
    }
}
