//! Byte-to-text decoding with a fallback chain that never fails

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Bytes with no character assigned in Windows-1252
const WINDOWS_1252_UNASSIGNED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Text decoded from raw input together with the charset that produced it
#[derive(Debug, Clone)]
pub struct DecodedText {
    /// Decoded text, byte-order mark removed
    pub text: String,
    /// Encoding that was used
    pub encoding: &'static Encoding,
    /// Whether undecodable bytes were replaced with U+FFFD
    pub lossy: bool,
}

/// Decode `bytes` trying, in order: a BOM-declared encoding, strict UTF-8,
/// Windows-1252 and finally lossy UTF-8.
///
/// Windows-1252 is rejected when the input holds one of its five
/// unassigned bytes, which leaves such files to the lossy step.
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let body = &bytes[bom_len..];
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) {
            return DecodedText {
                text: text.into_owned(),
                encoding,
                lossy: false,
            };
        }
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: UTF_8,
            lossy: false,
        };
    }

    if !bytes.iter().any(|b| WINDOWS_1252_UNASSIGNED.contains(b)) {
        let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
        return DecodedText {
            text: text.into_owned(),
            encoding: WINDOWS_1252,
            lossy: false,
        };
    }

    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding: UTF_8,
        lossy: had_errors,
    }
}

/// Lossy decode used for dialect sniffing, where a truncated multi-byte
/// sequence at the end of a sample must not change the charset guess.
pub fn decode_sample(bytes: &[u8]) -> String {
    let (text, _) = UTF_8.decode_with_bom_removal(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_utf8() {
        let decoded = decode_text("città;prezzo\n".as_bytes());
        assert_eq!(decoded.text, "città;prezzo\n");
        assert_eq!(decoded.encoding, UTF_8);
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let decoded = decode_text(b"\xEF\xBB\xBFA;B\n");
        assert_eq!(decoded.text, "A;B\n");
        assert_eq!(decoded.encoding, UTF_8);
    }

    #[test]
    fn test_decode_falls_back_to_windows_1252() {
        // "città" with à encoded as a single Latin-1 byte
        let decoded = decode_text(b"citt\xE0;\x80 5\n");
        assert_eq!(decoded.text, "città;€ 5\n");
        assert_eq!(decoded.encoding, WINDOWS_1252);
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_decode_unassigned_byte_is_lossy() {
        // 0x81 is neither valid UTF-8 here nor assigned in Windows-1252
        let decoded = decode_text(b"A;\x81B\n");
        assert_eq!(decoded.text, "A;\u{FFFD}B\n");
        assert_eq!(decoded.encoding, UTF_8);
        assert!(decoded.lossy);
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let decoded = decode_text(b"\xFF\xFEA\x00;\x00B\x00");
        assert_eq!(decoded.text, "A;B");
        assert_eq!(decoded.encoding.name(), "UTF-16LE");
    }

    #[test]
    fn test_decode_sample_tolerates_truncation() {
        let mut bytes = "prezzo;città".as_bytes().to_vec();
        bytes.pop();
        let text = decode_sample(&bytes);
        assert!(text.starts_with("prezzo;citt"));
    }
}
