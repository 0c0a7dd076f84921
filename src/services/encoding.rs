use std::fs;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// Encoding picked for a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSource {
    pub text: String,
    pub encoding: &'static str,
    pub had_bom: bool,
    pub had_errors: bool,
}

pub fn read_source(path: &Path) -> std::io::Result<DecodedSource> {
    let bytes = fs::read(path)?;
    Ok(decode_bytes(&bytes))
}

/// Byte-order marks win (Steam writes some loc files as UTF-16LE); otherwise
/// valid UTF-8 is taken as is and anything else goes through detection.
pub fn decode_bytes(bytes: &[u8]) -> DecodedSource {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return DecodedSource {
            text: text.into_owned(),
            encoding: encoding.name(),
            had_bom: true,
            had_errors,
        };
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedSource {
            text: text.to_string(),
            encoding: UTF_8.name(),
            had_bom: false,
            had_errors: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    tracing::debug!(encoding = encoding.name(), had_errors, "detected source encoding");

    DecodedSource {
        text: text.into_owned(),
        encoding: encoding.name(),
        had_bom: false,
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_utf8() {
        let d = decode_bytes("\"Tokens\" 胜利".as_bytes());
        assert_eq!(d.text, "\"Tokens\" 胜利");
        assert_eq!(d.encoding, "UTF-8");
        assert!(!d.had_bom);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("\"lang\"".as_bytes());
        let d = decode_bytes(&bytes);
        assert_eq!(d.text, "\"lang\"");
        assert!(d.had_bom);
    }

    #[test]
    fn utf16le_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "\"lang\"\n胜利".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let d = decode_bytes(&bytes);
        assert_eq!(d.encoding, "UTF-16LE");
        assert_eq!(d.text, "\"lang\"\n胜利");
        assert!(!d.had_errors);
    }

    #[test]
    fn legacy_bytes_fall_back_to_detection() {
        // "胜利" in GBK
        let (bytes, _, _) = encoding_rs::GBK.encode("\"Tokens\" 胜利 胜利 胜利");
        let d = decode_bytes(&bytes);
        assert!(!d.had_bom);
        assert_ne!(d.encoding, "UTF-8");
    }
}
