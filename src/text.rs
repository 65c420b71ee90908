//! Text encodings and byte-bounded truncation

use std::io;

/// Supported file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
}

impl Encoding {
    /// Parse an encoding name; unknown names fall back to UTF-8
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_lowercase()).as_deref() {
            Some("latin1") | Some("latin-1") | Some("binary") | Some("iso-8859-1") => Encoding::Latin1,
            _ => Encoding::Utf8,
        }
    }

    /// Decode raw file bytes
    pub fn decode(self, bytes: Vec<u8>) -> io::Result<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Encoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }

    /// Encode text for writing; characters outside Latin-1 become `?`
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Latin1 => text.chars().map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?')).collect(),
        }
    }
}

/// Cut `text` to at most `max_bytes`, backing off to a char boundary
pub fn truncate_to_boundary(text: &mut String, max_bytes: usize) {
    if text.len() <= max_bytes {
        return;
    }
    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Encoding::from_name(None), Encoding::Utf8);
        assert_eq!(Encoding::from_name(Some("utf-8")), Encoding::Utf8);
        assert_eq!(Encoding::from_name(Some("LATIN1")), Encoding::Latin1);
        assert_eq!(Encoding::from_name(Some("klingon")), Encoding::Utf8);
    }

    #[test]
    fn test_latin1_round_trips_high_bytes() {
        let bytes = vec![0x63, 0x61, 0x66, 0xe9];
        let text = Encoding::Latin1.decode(bytes.clone()).unwrap();
        assert_eq!(text, "café");
        assert_eq!(Encoding::Latin1.encode(&text), bytes);
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let err = Encoding::Utf8.decode(vec![0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let mut s = "aé".to_string(); // 'é' is two bytes
        truncate_to_boundary(&mut s, 2);
        assert_eq!(s, "a");

        let mut s = "hello".to_string();
        truncate_to_boundary(&mut s, 10);
        assert_eq!(s, "hello");
    }
}
