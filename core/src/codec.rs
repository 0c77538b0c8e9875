//! Codec settings shared by the encode and decode contracts.
//!
//! A `Client` carries one `Codecs` value; a request can replace it for its own
//! round trip through `Request::codec_override`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::EncodingError;

/// How request bodies are written as JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonEncoder {
    /// Indent output instead of writing it compactly.
    pub pretty: bool,
}

impl JsonEncoder {
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, serde_json::Error> {
        if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
    }
}

/// How response bodies are read as JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonDecoder {
    /// Read an empty (or all-whitespace) body as `null`, so `Option<T>`
    /// responses decode to `None` instead of failing.
    pub empty_as_null: bool,
}

impl JsonDecoder {
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, serde_json::Error> {
        if self.empty_as_null && bytes.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_slice(b"null");
        }
        serde_json::from_slice(bytes)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codecs {
    pub json_encoder: JsonEncoder,
    pub json_decoder: JsonDecoder,
}

/// Character sets supported by the text contracts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Charset {
    #[default]
    Utf8,
    Ascii,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

impl Charset {
    /// The IANA name used in `charset=` parameters.
    pub fn label(self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Ascii => "us-ascii",
            Charset::Latin1 => "iso-8859-1",
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodingError> {
        let limit = match self {
            Charset::Utf8 => return Ok(text.as_bytes().to_vec()),
            Charset::Ascii => 0x7f,
            Charset::Latin1 => 0xff,
        };
        text.char_indices()
            .map(|(position, character)| {
                u8::try_from(u32::from(character))
                    .ok()
                    .filter(|&byte| u32::from(byte) <= limit)
                    .ok_or(EncodingError::Text {
                        charset: self,
                        character,
                        position,
                    })
            })
            .collect()
    }

    /// Decode `bytes`, returning the offset of the first invalid byte on failure.
    pub(crate) fn decode(self, bytes: &[u8]) -> Result<String, usize> {
        match self {
            Charset::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|err| err.valid_up_to()),
            Charset::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(offset),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
            Charset::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_encoder_compact_and_pretty() {
        let value = json!({ "a": 1 });
        assert_eq!(JsonEncoder::default().encode(&value).unwrap(), br#"{"a":1}"#);
        let pretty = JsonEncoder { pretty: true }.encode(&value).unwrap();
        assert_eq!(String::from_utf8(pretty).unwrap(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn json_decoder_empty_body() {
        let strict = JsonDecoder::default();
        assert!(strict.decode::<Option<u32>>(b"").is_err());

        let lenient = JsonDecoder { empty_as_null: true };
        assert_eq!(lenient.decode::<Option<u32>>(b"  \n").unwrap(), None);
        assert_eq!(lenient.decode::<Option<u32>>(b"7").unwrap(), Some(7));
    }

    #[test]
    fn charset_encode_rejects_unmappable_characters() {
        assert_eq!(Charset::Utf8.encode("héllo").unwrap(), "héllo".as_bytes());
        assert_eq!(Charset::Latin1.encode("héllo").unwrap(), b"h\xe9llo");

        let err = Charset::Ascii.encode("héllo").unwrap_err();
        assert!(matches!(
            err,
            EncodingError::Text { character: 'é', position: 1, charset: Charset::Ascii }
        ));
        assert!(Charset::Latin1.encode("snow ☃").is_err());
    }

    #[test]
    fn charset_decode_reports_offset() {
        assert_eq!(Charset::Utf8.decode(b"ab\xffc"), Err(2));
        assert_eq!(Charset::Ascii.decode(b"abc\x80"), Err(3));
        assert_eq!(Charset::Latin1.decode(b"caf\xe9").unwrap(), "café");
    }

    #[test]
    fn charset_labels_deserialize_from_config() {
        let charset: Charset = serde_json::from_str(r#""latin1""#).unwrap();
        assert_eq!(charset, Charset::Latin1);
        assert_eq!(Charset::Utf8.to_string(), "utf-8");
    }
}
