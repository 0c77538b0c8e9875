use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::{Decode, Json, Raw, StatusOnly, Text, TextResponse};
use crate::codec::Codecs;
use crate::error::DecodingError;
use crate::http::Envelope;
use crate::request::Request;

impl<R> Decode<R> for Json
where
    R: Request,
    R::Response: DeserializeOwned,
{
    fn decode(_request: &R, envelope: Envelope, codecs: &Codecs) -> Result<R::Response, DecodingError> {
        match codecs.json_decoder.decode(envelope.body()) {
            Ok(response) => Ok(response),
            Err(err) => Err(DecodingError::json(envelope, err)),
        }
    }
}

impl<R> Decode<R> for Text
where
    R: Request<Response = String> + TextResponse,
{
    fn decode(request: &R, envelope: Envelope, _codecs: &Codecs) -> Result<R::Response, DecodingError> {
        let charset = request.response_charset();
        match charset.decode(envelope.body()) {
            Ok(text) => Ok(text),
            Err(offset) => Err(DecodingError::text(envelope, charset, offset)),
        }
    }
}

impl<R> Decode<R> for Raw
where
    R: Request<Response = Bytes>,
{
    fn decode(_request: &R, envelope: Envelope, _codecs: &Codecs) -> Result<R::Response, DecodingError> {
        Ok(envelope.into_body())
    }
}

impl<R> Decode<R> for StatusOnly
where
    R: Request<Response = ()>,
{
    fn decode(_request: &R, _envelope: Envelope, _codecs: &Codecs) -> Result<R::Response, DecodingError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Charset, JsonDecoder};
    use crate::contract::Get;
    use crate::error::DecodingErrorKind;
    use crate::http::Metadata;
    use http::{HeaderMap, StatusCode, Version};
    use serde::Deserialize;
    use serde_json::error::Category;
    use url::Url;

    fn envelope(status: StatusCode, body: &[u8]) -> Envelope {
        let url = Url::parse("https://test.com/decode").unwrap();
        Envelope::new(
            body.to_vec(),
            Metadata::new(status, HeaderMap::new(), Version::HTTP_11, url),
        )
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        value: i32,
    }

    struct FetchReply;

    impl Request for FetchReply {
        type Response = Reply;
        type Encoding = Get;
        type Decoding = Json;
    }

    struct FetchMaybe;

    impl Request for FetchMaybe {
        type Response = Option<Reply>;
        type Encoding = Get;
        type Decoding = Json;
    }

    struct FetchText(Charset);

    impl Request for FetchText {
        type Response = String;
        type Encoding = Get;
        type Decoding = Text;
    }

    impl TextResponse for FetchText {
        fn response_charset(&self) -> Charset {
            self.0
        }
    }

    struct FetchBytes;

    impl Request for FetchBytes {
        type Response = Bytes;
        type Encoding = Get;
        type Decoding = Raw;
    }

    struct Delete;

    impl Request for Delete {
        type Response = ();
        type Encoding = Get;
        type Decoding = StatusOnly;
    }

    #[test]
    fn json_decodes_declared_type() {
        let reply = FetchReply
            .decode(envelope(StatusCode::OK, br#"{"value":5}"#), &Codecs::default())
            .unwrap();
        assert_eq!(reply, Reply { value: 5 });
    }

    #[test]
    fn json_shape_mismatch_is_an_error_not_a_default() {
        let err = FetchReply
            .decode(envelope(StatusCode::OK, b"{\n\"value\": \"five\"}"), &Codecs::default())
            .unwrap_err();
        assert_eq!(err.kind(), DecodingErrorKind::Json(Category::Data));
        assert_eq!(err.location().map(|l| l.line), Some(2));
        assert_eq!(err.envelope().body().as_ref(), b"{\n\"value\": \"five\"}");
    }

    #[test]
    fn json_empty_body_follows_decoder_setting() {
        let strict = Codecs::default();
        let err = FetchMaybe
            .decode(envelope(StatusCode::OK, b""), &strict)
            .unwrap_err();
        assert_eq!(err.kind(), DecodingErrorKind::Json(Category::Eof));

        let lenient = Codecs {
            json_decoder: JsonDecoder { empty_as_null: true },
            ..Codecs::default()
        };
        assert_eq!(FetchMaybe.decode(envelope(StatusCode::OK, b""), &lenient).unwrap(), None);
    }

    #[test]
    fn text_decodes_in_response_charset() {
        let latin1 = FetchText(Charset::Latin1)
            .decode(envelope(StatusCode::OK, b"caf\xe9"), &Codecs::default())
            .unwrap();
        assert_eq!(latin1, "café");

        let err = FetchText(Charset::Utf8)
            .decode(envelope(StatusCode::OK, b"caf\xe9"), &Codecs::default())
            .unwrap_err();
        assert_eq!(err.kind(), DecodingErrorKind::Text { charset: Charset::Utf8 });
    }

    #[test]
    fn raw_returns_body_unchanged() {
        let body = FetchBytes
            .decode(envelope(StatusCode::OK, &[1, 2, 255]), &Codecs::default())
            .unwrap();
        assert_eq!(body.as_ref(), &[1, 2, 255]);
    }

    #[test]
    fn status_only_ignores_any_body() {
        let bodies: [&[u8]; 3] = [b"", b"not json at all", &[0xff, 0x00]];
        for body in bodies {
            Delete
                .decode(envelope(StatusCode::NO_CONTENT, body), &Codecs::default())
                .unwrap();
        }
    }
}
