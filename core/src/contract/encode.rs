use std::borrow::Cow;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::Method;

use super::multipart;
use super::{Encode, Get, Json, JsonBody, Multipart, MultipartBody, Raw, RawBody, Text, TextBody};
use crate::codec::Codecs;
use crate::error::EncodingError;
use crate::http::HttpRequest;

impl<R> Encode<R> for Get {
    fn default_method() -> Method {
        Method::GET
    }

    fn encode(_request: &R, raw: &mut HttpRequest, _codecs: &Codecs) -> Result<(), EncodingError> {
        raw.body = None;
        raw.headers.remove(CONTENT_TYPE);
        Ok(())
    }
}

impl<R: JsonBody> Encode<R> for Json {
    fn content_type(_request: &R) -> Option<Cow<'static, str>> {
        Some(Cow::Borrowed("application/json"))
    }

    fn encode(request: &R, raw: &mut HttpRequest, codecs: &Codecs) -> Result<(), EncodingError> {
        let body = codecs
            .json_encoder
            .encode(request.body())
            .map_err(|source| EncodingError::Json {
                type_name: std::any::type_name::<R::Body>(),
                source,
            })?;
        raw.body = Some(Bytes::from(body));
        Ok(())
    }
}

impl<R: TextBody> Encode<R> for Text {
    fn content_type(request: &R) -> Option<Cow<'static, str>> {
        Some(Cow::Owned(format!("text/plain; charset={}", request.charset().label())))
    }

    fn encode(request: &R, raw: &mut HttpRequest, _codecs: &Codecs) -> Result<(), EncodingError> {
        let body = request.charset().encode(&request.text())?;
        raw.body = Some(Bytes::from(body));
        Ok(())
    }
}

impl<R: RawBody> Encode<R> for Raw {
    fn content_type(request: &R) -> Option<Cow<'static, str>> {
        request.raw_content_type()
    }

    fn encode(request: &R, raw: &mut HttpRequest, _codecs: &Codecs) -> Result<(), EncodingError> {
        raw.body = Some(request.raw_body());
        Ok(())
    }
}

impl<R: MultipartBody> Encode<R> for Multipart {
    fn encode(request: &R, raw: &mut HttpRequest, codecs: &Codecs) -> Result<(), EncodingError> {
        let boundary = multipart::boundary();
        let body = multipart::encode_form(&request.parts(), &boundary, codecs)?;
        let content_type = HeaderValue::try_from(format!("multipart/form-data; boundary={boundary}"))
            .map_err(|source| EncodingError::InvalidHeader {
                name: "content-type",
                source,
            })?;
        raw.headers.insert(CONTENT_TYPE, content_type);
        raw.body = Some(Bytes::from(body));
        Ok(())
    }
}
