//! Serializable client configuration.
//!
//! `ClientConfig` is the form a client takes in an application's config file;
//! `ClientBuilder::from_config` validates it and turns it into a builder that
//! can still be customized in code (observer, extra layers, transport).

use std::collections::BTreeMap;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::ClientBuilder;
use crate::codec::{Codecs, JsonDecoder, JsonEncoder};
use crate::error::ConstructionError;
use crate::transport::UreqTransport;

/// Default User-Agent sent by clients built from a config.
pub const DEFAULT_USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub base_url: String,

    /// Headers added to every request, replacing same-named headers set by
    /// the request itself.
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,

    /// `None` sends `DEFAULT_USER_AGENT`.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// End-to-end timeout for one exchange, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(default)]
    pub pretty_json: bool,

    #[serde(default)]
    pub empty_body_as_null: bool,

    /// When set, every exchange is logged; bodies shorter than this many bytes
    /// are included.
    #[serde(default)]
    pub log_exchanges: Option<usize>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: BTreeMap::new(),
            user_agent: None,
            timeout_ms: None,
            pretty_json: false,
            empty_body_as_null: false,
            log_exchanges: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn codecs(&self) -> Codecs {
        Codecs {
            json_encoder: JsonEncoder {
                pretty: self.pretty_json,
            },
            json_decoder: JsonDecoder {
                empty_as_null: self.empty_body_as_null,
            },
        }
    }
}

impl ClientBuilder {
    /// Start a builder from `config`, validating its URL and headers.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConstructionError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| ConstructionError::InvalidUrl {
            url: config.base_url.clone(),
            source,
        })?;

        let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let mut builder = ClientBuilder::new(base_url)
            .codecs(config.codecs())
            .default_header(USER_AGENT, header_value("user-agent", user_agent)?);

        for (name, value) in &config.default_headers {
            let header_name =
                HeaderName::try_from(name.as_str()).map_err(|source| ConstructionError::InvalidHeaderName {
                    name: name.clone(),
                    source,
                })?;
            builder = builder.default_header(header_name, header_value(name, value)?);
        }

        if let Some(timeout) = config.timeout() {
            builder = builder.transport(UreqTransport::with_timeout(timeout));
        }
        if let Some(max_body_len) = config.log_exchanges {
            builder = builder.layer(move |layer| layer.print_exchanges(max_body_len));
        }
        Ok(builder)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ConstructionError> {
    HeaderValue::from_str(value).map_err(|source| ConstructionError::InvalidHeaderValue {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"base_url":"https://api.test.com/v1"}"#).unwrap();
        assert_eq!(config, ClientConfig::new("https://api.test.com/v1"));
        assert_eq!(config.codecs(), Codecs::default());
        assert!(config.timeout().is_none());

        let client = ClientBuilder::from_config(&config).unwrap().build();
        assert_eq!(client.base_url().as_str(), "https://api.test.com/v1");
        assert_eq!(client.default_headers().get(USER_AGENT).unwrap(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn full_config_maps_every_field() {
        let config: ClientConfig = serde_json::from_str(
            r#"{
                "base_url": "https://api.test.com",
                "default_headers": { "x-api-key": "secret" },
                "user_agent": "tests/1.0",
                "timeout_ms": 1500,
                "pretty_json": true,
                "empty_body_as_null": true,
                "log_exchanges": 512
            }"#,
        )
        .unwrap();

        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
        let client = ClientBuilder::from_config(&config).unwrap().build();
        assert_eq!(client.default_headers().get("x-api-key").unwrap(), "secret");
        assert_eq!(client.default_headers().get(USER_AGENT).unwrap(), "tests/1.0");
        assert!(client.codecs().json_encoder.pretty);
        assert!(client.codecs().json_decoder.empty_as_null);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<ClientConfig>(r#"{"base_url":"https://a.b","retries":3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_values_are_construction_errors() {
        let err = ClientBuilder::from_config(&ClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidUrl { .. }));

        let mut config = ClientConfig::new("https://a.b");
        config.default_headers.insert("bad header".to_string(), "x".to_string());
        let err = ClientBuilder::from_config(&config).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidHeaderName { ref name, .. } if name == "bad header"));

        let mut config = ClientConfig::new("https://a.b");
        config.user_agent = Some("line\nbreak".to_string());
        let err = ClientBuilder::from_config(&config).unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidHeaderValue { .. }));
    }
}
