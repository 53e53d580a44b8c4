use crate::core::error::SourceError;
use crate::core::normalize::{NativeQuotes, SourceMeta, normalize};
use crate::core::rates::{DataQuality, RateSet, RateSource};
use crate::providers::util::{fetch_text, http_client, published_at, recognized_rates};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

pub const ID: &str = "fixer";

/// Base currency requested from the API.
const QUOTE_BASE: &str = "EUR";

const RECOGNIZED: &[&str] = &["USD", "EUR", "GBP", "CHF", "JPY", "CAD", "AUD"];

/// Fixer-style API: EUR-based midpoints, re-based through the domestic rate.
pub struct FixerSource {
    base_url: String,
    timeout: Duration,
    access_key: Option<String>,
    domestic: String,
    spread: f64,
}

impl FixerSource {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        access_key: Option<&str>,
        domestic: &str,
        spread: f64,
    ) -> Self {
        FixerSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            access_key: access_key.map(str::to_string),
            domestic: domestic.to_uppercase(),
            spread,
        }
    }

    fn url(&self) -> String {
        match &self.access_key {
            Some(key) => format!(
                "{}/latest?base={}&access_key={}",
                self.base_url, QUOTE_BASE, key
            ),
            None => format!("{}/latest?base={}", self.base_url, QUOTE_BASE),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FixerError {
    code: Option<i64>,
    #[serde(rename = "type")]
    kind: Option<String>,
    info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FixerResponse {
    success: Option<bool>,
    base: Option<String>,
    date: Option<String>,
    timestamp: Option<i64>,
    #[serde(default)]
    rates: HashMap<String, serde_json::Value>,
    error: Option<FixerError>,
}

#[async_trait]
impl RateSource for FixerSource {
    fn id(&self) -> &str {
        ID
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(name = "FixerFetch", skip(self))]
    async fn fetch(&self) -> Result<RateSet, SourceError> {
        let client = http_client(self.timeout)?;
        let text = fetch_text(&client, &self.url()).await?;

        let data: FixerResponse = serde_json::from_str(&text).map_err(|e| {
            SourceError::ParseError(format!("Failed to parse Fixer response: {e}"))
        })?;

        if data.success == Some(false) {
            let detail = data.error.map_or_else(
                || "unknown error".to_string(),
                |e| {
                    format!(
                        "code {}: {}",
                        e.code.unwrap_or_default(),
                        e.info.or(e.kind).unwrap_or_default()
                    )
                },
            );
            return Err(SourceError::UpstreamUnavailable(format!(
                "Fixer rejected request ({detail})"
            )));
        }

        let rates = recognized_rates(data.rates, RECOGNIZED, &self.domestic);

        if rates.is_empty() {
            return Err(SourceError::EmptyResult("Fixer.io".to_string()));
        }

        let timestamp = published_at(data.timestamp, data.date.as_deref());

        let meta = SourceMeta {
            source: "Fixer.io".to_string(),
            quality: DataQuality::Verified,
            reliability: "90%".to_string(),
            timestamp,
            domestic: self.domestic.clone(),
            spread: self.spread,
        };
        let base = data.base.unwrap_or_else(|| QUOTE_BASE.to_string());
        normalize(NativeQuotes::ForeignBase { base, rates }, &meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("base", "EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn source_for(mock_server: &MockServer) -> FixerSource {
        FixerSource::new(&mock_server.uri(), Duration::from_secs(5), None, "TRY", 0.002)
    }

    #[tokio::test]
    async fn test_successful_fixer_fetch() {
        let mock_response = r#"{
            "success": true,
            "timestamp": 1792195201,
            "base": "EUR",
            "date": "2026-10-17",
            "rates": {"USD": 1.08, "GBP": 0.85, "TRY": 36.72, "SEK": 11.2}
        }"#;
        let mock_server = create_mock_server(mock_response).await;

        let rates = source_for(&mock_server).fetch().await.unwrap();

        assert_eq!(rates.source, "Fixer.io");
        assert_eq!(rates.reliability, "90%");
        assert!((rates.get("USD").unwrap().rate - 34.0).abs() < 1e-9);
        assert!((rates.get("GBP").unwrap().rate - 43.2).abs() < 1e-9);
        assert!((rates.get("EUR").unwrap().rate - 36.72).abs() < 1e-9);
        assert!(rates.get("SEK").is_none());
        assert_eq!(rates.get("TRY").unwrap().rate, 1.0);
    }

    #[tokio::test]
    async fn test_access_key_is_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("access_key", "k3y"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"base": "EUR", "rates": {"USD": 1.1, "TRY": 37.4}}"#),
            )
            .mount(&mock_server)
            .await;

        let source =
            FixerSource::new(&mock_server.uri(), Duration::from_secs(5), Some("k3y"), "TRY", 0.0);
        let rates = source.fetch().await.unwrap();
        assert!((rates.get("USD").unwrap().rate - 34.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_upstream_failure_does_not_expose_access_key() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let source = FixerSource::new(
            &mock_server.uri(),
            Duration::from_secs(5),
            Some("S3CRET"),
            "TRY",
            0.002,
        );
        let err = source.fetch().await.unwrap_err();

        assert!(matches!(err, SourceError::UpstreamUnavailable(_)));
        assert!(err.to_string().contains("503"));
        assert!(!err.to_string().contains("S3CRET"), "{err}");
    }

    #[tokio::test]
    async fn test_fixer_rejected_request() {
        let mock_response = r#"{
            "success": false,
            "error": {"code": 101, "type": "missing_access_key", "info": "You have not supplied an API Access Key."}
        }"#;
        let mock_server = create_mock_server(mock_response).await;

        let result = source_for(&mock_server).fetch().await;
        assert!(
            matches!(result, Err(SourceError::UpstreamUnavailable(msg)) if msg.contains("code 101: You have not supplied"))
        );
    }

    #[tokio::test]
    async fn test_missing_domestic_reference() {
        let mock_server = create_mock_server(r#"{"base": "EUR", "rates": {"USD": 1.08}}"#).await;
        let result = source_for(&mock_server).fetch().await;
        assert!(matches!(result, Err(SourceError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_empty_rates() {
        let mock_server = create_mock_server(r#"{"success": true, "rates": {}}"#).await;
        let result = source_for(&mock_server).fetch().await;
        assert!(matches!(result, Err(SourceError::EmptyResult(_))));
    }
}
