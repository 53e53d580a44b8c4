use crate::core::error::SourceError;
use crate::core::normalize::{NativeQuotes, SourceMeta, normalize};
use crate::core::rates::{DataQuality, RateSet, RateSource};
use crate::providers::util::{fetch_text, http_client, published_at, recognized_rates};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

pub const ID: &str = "exchangerate_api";

const RECOGNIZED: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "SEK", "NOK", "DKK", "SAR", "KWD", "AED",
    "CNY", "RUB", "TRY", "INR", "BRL", "ZAR", "MXN", "KRW", "PLN",
];

/// Commercial JSON API publishing midpoints against a requested base.
///
/// Requests `/v4/latest/<domestic>`, so every value reads "1 domestic = x code"
/// and gets inverted during normalization.
pub struct ExchangeRateApiSource {
    base_url: String,
    timeout: Duration,
    domestic: String,
    spread: f64,
}

impl ExchangeRateApiSource {
    pub fn new(base_url: &str, timeout: Duration, domestic: &str, spread: f64) -> Self {
        ExchangeRateApiSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            domestic: domestic.to_uppercase(),
            spread,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    base: Option<String>,
    date: Option<String>,
    time_last_updated: Option<i64>,
    rates: HashMap<String, serde_json::Value>,
}

#[async_trait]
impl RateSource for ExchangeRateApiSource {
    fn id(&self) -> &str {
        ID
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    #[instrument(name = "ExchangeRateApiFetch", skip(self), fields(base = %self.domestic))]
    async fn fetch(&self) -> Result<RateSet, SourceError> {
        let url = format!("{}/v4/latest/{}", self.base_url, self.domestic);
        let client = http_client(self.timeout)?;
        let text = fetch_text(&client, &url).await?;

        let data: LatestResponse = serde_json::from_str(&text).map_err(|e| {
            SourceError::ParseError(format!("Failed to parse JSON response from {url}: {e}"))
        })?;

        let base = data.base.unwrap_or_else(|| self.domestic.clone());
        let rates = recognized_rates(data.rates, RECOGNIZED, &self.domestic);

        let timestamp = published_at(data.time_last_updated, data.date.as_deref());

        let meta = SourceMeta {
            source: "ExchangeRate-API (International)".to_string(),
            quality: DataQuality::Verified,
            reliability: "95%".to_string(),
            timestamp,
            domestic: self.domestic.clone(),
            spread: self.spread,
        };
        normalize(NativeQuotes::ForeignBase { base, rates }, &meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(body: &str, status_code: u16) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/latest/TRY"))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn source_for(mock_server: &MockServer) -> ExchangeRateApiSource {
        ExchangeRateApiSource::new(&mock_server.uri(), Duration::from_secs(5), "TRY", 0.002)
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_response = r#"{
            "provider": "https://www.exchangerate-api.com",
            "base": "TRY",
            "date": "2026-10-17",
            "time_last_updated": 1792195201,
            "rates": {
                "TRY": 1,
                "USD": 0.0294,
                "EUR": 0.027,
                "XAU": 0.0000071,
                "GBP": "n/a"
            }
        }"#;
        let mock_server = create_mock_server(mock_response, 200).await;

        let rates = source_for(&mock_server).fetch().await.unwrap();

        assert_eq!(rates.data_quality, DataQuality::Verified);
        assert_eq!(rates.reliability, "95%");
        assert_eq!(rates.timestamp.timestamp(), 1792195201);

        let usd = rates.get("USD").unwrap();
        assert!((usd.rate - 1.0 / 0.0294).abs() < 1e-9);
        assert!((usd.rate - 34.01).abs() < 0.01);
        assert!(usd.buying < usd.rate && usd.rate < usd.selling);

        assert!(rates.get("EUR").is_some());
        assert!(rates.get("XAU").is_none());
        assert!(rates.get("GBP").is_none());
        assert_eq!(rates.get("TRY").unwrap().rate, 1.0);
    }

    #[tokio::test]
    async fn test_date_used_without_update_time() {
        let mock_response = r#"{"base": "TRY", "date": "2026-10-16", "rates": {"USD": 0.03}}"#;
        let mock_server = create_mock_server(mock_response, 200).await;

        let rates = source_for(&mock_server).fetch().await.unwrap();
        assert_eq!(rates.last_update, "2026-10-16");
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = create_mock_server("", 500).await;
        let result = source_for(&mock_server).fetch().await;
        assert!(matches!(result, Err(SourceError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server(r#"{"result": "error"}"#, 200).await;
        let result = source_for(&mock_server).fetch().await;
        assert!(
            matches!(result, Err(SourceError::ParseError(msg)) if msg.contains("Failed to parse JSON response"))
        );
    }

    #[tokio::test]
    async fn test_no_recognized_rates() {
        let mock_server =
            create_mock_server(r#"{"base": "TRY", "rates": {"TRY": 1, "XAU": 0.1}}"#, 200).await;
        let result = source_for(&mock_server).fetch().await;
        assert!(matches!(result, Err(SourceError::EmptyResult(_))));
    }
}
