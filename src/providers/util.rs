use crate::core::error::SourceError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("kurlar/", env!("CARGO_PKG_VERSION"));

/// Builds an HTTP client whose every request is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::UpstreamUnavailable(format!("Failed to build client: {e}")))
}

/// `url` without its query string. Query parameters may carry credentials,
/// so only this form goes into logs and error messages.
pub fn redact_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// GETs `url` and returns the body, treating non-2xx statuses as unavailable.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, SourceError> {
    let shown = redact_url(url);
    debug!("Requesting rates from {}", shown);
    let response = client.get(url).send().await.map_err(|e| {
        SourceError::UpstreamUnavailable(format!(
            "Request error: {} URL: {shown}",
            e.without_url()
        ))
    })?;

    if !response.status().is_success() {
        return Err(SourceError::UpstreamUnavailable(format!(
            "HTTP error: {} URL: {}",
            response.status(),
            shown
        )));
    }

    let text = response.text().await?;
    if text.trim().is_empty() {
        return Err(SourceError::ParseError(format!(
            "Received empty response from {shown}"
        )));
    }
    Ok(text)
}

/// Parses a decimal number as published upstream, tolerating surrounding
/// whitespace and a decimal comma.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Midnight UTC of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

pub fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Numeric rates for `recognized` codes and the domestic code, from a JSON
/// `rates` object. Other codes and non-numeric values are dropped.
pub fn recognized_rates(
    raw: HashMap<String, serde_json::Value>,
    recognized: &[&str],
    domestic: &str,
) -> Vec<(String, f64)> {
    raw.into_iter()
        .filter(|(code, _)| {
            recognized.contains(&code.as_str()) || code.eq_ignore_ascii_case(domestic)
        })
        .filter_map(|(code, value)| match value.as_f64() {
            Some(v) => Some((code, v)),
            None => {
                debug!(code = %code, "Skipping non-numeric rate");
                None
            }
        })
        .collect()
}

/// Publication time: unix seconds if given, else a `YYYY-MM-DD` date, else now.
pub fn published_at(unix_secs: Option<i64>, date: Option<&str>) -> DateTime<Utc> {
    unix_secs
        .and_then(from_unix_seconds)
        .or_else(|| {
            date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .map(start_of_day)
        })
        .unwrap_or_else(Utc::now)
}
