//! Error types for rate sources and conversions.

use thiserror::Error;

/// Reasons a single rate source can fail to produce a rate set.
///
/// These never leave the aggregator; they only decide which source wins.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    /// Network failure, timeout or non-success HTTP status.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The response body could not be read in the expected shape.
    #[error("Failed to parse upstream response: {0}")]
    ParseError(String),

    /// The response parsed but yielded no usable entries.
    #[error("No usable rates in response from {0}")]
    EmptyResult(String),
}

/// The request URL is dropped; it may carry credentials in its query.
impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::UpstreamUnavailable(err.without_url().to_string())
    }
}

/// Errors raised by the conversion calculator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConversionError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}
