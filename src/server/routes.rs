use super::AppState;
use crate::core::error::ConversionError;
use crate::core::rates::{DataQuality, RateEntry, RateSet};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Failures that never reach the caller as data.
#[derive(Debug)]
pub enum ApiError {
    /// The aggregation task died (panic or cancellation).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "API error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": "API error" })),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    pub base: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesResponse<'a> {
    pub success: bool,
    pub source: &'a str,
    pub data_quality: DataQuality,
    pub reliability: &'a str,
    pub base: &'a str,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub last_update: &'a str,
    pub rates: &'a BTreeMap<String, RateEntry>,
}

impl<'a> From<&'a RateSet> for RatesResponse<'a> {
    fn from(rates: &'a RateSet) -> Self {
        RatesResponse {
            success: true,
            source: &rates.source,
            data_quality: rates.data_quality,
            reliability: &rates.reliability,
            base: &rates.base,
            timestamp: rates.timestamp.timestamp_millis(),
            last_update: &rates.last_update,
            rates: &rates.entries,
        }
    }
}

/// `amount` stays untyped so a non-numeric value is reported in-band.
#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub amount: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    pub result: f64,
    pub rate: f64,
    pub source: String,
}

/// GET /api/rates
pub async fn get_rates(
    State(state): State<AppState>,
    Query(query): Query<RatesQuery>,
) -> Result<Response, ApiError> {
    let aggregator = Arc::clone(&state.aggregator);
    let rates = tokio::spawn(async move { aggregator.get_rates(false).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let requested = query
        .base
        .map(|b| b.trim().to_uppercase())
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| state.domestic.clone());

    let view = if requested == rates.base {
        rates
    } else {
        match rates.rebased(&requested) {
            Some(rebased) => Arc::new(rebased),
            None => {
                debug!(base = %requested, "Unknown base requested, serving domestic view");
                rates
            }
        }
    };

    Ok(Json(RatesResponse::from(view.as_ref())).into_response())
}

/// POST /api/rates
pub async fn convert_amount(
    State(state): State<AppState>,
    body: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return Ok(malformed_request(rejection)),
    };

    let Some(amount) = request.amount.as_f64() else {
        let err = ConversionError::InvalidAmount(request.amount.to_string());
        return Ok(conversion_failure(err));
    };

    let aggregator = Arc::clone(&state.aggregator);
    let outcome = tokio::spawn(async move {
        aggregator
            .convert(&request.from, &request.to, amount)
            .await
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    match outcome {
        Ok((conversion, rates)) => Ok(Json(ConvertResponse {
            success: true,
            result: conversion.result,
            rate: conversion.rate,
            source: rates.source.clone(),
        })
        .into_response()),
        Err(e) => Ok(conversion_failure(e)),
    }
}

fn conversion_failure(err: ConversionError) -> Response {
    debug!(error = %err, "Rejected conversion request");
    Json(json!({ "success": false, "error": err.to_string() })).into_response()
}

/// Body rejections keep their 4xx status but answer in the route's JSON shape.
fn malformed_request(rejection: JsonRejection) -> Response {
    debug!(error = %rejection.body_text(), "Malformed conversion request");
    (
        rejection.status(),
        Json(json!({ "success": false, "error": rejection.body_text() })),
    )
        .into_response()
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
