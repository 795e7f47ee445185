//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, ForecastRecord, StateResponse, TraceQuery, TraceRecord};

/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let latest_sample = state
        .trace
        .last()
        .map(|s| TraceRecord::new(state.trace.len() - 1, s));

    Json(StateResponse {
        config: state.config.clone(),
        trace_len: state.trace.len(),
        scale: state.report.forecast.params,
        backtest: state.report.backtest.clone(),
        latest_sample,
    })
}

/// Returns trace samples, optionally filtered by index range.
///
/// `GET /trace` → 200 + `Vec<TraceRecord>` JSON
/// `GET /trace?from=N&to=M` → filtered range (inclusive)
/// `GET /trace?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_trace(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TraceQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<TraceRecord> = state
        .trace
        .iter()
        .enumerate()
        .skip(from)
        .take_while(|(i, _)| *i <= to)
        .map(|(i, s)| TraceRecord::new(i, s))
        .collect();

    Ok(Json(records))
}

/// `GET /forecast` → 200 + `Vec<ForecastRecord>` JSON
pub async fn get_forecast(State(state): State<Arc<AppState>>) -> Json<Vec<ForecastRecord>> {
    let forecast = &state.report.forecast;
    let records = forecast
        .timestamps
        .iter()
        .zip(&forecast.values_w)
        .enumerate()
        .map(|(i, (ts, w))| ForecastRecord {
            step: i + 1,
            timestamp: *ts,
            power_w: *w,
        })
        .collect();
    Json(records)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{DateTime, Utc};
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::config::PipelineConfig;
    use crate::pipeline;

    fn make_test_state() -> Arc<AppState> {
        let mut config = PipelineConfig::heater();
        config.trace.duration = 120;
        config.trace.start = Some(DateTime::<Utc>::UNIX_EPOCH);
        let trace = pipeline::generate_trace(&config).unwrap();
        let report = pipeline::run(&config, &trace).unwrap();
        Arc::new(AppState {
            config,
            trace,
            report,
        })
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router(make_test_state());
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn state_returns_200() {
        let (status, json) = get_json("/state").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.get("config").is_some());
        assert!(json.get("backtest").is_some());
        assert_eq!(json["trace_len"], 120);
        assert_eq!(json["latest_sample"]["index"], 119);
    }

    #[tokio::test]
    async fn trace_returns_all_samples() {
        let (status, json) = get_json("/trace").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().map(Vec::len), Some(120));
    }

    #[tokio::test]
    async fn trace_range_query() {
        let (status, json) = get_json("/trace?from=5&to=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().map(Vec::len), Some(6));
        assert_eq!(json[0]["index"], 5);
        assert_eq!(json[5]["index"], 10);
    }

    #[tokio::test]
    async fn trace_invalid_range_returns_400() {
        let (status, json) = get_json("/trace?from=10&to=5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn forecast_lists_steps_ahead() {
        let (status, json) = get_json("/forecast").await;
        assert_eq!(status, StatusCode::OK);
        let steps = json.as_array().map(Vec::len);
        assert_eq!(steps, Some(PipelineConfig::heater().forecast.steps_ahead));
        assert_eq!(json[0]["step"], 1);
    }
}
