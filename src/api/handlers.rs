//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::debug;

use super::AppState;
use super::types::{ErrorResponse, MonthlyQuery, SummaryResponse};
use crate::config::ScenarioConfig;
use crate::sim::aggregate::AnnualResult;
use crate::sim::{SimulationResult, simulate};
use crate::sim::types::MonthlyResult;

fn bad_request(error: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

/// Returns the scenario and headline figures.
///
/// `GET /summary` → 200 + `SummaryResponse` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    Json(SummaryResponse::new(&state.scenario, &state.result))
}

/// Returns monthly records, optionally filtered by month index.
///
/// `GET /monthly` → 200 + `Vec<MonthlyResult>` JSON
/// `GET /monthly?from=N&to=M` → filtered range (inclusive)
/// `GET /monthly?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_monthly(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthlyQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err(bad_request(format!(
            "`from` ({from}) must be <= `to` ({to})"
        )));
    }

    let records: Vec<MonthlyResult> = state
        .result
        .monthly
        .iter()
        .enumerate()
        .filter(|(i, _)| *i >= from && *i <= to)
        .map(|(_, m)| m.clone())
        .collect();

    Ok(Json(records))
}

/// Returns the yearly rollups.
///
/// `GET /annual` → 200 + `Vec<AnnualResult>` JSON
pub async fn get_annual(State(state): State<Arc<AppState>>) -> Json<Vec<AnnualResult>> {
    Json(state.result.annual.clone())
}

/// Runs a scenario posted as JSON and returns the full payload.
///
/// `POST /simulate` → 200 + `SimulationResult` JSON
/// Malformed JSON, invalid parameters, or a scenario naming a utility
/// (the server holds no tariff table) → 400 + `ErrorResponse`
pub async fn post_simulate(
    body: Bytes,
) -> Result<Json<SimulationResult>, (StatusCode, Json<ErrorResponse>)> {
    let scenario: ScenarioConfig = serde_json::from_slice(&body)
        .map_err(|e| bad_request(format!("invalid scenario JSON: {e}")))?;

    scenario
        .require_inline_tariff()
        .map_err(|e| bad_request(e.to_string()))?;

    let errors = scenario.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(bad_request(messages.join("; ")));
    }

    let params = scenario
        .to_params()
        .map_err(|e| bad_request(e.to_string()))?;
    debug!(structure = %params.structure, "simulating posted scenario");
    Ok(Json(simulate(&params)))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;

    fn make_test_state() -> Arc<AppState> {
        let scenario = ScenarioConfig::baseline();
        let result = simulate(&scenario.to_params().unwrap());
        Arc::new(AppState { scenario, result })
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn summary_returns_200() {
        let app = router(make_test_state());
        let req = Request::builder()
            .uri("/summary")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert!(json.get("scenario").is_some());
        assert_eq!(json["months"], 36);
        assert_eq!(json["structure"], "Blue");
    }

    #[tokio::test]
    async fn monthly_range_query() {
        let app = router(make_test_state());
        let req = Request::builder()
            .uri("/monthly?from=5&to=10")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0]["period"], "Jun/2025");
        assert_eq!(rows[5]["period"], "Nov/2025");
    }

    #[tokio::test]
    async fn monthly_invalid_range_returns_400() {
        let app = router(make_test_state());
        let req = Request::builder()
            .uri("/monthly?from=10&to=5")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await.get("error").is_some());
    }

    #[tokio::test]
    async fn simulate_rejects_invalid_scenario() {
        let app = router(make_test_state());
        let req = Request::builder()
            .method("POST")
            .uri("/simulate")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"taxes": {"icms_pct": 50.0}}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("taxes.icms_pct"));
    }

    #[tokio::test]
    async fn simulate_rejects_malformed_json() {
        let app = router(make_test_state());
        let req = Request::builder()
            .method("POST")
            .uri("/simulate")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn simulate_rejects_named_utility() {
        let app = router(make_test_state());
        let req = Request::builder()
            .method("POST")
            .uri("/simulate")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"tariff": {"modality": "Blue", "utility": "LIGHT", "subgroup": "A4"}}"#,
            ))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("tariff.utility"));
    }
}
