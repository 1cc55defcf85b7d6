use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    CalculationResult, DEFAULT_SEED, MonteCarloResult, PlanForm, ProjectionSeries, ReturnMode,
    SavingMode, build_inputs, build_projection_series, run_monte_carlo, run_projection,
    simulation_config,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum ApiSavingMode {
    Flat,
    #[serde(alias = "step5", alias = "step")]
    Stepped,
}

impl From<ApiSavingMode> for SavingMode {
    fn from(value: ApiSavingMode) -> Self {
        match value {
            ApiSavingMode::Flat => SavingMode::Flat,
            ApiSavingMode::Stepped => SavingMode::Stepped,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum ApiReturnMode {
    #[serde(alias = "avg")]
    Average,
    #[serde(alias = "custom-allocation", alias = "customAllocation")]
    Custom,
}

impl From<ApiReturnMode> for ReturnMode {
    fn from(value: ApiReturnMode) -> Self {
        match value {
            ApiReturnMode::Average => ReturnMode::Average,
            ApiReturnMode::Custom => ReturnMode::Custom,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    #[serde(flatten)]
    form: PlanForm,
    saving_mode: Option<ApiSavingMode>,
    return_mode: Option<ApiReturnMode>,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    saving_mode: ApiSavingMode,
    return_mode: ApiReturnMode,
    seed: u64,
    simulations: u32,
    volatility: f64,
    result: CalculationResult,
    monte_carlo: MonteCarloResult,
    series: ProjectionSeries,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn plan_response_from_payload(payload: PlanPayload) -> Result<PlanResponse, String> {
    let saving_mode = payload.saving_mode.unwrap_or(ApiSavingMode::Flat);
    let return_mode = payload.return_mode.unwrap_or(ApiReturnMode::Average);
    let seed = payload.seed.unwrap_or(DEFAULT_SEED);

    let inputs = build_inputs(&payload.form, saving_mode.into(), return_mode.into())?;
    let config = simulation_config(&payload.form, seed);

    let result = run_projection(&inputs);
    let monte_carlo = run_monte_carlo(&inputs, &config);
    let series = build_projection_series(&inputs, &result);

    Ok(PlanResponse {
        saving_mode,
        return_mode,
        seed,
        simulations: config.simulations,
        volatility: config.volatility,
        result,
        monte_carlo,
        series,
    })
}

/// One-shot entry used by the CLI: raw form JSON in, response JSON out.
pub fn plan_response_json(raw: &str) -> Result<String, String> {
    let payload = serde_json::from_str::<PlanPayload>(raw)
        .map_err(|e| format!("Invalid plan JSON payload: {e}"))?;
    let response = plan_response_from_payload(payload)?;
    serde_json::to_string_pretty(&response).map_err(|e| e.to_string())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/plan", post(plan_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("nestegg HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/plan");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn plan_handler(Json(payload): Json<PlanPayload>) -> Response {
    match plan_response_from_payload(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
