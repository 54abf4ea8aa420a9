use crate::config::ScenarioConfig;
use crate::data::{AllocationInput, AllocationReport, sample_input};
use crate::error::AllocationError;
use crate::solver::{self, HighsAdapter};
use axum::{Json, Router, http::StatusCode, routing::post};
use log::{error, info};
use serde::Deserialize;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Body of a solve request. Both parts are optional: the input defaults to the
/// bundled catalog and the scenario to the base formulation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    #[serde(default = "sample_input")]
    pub input: AllocationInput,
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

async fn solve_handler(
    Json(request): Json<SolveRequest>,
) -> Result<Json<AllocationReport>, (StatusCode, String)> {
    // the solver blocks; keep it off the async workers
    let result = tokio::task::spawn_blocking(move || {
        let adapter = HighsAdapter::for_scenario(&request.scenario)?;
        solver::solve(&request.input, &request.scenario, &adapter)
    })
    .await
    .map_err(|e| {
        error!("Solve task failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    match result {
        Ok(report) => Ok(Json(report)),
        Err(e) => Err((status_code(&e), e.to_string())),
    }
}

fn status_code(e: &AllocationError) -> StatusCode {
    match e {
        AllocationError::DataIntegrity(_)
        | AllocationError::InvalidConfig(_)
        | AllocationError::PriorityWeightTooSmall { .. } => StatusCode::BAD_REQUEST,
        AllocationError::NotOptimal(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub fn router() -> Router {
    Router::new().route("/v1/allocation/solve", post(solve_handler))
}

pub async fn run_server(addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router()).await
}
