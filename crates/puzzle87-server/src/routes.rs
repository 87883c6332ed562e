use crate::error::{ApiError, ServiceError};
use crate::model::{Solution, SolutionId};
use crate::service::{GenerateSummary, SolverService};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use puzzle87_core::equation::DIGITS;
use serde_json::json;
use std::sync::Arc;

/// Mount point of every solution endpoint.
pub const BASE_PATH: &str = "/api/game/solutions";

pub type AppState = Arc<SolverService>;

type Numbers = Result<Json<Vec<i32>>, JsonRejection>;
type Id = Result<Path<SolutionId>, PathRejection>;

/// The solution API, nested under `BASE_PATH`.
pub fn router(state: AppState) -> Router {
    let solutions = Router::new()
        .route("/", get(all_solutions).post(create_solution).delete(delete_all_solutions))
        .route("/generate", get(generate_solutions))
        .route("/{id}", get(solution_by_id).put(update_solution).delete(delete_solution_by_id));

    Router::new()
        .nest(BASE_PATH, solutions)
        .with_state(state)
}

/// Bodies must carry exactly `DIGITS` numbers before they reach the service.
fn require_digits(numbers: &[i32]) -> Result<(), ApiError> {
    if numbers.len() != DIGITS {
        return Err(ApiError::BadRequest(format!("expected {} numbers, got {}", DIGITS, numbers.len())));
    }
    Ok(())
}

/// Run a service call on the blocking pool. The store takes a std mutex and may write its snapshot.
async fn blocking<T, F>(service: AppState, work: F) -> Result<T, ApiError>
where
    F: FnOnce(&SolverService) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    let output = tokio::task::spawn_blocking(move || work(&service))
        .await
        .map_err(ServiceError::from)??;
    Ok(output)
}

/// Clear the store and regenerate every solution.
async fn generate_solutions(State(service): State<AppState>) -> Result<Json<GenerateSummary>, ApiError> {
    Ok(Json(blocking(service, SolverService::generate_solutions).await?))
}

async fn all_solutions(State(service): State<AppState>) -> Result<Json<Vec<Solution>>, ApiError> {
    Ok(Json(blocking(service, SolverService::all_solutions).await?))
}

/// Store a guess. An identical stored guess is returned instead of a new one.
async fn create_solution(State(service): State<AppState>, payload: Numbers) -> Result<Json<Solution>, ApiError> {
    let Json(numbers) = payload?;
    require_digits(&numbers)?;
    Ok(Json(blocking(service, move |service| service.create_solution(numbers)).await?))
}

async fn solution_by_id(State(service): State<AppState>, id: Id) -> Result<Json<Solution>, ApiError> {
    let Path(id) = id?;
    blocking(service, move |service| service.solution_by_id(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn delete_solution_by_id(State(service): State<AppState>, id: Id) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    if blocking(service, move |service| service.delete_solution_by_id(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

async fn delete_all_solutions(State(service): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted_count = blocking(service, SolverService::delete_all_solutions).await?;
    Ok(Json(json!({ "deletedCount": deleted_count })))
}

/// Replace the numbers of a stored guess, dropping any other guess that already has them.
async fn update_solution(
    State(service): State<AppState>,
    id: Id,
    payload: Numbers,
) -> Result<Json<Solution>, ApiError> {
    let Path(id) = id?;
    let Json(numbers) = payload?;
    require_digits(&numbers)?;
    blocking(service, move |service| service.update_solution(id, numbers))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}
