use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, instrument};

use crate::catalog::SubjectSpec;
use crate::geojson::FeatureCollection;
use crate::services::{DatasetError, DatasetService};

pub const GEOJSON_CONTENT_TYPE: &str = "application/geo+json";

#[derive(Clone)]
pub struct AppState {
    pub dataset_service: DatasetService,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/subjects", get(get_subjects))
        .route("/helloworld", get(rebuild_dataset).post(get_stored_dataset))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[instrument(skip(state))]
async fn get_subjects(State(state): State<AppState>) -> Json<Vec<SubjectSpec>> {
    let subjects = state.dataset_service.catalog().subjects.clone();
    debug!("Returning {} subjects", subjects.len());
    Json(subjects)
}

#[instrument(skip(state))]
async fn rebuild_dataset(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    debug!("Rebuilding dataset from sheets");
    let collection = state.dataset_service.rebuild().await.map_err(|e| {
        error!("Failed to rebuild dataset: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    info!("Rebuilt dataset with {} features", collection.len());
    geojson_response(&collection)
}

#[instrument(skip(state))]
async fn get_stored_dataset(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    debug!("Reading stored dataset");
    let collection = state
        .dataset_service
        .load_stored()
        .await
        .map_err(|e: DatasetError| {
            error!("Failed to read stored dataset: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    info!("Returning stored dataset with {} features", collection.len());
    geojson_response(&collection)
}

fn geojson_response(collection: &FeatureCollection) -> Result<impl IntoResponse, StatusCode> {
    let body = collection.to_json().map_err(|e| {
        error!("Failed to encode GeoJSON: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(([(header::CONTENT_TYPE, GEOJSON_CONTENT_TYPE)], body))
}
