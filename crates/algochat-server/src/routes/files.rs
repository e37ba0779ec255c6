use std::fs::File;
use std::path::PathBuf;

use algochat::file_index::read_records;
use algochat::models::file_record::FileRecord;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn load_records(path: PathBuf) -> anyhow::Result<Vec<FileRecord>> {
    let file = File::open(&path)?;
    Ok(read_records(file)?)
}

async fn fetch_csv_data(State(state): State<AppState>) -> Response {
    let path = state.csv_path.as_ref().clone();
    let result = tokio::task::spawn_blocking(move || load_records(path)).await;

    match result {
        Ok(Ok(records)) => {
            tracing::debug!(count = records.len(), "serving file table");
            Json(records).into_response()
        }
        Ok(Err(e)) => {
            tracing::error!(path = %state.csv_path.display(), "Failed to read file table: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to read file table: {}", e),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("File table task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/fetchCsvData", get(fetch_csv_data))
        .with_state(state)
}
