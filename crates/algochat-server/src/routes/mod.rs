pub mod files;
pub mod status;

use crate::state::AppState;
use axum::Router;

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(files::routes(state))
        .merge(status::routes())
}
