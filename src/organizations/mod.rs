pub mod dto;
pub mod handlers;
pub mod model;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::organization_routes()
}
