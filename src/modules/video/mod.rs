use crate::state::AppState;
use axum::{Router, middleware, routing::get};

pub mod dto;
pub mod error;
pub mod events;
pub mod handler;
pub mod model;
pub mod producer;
pub mod repository;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_videos).post(handler::upload_video))
        .route("/{id}", get(handler::get_video).delete(handler::delete_video))
        .route_layer(middleware::from_fn(crate::middleware::owner::owner_middleware))
}
