mod auth;
mod predict;
mod views;

pub use auth::{serve_index, handle_login, open_signup, handle_signup, back_to_login, handle_logout};
pub use predict::{process_predictions, download_predictions};

use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
