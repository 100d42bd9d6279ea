//! Local-only routes: the status document and the HTML debug console.

use axum::{response::Html, Json};
use serde::Serialize;

use crate::routing::ENDPOINTS;

const DEBUG_PAGE: &str = include_str!("debug.html");

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub operations: usize,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        operations: ENDPOINTS.len(),
    })
}

pub async fn debug_page() -> Html<&'static str> {
    Html(DEBUG_PAGE)
}
