//! Demonstration routes served behind the request logger.

use axum::{
    extract::Query,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    pub id: Option<u64>,
}

pub async fn get_item(Query(query): Query<ItemQuery>) -> impl IntoResponse {
    match query.id {
        Some(id) => (StatusCode::OK, Json(json!({ "ok": true, "id": id }))),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "missing id" })),
        ),
    }
}

/// Echo a JSON body back to the caller.
pub async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

pub async fn text() -> &'static str {
    "plain text response"
}

/// Only routed in debug mode.
pub async fn fail() -> StatusCode {
    panic!("simulated handler failure")
}
