use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, Method, StatusCode, Uri},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// Body served by `/fixed/json`.
pub const FIXED_JSON: &str = r#"{"a":1}"#;

/// Body served by `/fixed/text`.
pub const FIXED_TEXT: &str = "plain text, not json";

/// What the server saw of one request to `/echo`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub id: Uuid,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

pub type Journal = Arc<RwLock<Vec<RecordedRequest>>>;

pub fn app() -> Router {
    let journal: Journal = Arc::new(RwLock::new(Vec::new()));
    Router::new()
        .route("/echo", get(echo).post(echo))
        .route("/journal", get(list_journal).delete(clear_journal))
        .route("/fixed/json", get(fixed_json).post(fixed_json))
        .route("/fixed/text", get(fixed_text).post(fixed_text))
        .route("/status/{code}", get(status).post(status))
        .with_state(journal)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    State(journal): State<Journal>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Json<RecordedRequest> {
    let header_value = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let recorded = RecordedRequest {
        id: Uuid::new_v4(),
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_owned),
        content_type: header_value(header::CONTENT_TYPE),
        authorization: header_value(header::AUTHORIZATION),
        body,
    };
    debug!(%method, %uri, id = %recorded.id, "recorded request");
    journal.write().await.push(recorded.clone());
    Json(recorded)
}

async fn list_journal(State(journal): State<Journal>) -> Json<Vec<RecordedRequest>> {
    Json(journal.read().await.clone())
}

async fn clear_journal(State(journal): State<Journal>) -> StatusCode {
    journal.write().await.clear();
    StatusCode::NO_CONTENT
}

async fn fixed_json() -> ([(HeaderName, &'static str); 1], &'static str) {
    ([(header::CONTENT_TYPE, "application/json")], FIXED_JSON)
}

async fn fixed_text() -> &'static str {
    FIXED_TEXT
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(json!({ "status": code }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded() -> RecordedRequest {
        RecordedRequest {
            id: Uuid::nil(),
            method: "POST".to_string(),
            path: "/echo".to_string(),
            query: None,
            content_type: Some("application/json".to_string()),
            authorization: None,
            body: r#"{"x":1}"#.to_string(),
        }
    }

    #[test]
    fn recorded_request_serializes_to_json() {
        let json = serde_json::to_value(recorded()).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["method"], "POST");
        assert_eq!(json["query"], Value::Null);
        assert_eq!(json["body"], r#"{"x":1}"#);
    }

    #[test]
    fn fixed_json_body_is_valid_json() {
        let value: Value = serde_json::from_str(FIXED_JSON).unwrap();
        assert_eq!(value, json!({ "a": 1 }));
    }

    #[test]
    fn fixed_text_body_is_not_json() {
        assert!(serde_json::from_str::<Value>(FIXED_TEXT).is_err());
    }
}
