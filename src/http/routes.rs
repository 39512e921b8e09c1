//! Request handlers for the HTTP API.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};

use super::{ApiError, AppState};
use crate::models::ToolOutput;

/// Parse a request body; an empty body means no arguments
fn json_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(body)?)
}

/// `GET /`
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": state.settings.app_name,
        "version": state.settings.app_version,
        "description": "arXiv MCP Server with SSE support",
        "endpoints": {
            "events": "/events",
            "tools": "/tools",
            "prompts": "/prompts",
            "search": "/search",
            "download": "/download",
            "list": "/list",
            "read": "/read"
        }
    }))
}

/// `GET /tools`
pub async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "tools": state.tools.descriptors() }))
}

/// `GET /prompts`
pub async fn list_prompts(State(state): State<AppState>) -> Json<Value> {
    let prompts: Vec<_> = state.prompts.all().collect();
    Json(json!({ "prompts": prompts }))
}

/// `GET /prompts/{name}?arg=value`
pub async fn get_prompt(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(arguments): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let prompt = state.prompts.render(&name, &arguments)?;
    Ok(Json(json!({ "prompt": prompt })))
}

/// `POST /search`
pub async fn search(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let output = state.dispatcher.search(json_body(&body)?).await?;
    let body = match output {
        ToolOutput::Search(response) => json!({ "results": response.papers }),
        rejected @ ToolOutput::Rejected(_) => {
            let text = rejected.into_content().remove(0);
            json!({ "results": [], "error": text.as_text() })
        }
        other => json!({ "results": other.into_content() }),
    };
    Ok(Json(body))
}

/// `POST /download`
pub async fn download(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let output = state.dispatcher.download(json_body(&body)?).await?;
    Ok(Json(json!({ "result": output.into_content() })))
}

/// `POST /list`
pub async fn list(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let output = state.dispatcher.list(json_body(&body)?).await?;
    Ok(Json(json!({ "papers": output.into_content() })))
}

/// `POST /read`
pub async fn read(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let output = state.dispatcher.read(json_body(&body)?).await?;
    Ok(Json(json!({ "content": output.into_content() })))
}

/// `POST /tools/{name}`
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let output = state.dispatcher.call_tool(&name, json_body(&body)?).await?;
    Ok(Json(json!({ "result": output.into_content() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body() {
        assert_eq!(json_body(&Bytes::new()).unwrap(), Value::Null);
        assert_eq!(json_body(&Bytes::from_static(b" \n")).unwrap(), Value::Null);
        assert_eq!(
            json_body(&Bytes::from_static(br#"{"query":"q"}"#)).unwrap(),
            json!({"query": "q"})
        );
        assert!(matches!(
            json_body(&Bytes::from_static(b"{oops")),
            Err(ApiError::BadRequest(_))
        ));
    }
}
