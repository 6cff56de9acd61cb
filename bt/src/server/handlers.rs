//! Request handlers
//!
//! JSON bodies are taken as `Result<Json<T>, JsonRejection>` so malformed or
//! missing payloads produce the same `{"error": ...}` shape as every other
//! failure instead of axum's plain-text rejections.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use super::AppState;
use super::error::{ApiError, GENERATE_FAILED, INTERNAL_ERROR};
use crate::assistant::AssistantError;
use crate::domain::{ChatMessage, TodoList};
use crate::parser::{Section, Tier};

const MESSAGE_REQUIRED: &str = "Message is required";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub parsed: Vec<Section>,
}

#[derive(Debug, Serialize)]
pub struct PlainChatResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub tier: Option<Tier>,
    pub parsed: Vec<Section>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTodoRequest {
    #[serde(default)]
    pub user_story: Option<String>,
    #[serde(default)]
    pub sections: Option<Vec<Section>>,
    #[serde(default)]
    pub accepted: Option<bool>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    /// Include lists that were never accepted
    #[serde(default)]
    pub all: bool,
}

/// Non-blank `message` field or a 400
fn required_message(payload: Result<Json<ChatRequest>, JsonRejection>) -> Result<String, ApiError> {
    payload
        .ok()
        .and_then(|Json(req)| req.message)
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(MESSAGE_REQUIRED.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// POST /api/chat - generate and parse a BA to-do list for a user story
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = required_message(payload)?;
    debug!(message_len = message.len(), "chat: called");

    let generated = state.assistant.generate(&message).await.map_err(|e| match e {
        AssistantError::MissingInput => ApiError::BadRequest(MESSAGE_REQUIRED.to_string()),
        other => {
            error!(error = %other, "chat: generation failed");
            ApiError::Internal(GENERATE_FAILED.to_string())
        }
    })?;

    // Best-effort: a logging failure does not fail the request
    if let Err(e) = state
        .store
        .record_chat(ChatMessage::new(message.as_str(), generated.reply.as_str()))
        .await
    {
        warn!(error = %e, "chat: failed to record exchange");
    }

    Ok(Json(ChatResponse {
        reply: generated.reply,
        parsed: generated.parsed,
    }))
}

/// POST /api/chat/plain - forward a message to the model without the BA prompt
pub async fn chat_plain(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<PlainChatResponse>, ApiError> {
    let message = required_message(payload)?;
    debug!(message_len = message.len(), "chat_plain: called");

    let reply = state.assistant.chat(&message).await.map_err(|e| match e {
        AssistantError::MissingInput => ApiError::BadRequest(MESSAGE_REQUIRED.to_string()),
        other => {
            error!(error = %other, "chat_plain: LLM call failed");
            ApiError::Internal(INTERNAL_ERROR.to_string())
        }
    })?;

    Ok(Json(PlainChatResponse { reply }))
}

/// POST /api/parse - run the section parser on arbitrary text
pub async fn parse(
    State(state): State<AppState>,
    payload: Result<Json<ParseRequest>, JsonRejection>,
) -> Json<ParseResponse> {
    let text = payload.ok().and_then(|Json(req)| req.text);
    debug!(text_len = ?text.as_ref().map(|t| t.len()), "parse: called");

    let outcome = state.parser.parse_outcome(text.as_deref());
    Json(ParseResponse {
        tier: outcome.tier,
        parsed: outcome.sections,
    })
}

/// POST /api/todos - persist a to-do list
pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<SaveTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let user_story =
        non_blank(req.user_story).ok_or_else(|| ApiError::BadRequest("userStory is required".to_string()))?;

    let list = TodoList::new(user_story, req.sections.unwrap_or_default())
        .with_accepted(req.accepted.unwrap_or(false))
        .with_session(req.session_id.unwrap_or_default());
    let id = save(&state, list).await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// POST /api/accept - persist a to-do list the user accepted
pub async fn accept_new(
    State(state): State<AppState>,
    payload: Result<Json<SaveTodoRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let missing = || ApiError::BadRequest("userStory and sections are required".to_string());
    let Json(req) = payload.map_err(|_| missing())?;
    let (Some(user_story), Some(sections)) = (non_blank(req.user_story), req.sections) else {
        return Err(missing());
    };

    let list = TodoList::new(user_story, sections)
        .with_accepted(true)
        .with_session(req.session_id.unwrap_or_default());
    let id = save(&state, list).await?;

    Ok(Json(json!({ "message": "TodoList saved successfully", "id": id })))
}

async fn save(state: &AppState, list: TodoList) -> Result<String, ApiError> {
    let id = state.store.create_todo_list(list).await.map_err(|e| {
        error!(error = %e, "save: persistence failed");
        ApiError::Internal(format!("Failed to save TodoList: {}", e))
    })?;
    info!(%id, "TodoList saved");
    Ok(id)
}

/// GET /api/todos - accepted lists (or all with `?all=true`), most recent first
pub async fn list_todos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TodoList>>, ApiError> {
    debug!(?query, "list_todos: called");
    let accepted = if query.all { None } else { Some(true) };

    let lists = state
        .store
        .list_todo_lists(accepted, query.limit)
        .await
        .map_err(|e| {
            error!(error = %e, "list_todos: fetch failed");
            ApiError::Internal(format!("Failed to fetch TodoLists: {}", e))
        })?;

    Ok(Json(lists))
}

/// GET /api/todos/{id}
pub async fn get_todo(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<TodoList>, ApiError> {
    debug!(%id, "get_todo: called");
    Ok(Json(state.store.get_todo_list_required(&id).await?))
}

/// POST /api/todos/{id}/accept
pub async fn accept_todo(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<TodoList>, ApiError> {
    debug!(%id, "accept_todo: called");
    let list = state.store.accept_todo_list(&id).await?;
    info!(%id, "TodoList accepted");
    Ok(Json(list))
}

/// GET /api/chats - logged exchanges, most recent first
pub async fn list_chats(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    debug!(?query, "list_chats: called");
    let chats = state.store.list_chats(query.limit).await.map_err(|e| {
        error!(error = %e, "list_chats: fetch failed");
        ApiError::Internal(format!("Failed to fetch chat messages: {}", e))
    })?;
    Ok(Json(chats))
}

/// POST /api/sync - replay log lines written by other processes
pub async fn sync(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    debug!("sync: called");
    let replayed = state.store.sync().await.map_err(|e| {
        error!(error = %e, "sync: replay failed");
        ApiError::Internal(format!("Failed to sync store: {}", e))
    })?;
    info!(replayed, "Store synced");
    Ok(Json(json!({ "replayed": replayed })))
}
