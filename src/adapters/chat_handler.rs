//! REST handlers for the chat endpoint and the worker roster

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::agents::domain::{AgentInfo, ImageSource};
use crate::agents::error::DispatchError;
use crate::agents::handler::{ChatReply, ChatRequest, ChatService};

/// Shared state of the chat routes
#[derive(Clone)]
pub struct ChatState {
    pub chat: Arc<ChatService>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// `POST /chat` success body. The reply fields sit at the top level, so
/// clients read `content` directly.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(flatten)]
    pub reply: ChatReply,
}

/// `POST /chat` body
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub query: String,
    #[serde(default)]
    pub image: Option<InlineImage>,
}

/// Image sent along with the query
#[derive(Debug, Deserialize)]
pub struct InlineImage {
    #[serde(default)]
    pub mime_type: String,
    pub data_base64: String,
}

impl From<ChatBody> for ChatRequest {
    fn from(body: ChatBody) -> Self {
        ChatRequest {
            query: body.query,
            image: body.image.map(|image| ImageSource::Inline {
                mime_type: image.mime_type,
                data: image.data_base64,
            }),
        }
    }
}

/// HTTP view of a failed dispatch
#[derive(Debug)]
pub struct ApiError(pub DispatchError);

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            DispatchError::Routing { label } => {
                tracing::error!(label = %label, "supervisor produced an invalid route");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The request could not be routed".to_string(),
                )
            }
            DispatchError::MissingInput(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            DispatchError::EmptyConversation => {
                (StatusCode::BAD_REQUEST, "query must not be empty".to_string())
            }
            DispatchError::Upstream(reason) => {
                tracing::error!("upstream failure: {}", reason);
                (
                    StatusCode::BAD_GATEWAY,
                    "An upstream service failed".to_string(),
                )
            }
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

pub async fn chat(
    State(state): State<ChatState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, ApiError> {
    let reply = state.chat.chat(body.into()).await?;
    Ok(Json(ChatResponse {
        success: true,
        reply,
    }))
}

pub async fn list_agents(State(state): State<ChatState>) -> Json<ApiResponse<Vec<AgentInfo>>> {
    Json(ApiResponse::success(state.chat.agents().to_vec()))
}

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "aide",
        "version": env!("CARGO_PKG_VERSION"),
        "message": "Multi-agent chat service. POST /chat with {\"query\": \"...\"}."
    }))
}
