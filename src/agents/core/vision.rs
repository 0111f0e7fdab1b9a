use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{Worker, WorkerOutput, WorkerSettings};
use crate::agents::domain::{ConversationState, ImageAttachment, ImageSource, Message, WorkerKind};
use crate::agents::error::{AgentError, AgentResult};
use crate::agents::llm::{CompletionRequest, LlmProvider};

const DEFAULT_QUESTION: &str = "Describe this image.";
const FALLBACK_MIME: &str = "image/jpeg";

/// Answers questions about the image carried in the conversation state
pub struct VisionWorker {
    llm: Arc<dyn LlmProvider>,
    system_prompt: String,
    settings: WorkerSettings,
}

impl VisionWorker {
    pub fn new(llm: Arc<dyn LlmProvider>, system_prompt: &str, settings: WorkerSettings) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.to_string(),
            settings,
        }
    }
}

#[async_trait]
impl Worker for VisionWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::VisionAgent
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    async fn run(&self, state: &ConversationState) -> AgentResult<WorkerOutput> {
        let source = state
            .image
            .as_ref()
            .ok_or_else(|| AgentError::MissingInput("no image attached to the request".to_string()))?;
        let attachment = load_image(source).await?;

        let question = state
            .last_user_message()
            .map(|m| m.content.trim())
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_QUESTION);

        let mut messages = Vec::with_capacity(2);
        if !self.system_prompt.is_empty() {
            messages.push(Message::system(&self.system_prompt));
        }
        messages.push(Message::user(question).with_attachment(attachment));

        let response = self
            .llm
            .complete(CompletionRequest {
                messages,
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
                ..Default::default()
            })
            .await?;

        tracing::info!(model = self.llm.model(), "vision analysis finished");
        Ok(WorkerOutput::reply(self.kind(), response.message.content))
    }
}

/// Resolve an image source into a base64 attachment
pub async fn load_image(source: &ImageSource) -> AgentResult<ImageAttachment> {
    match source {
        ImageSource::Inline { mime_type, data } => {
            if data.trim().is_empty() {
                return Err(AgentError::MissingInput("attached image is empty".to_string()));
            }
            let mime = if mime_type.trim().is_empty() {
                FALLBACK_MIME
            } else {
                mime_type.trim()
            };
            Ok(ImageAttachment::new(mime, data.trim()))
        }
        ImageSource::File { path } => {
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                AgentError::MissingInput(format!("cannot read image {}: {}", path.display(), e))
            })?;
            if bytes.is_empty() {
                return Err(AgentError::MissingInput(format!(
                    "image {} is empty",
                    path.display()
                )));
            }
            Ok(ImageAttachment::new(image_mime(path), STANDARD.encode(bytes)))
        }
    }
}

fn image_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .iter()
        .find(|m| m.type_() == mime_guess::mime::IMAGE)
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}
