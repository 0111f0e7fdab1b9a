//! Per-request conversation state and the routing vocabulary

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Message, Role};
use crate::agents::error::DispatchError;

/// The three specialist workers the supervisor can delegate to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    Researcher,
    VisionAgent,
    RagAgent,
}

impl WorkerKind {
    pub const ALL: [WorkerKind; 3] = [
        WorkerKind::Researcher,
        WorkerKind::VisionAgent,
        WorkerKind::RagAgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerKind::Researcher => "researcher",
            WorkerKind::VisionAgent => "vision_agent",
            WorkerKind::RagAgent => "rag_agent",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routing label: one of the workers, or `FINISH`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Route {
    Worker(WorkerKind),
    Finish,
}

impl Route {
    pub const FINISH_LABEL: &'static str = "FINISH";

    pub const ALL: [Route; 4] = [
        Route::Worker(WorkerKind::Researcher),
        Route::Worker(WorkerKind::VisionAgent),
        Route::Worker(WorkerKind::RagAgent),
        Route::Finish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Worker(kind) => kind.as_str(),
            Route::Finish => Self::FINISH_LABEL,
        }
    }

    /// Parse a label produced by the model.
    ///
    /// Matching is exact and case-sensitive. Surrounding whitespace and a
    /// single layer of quotes are tolerated; anything else is a routing error.
    pub fn parse_label(raw: &str) -> Result<Self, DispatchError> {
        let trimmed = raw.trim();
        let unquoted = trimmed
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(trimmed)
            .trim();

        Route::ALL
            .into_iter()
            .find(|route| route.as_str() == unquoted)
            .ok_or_else(|| DispatchError::Routing {
                label: raw.to_string(),
            })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::parse_label(s)
    }
}

impl TryFrom<String> for Route {
    type Error = DispatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Route::parse_label(&value)
    }
}

impl From<Route> for String {
    fn from(route: Route) -> Self {
        route.as_str().to_string()
    }
}

impl JsonSchema for Route {
    fn schema_name() -> String {
        "Route".to_string()
    }

    fn is_referenceable() -> bool {
        false
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            enum_values: Some(
                Route::ALL
                    .iter()
                    .map(|route| serde_json::Value::String(route.as_str().to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
        .into()
    }
}

/// Structured output of the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RoutingDecision {
    /// The worker that should act next, or FINISH when the request is complete
    pub next: Route,
}

/// Where the image for the vision worker comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// Image on local disk, read when the vision worker runs
    File { path: PathBuf },
    /// Base64 payload supplied with the request
    Inline { mime_type: String, data: String },
}

/// Auxiliary fields a worker wants merged into the state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub search_query: Option<String>,
    pub urls_found: Vec<String>,
    pub scraped_content: BTreeMap<String, String>,
}

impl StateUpdate {
    pub fn is_empty(&self) -> bool {
        self.search_query.is_none() && self.urls_found.is_empty() && self.scraped_content.is_empty()
    }
}

/// Everything one chat request carries through the dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub request_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    /// Latest routing label, written once per supervisor turn
    pub next: Option<Route>,
    pub search_query: Option<String>,
    pub urls_found: Vec<String>,
    /// URL -> cleaned page text
    pub scraped_content: BTreeMap<String, String>,
    pub image: Option<ImageSource>,
}

impl ConversationState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            started_at: Utc::now(),
            messages,
            next: None,
            search_query: None,
            urls_found: Vec::new(),
            scraped_content: BTreeMap::new(),
            image: None,
        }
    }

    /// Seed a state with a single user message
    pub fn from_query(query: impl Into<String>) -> Self {
        Self::new(vec![Message::user(query)])
    }

    pub fn with_image(mut self, image: ImageSource) -> Self {
        self.image = Some(image);
        self
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// Merge a worker's auxiliary fields.
    ///
    /// The search query is replaced, URLs are appended without duplicates and
    /// scraped pages are keyed by URL.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(query) = update.search_query {
            self.search_query = Some(query);
        }
        for url in update.urls_found {
            if !self.urls_found.contains(&url) {
                self.urls_found.push(url);
            }
        }
        self.scraped_content.extend(update.scraped_content);
    }
}
