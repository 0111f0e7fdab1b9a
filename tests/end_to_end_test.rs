//! Full request path against a local stand-in for the model, search,
//! page, embedding and vector index endpoints.

use std::sync::{Arc, Mutex};

use aide::adapters::secrets::Secrets;
use aide::agents::{ChatRequest, ChatService, DispatchError, Route, WorkerKind};
use aide::config::Settings;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;

const PAGE: &str = r#"<html><head>
<style>body { font-family: serif; }</style>
<script>console.log("tracking");</script>
</head><body><h1>Ferris</h1><p>Ferris is the unofficial Rust mascot.</p></body></html>"#;

#[derive(Clone)]
struct Upstream {
    base: String,
    completions: Arc<Mutex<Vec<Value>>>,
}

fn tool_names(body: &Value) -> Vec<String> {
    body["tools"]
        .as_array()
        .map(|tools| {
            tools
                .iter()
                .filter_map(|t| t["function"]["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn tool_messages(body: &Value) -> Vec<String> {
    body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["role"] == "tool")
        .map(|m| m["content"].as_str().unwrap_or_default().to_string())
        .collect()
}

fn last_user_text(body: &Value) -> String {
    body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .rev()
        .find(|m| m["role"] == "user")
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string()
}

fn tool_call(name: &str, arguments: Value) -> Value {
    json!({
        "choices": [{
            "message": {
                "content": null,
                "tool_calls": [{
                    "id": format!("call_{}", name),
                    "type": "function",
                    "function": { "name": name, "arguments": arguments.to_string() }
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
}

fn text(content: &str) -> Value {
    json!({
        "choices": [{
            "message": { "content": content },
            "finish_reason": "stop"
        }]
    })
}

async fn completions(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer llm-test") {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }
    upstream.completions.lock().unwrap().push(body.clone());

    // Supervisor turn
    if body["tool_choice"]["function"]["name"] == "route" {
        let query = last_user_text(&body).to_lowercase();
        let label = if query.contains("handbook") {
            "rag_agent"
        } else if query.contains("thank") {
            "FINISH"
        } else if query.contains("poem") {
            "poet"
        } else {
            "researcher"
        };
        return Json(tool_call("route", json!({ "next": label }))).into_response();
    }

    let tools = tool_names(&body);
    let results = tool_messages(&body);

    if tools.iter().any(|t| t == "web_search") {
        let reply = match results.len() {
            0 => tool_call("web_search", json!({ "query": last_user_text(&body) })),
            1 => tool_call("scrape_url", json!({ "url": format!("{}/page", upstream.base) })),
            2 => tool_call(
                "write_file",
                json!({ "filename": "notes/ferris.md", "content": "Ferris is the Rust mascot." }),
            ),
            _ => text(&format!("Summary: {}", results[1])),
        };
        return Json(reply).into_response();
    }

    if tools.iter().any(|t| t == "retrieve_documents") {
        let reply = match results.first() {
            None => tool_call("retrieve_documents", json!({ "query": "refund policy" })),
            Some(found) => text(&format!("From the handbook: {}", found)),
        };
        return Json(reply).into_response();
    }

    Json(text("no tools were offered")).into_response()
}

async fn search(headers: HeaderMap, State(upstream): State<Upstream>, Json(body): Json<Value>) -> Response {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer tvly-test") {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }
    assert!(body["query"].as_str().is_some());
    Json(json!({
        "results": [
            { "title": "Ferris", "url": format!("{}/page", upstream.base), "content": "Rust mascot" },
            { "title": "No link", "content": "dropped" }
        ]
    }))
    .into_response()
}

async fn page() -> Html<&'static str> {
    Html(PAGE)
}

async fn embeddings(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["input"][0], "refund policy");
    Json(json!({ "data": [{ "embedding": [0.1, 0.2, 0.3] }] }))
}

async fn query(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if headers.get("api-key").and_then(|v| v.to_str().ok()) != Some("pc-test") {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }
    assert_eq!(body["topK"], 5);
    Json(json!({
        "matches": [
            { "id": "doc-1", "score": 0.92, "metadata": { "text": "Refunds are processed within 14 days." } },
            { "id": "doc-2", "score": 0.41, "metadata": { "text": "Shipping is free over 50 EUR." } }
        ]
    }))
    .into_response()
}

async fn start_upstream() -> Upstream {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let upstream = Upstream {
        base,
        completions: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .route("/v1/embeddings", post(embeddings))
        .route("/search", post(search))
        .route("/page", get(page))
        .route("/query", post(query))
        .with_state(upstream.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    upstream
}

fn settings(upstream: &Upstream, sandbox: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.llm.base_url = Some(format!("{}/v1", upstream.base));
    settings.llm.api_key_env = Some("MOCK_LLM_KEY".to_string());
    settings.agents.vision_agent.llm = None;
    settings.tools.search.endpoint = format!("{}/search", upstream.base);
    settings.tools.files.sandbox_dir = sandbox.path().to_path_buf();
    settings.tools.retrieval.index_host = upstream.base.clone();
    settings.tools.retrieval.embedding.base_url = format!("{}/v1", upstream.base);
    settings
}

fn secrets() -> Secrets {
    Secrets::new()
        .with("MOCK_LLM_KEY", "llm-test")
        .with("TAVILY_API_KEY", "tvly-test")
        .with("PINECONE_API_KEY", "pc-test")
}

#[tokio::test]
async fn researcher_searches_scrapes_and_writes() {
    let upstream = start_upstream().await;
    let sandbox = TempDir::new().unwrap();
    let service = ChatService::from_settings(&settings(&upstream, &sandbox), &secrets()).unwrap();

    let reply = service
        .chat(ChatRequest::new("Who is Ferris?"))
        .await
        .unwrap();

    assert_eq!(reply.route, Some(Route::Worker(WorkerKind::Researcher)));
    assert_eq!(reply.answered_by.as_deref(), Some("researcher"));
    assert_eq!(reply.sources, vec![format!("{}/page", upstream.base)]);
    assert!(reply.content.starts_with("Summary: "));
    assert!(reply.content.contains("Ferris is the unofficial Rust mascot."));
    assert!(!reply.content.contains("console.log"));
    assert!(!reply.content.contains("font-family"));

    let saved = std::fs::read_to_string(sandbox.path().join("notes/ferris.md")).unwrap();
    assert_eq!(saved, "Ferris is the Rust mascot.");

    // One supervisor call and four researcher turns
    assert_eq!(upstream.completions.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn rag_agent_answers_from_the_index() {
    let upstream = start_upstream().await;
    let sandbox = TempDir::new().unwrap();
    let service = ChatService::from_settings(&settings(&upstream, &sandbox), &secrets()).unwrap();

    let reply = service
        .chat(ChatRequest::new("What does the handbook say about refunds?"))
        .await
        .unwrap();

    assert_eq!(reply.route, Some(Route::Worker(WorkerKind::RagAgent)));
    assert!(reply.content.starts_with("From the handbook: "));
    assert!(reply.content.contains("Refunds are processed within 14 days."));
    assert!(reply.sources.is_empty());
}

#[tokio::test]
async fn supervisor_can_finish_immediately() {
    let upstream = start_upstream().await;
    let sandbox = TempDir::new().unwrap();
    let service = ChatService::from_settings(&settings(&upstream, &sandbox), &secrets()).unwrap();

    let reply = service.chat(ChatRequest::new("Thanks!")).await.unwrap();

    assert_eq!(reply.route, Some(Route::Finish));
    assert_eq!(reply.content, "");
    assert_eq!(reply.trace, vec![Route::Finish]);
    assert_eq!(upstream.completions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_worker_label_fails_the_request() {
    let upstream = start_upstream().await;
    let sandbox = TempDir::new().unwrap();
    let service = ChatService::from_settings(&settings(&upstream, &sandbox), &secrets()).unwrap();

    let err = service
        .chat(ChatRequest::new("Write me a poem"))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Routing { label } if label == "poet"));
}

#[tokio::test]
async fn rejected_model_key_surfaces_as_upstream_error() {
    let upstream = start_upstream().await;
    let sandbox = TempDir::new().unwrap();
    let secrets = secrets().with("MOCK_LLM_KEY", "wrong");
    let service = ChatService::from_settings(&settings(&upstream, &sandbox), &secrets).unwrap();

    let err = service.chat(ChatRequest::new("Who is Ferris?")).await.unwrap_err();

    assert!(matches!(err, DispatchError::Upstream(_)));
}
