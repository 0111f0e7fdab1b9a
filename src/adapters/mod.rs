pub mod auth_middleware;
pub mod chat_handler;
pub mod health_handler;
pub mod rate_limit;
pub mod secrets;
pub mod tool_handler;
pub mod tools;
