use std::collections::HashSet;

use thiserror::Error;

use crate::adapters::tools::{file_write, retrieval, scrape, web_search};
use crate::agents::config::{DispatchMode, LlmProviderConfig};
use crate::agents::core::prompts::{self, RosterEntry};
use crate::config::{ServerSettings, Settings};
use crate::domain::auth::AuthMode;

/// Tool names a worker may list
pub const KNOWN_TOOLS: [&str; 4] = [
    web_search::TOOL_NAME,
    scrape::TOOL_NAME,
    file_write::TOOL_NAME,
    retrieval::TOOL_NAME,
];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Cross-reference error: {0}")]
    CrossReference(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        Self::validate_server(&settings.server, &mut errors);
        Self::validate_auth(settings, &mut errors);
        Self::validate_llm("llm", &settings.llm, &mut errors);
        if let Some(llm) = &settings.supervisor.llm {
            Self::validate_llm("supervisor.llm", llm, &mut errors);
        }
        Self::validate_supervisor(settings, &mut errors);
        Self::validate_workers(settings, &mut errors);
        Self::validate_tools(settings, &mut errors);
        Self::validate_dispatch(settings, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings, errors: &mut Vec<ValidationError>) {
        if server.host.trim().is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }
        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }
    }

    fn validate_auth(settings: &Settings, errors: &mut Vec<ValidationError>) {
        let auth = &settings.auth;
        if auth.enabled {
            match auth.mode {
                AuthMode::ApiKey if auth.api_keys.as_ref().map_or(true, Vec::is_empty) => {
                    errors.push(ValidationError::MissingField("auth.api_keys".to_string()));
                }
                AuthMode::BearerToken if auth.jwt_secret.as_deref().map_or(true, str::is_empty) => {
                    errors.push(ValidationError::MissingField("auth.jwt_secret".to_string()));
                }
                _ => {}
            }
        }

        if let Some(rate_limit) = &settings.rate_limit {
            if rate_limit.enabled && rate_limit.requests_per_second == 0 {
                errors.push(ValidationError::InvalidValue {
                    field: "rate_limit.requests_per_second".to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
    }

    fn validate_llm(field: &str, llm: &LlmProviderConfig, errors: &mut Vec<ValidationError>) {
        if llm.model.trim().is_empty() {
            errors.push(ValidationError::MissingField(format!("{}.model", field)));
        }
        if let Some(base_url) = &llm.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                errors.push(ValidationError::InvalidValue {
                    field: format!("{}.base_url", field),
                    reason: format!("'{}' is not an http(s) URL", base_url),
                });
            }
        }
        if llm.timeout_seconds == 0 {
            errors.push(ValidationError::InvalidValue {
                field: format!("{}.timeout_seconds", field),
                reason: "must be greater than 0".to_string(),
            });
        }
    }

    fn validate_supervisor(settings: &Settings, errors: &mut Vec<ValidationError>) {
        if let Some(template) = &settings.supervisor.system_prompt {
            let roster: Vec<RosterEntry> = settings
                .agents
                .iter()
                .map(|(kind, agent)| RosterEntry {
                    name: kind.as_str().to_string(),
                    description: agent.description.clone(),
                })
                .collect();
            if let Err(e) = prompts::render_supervisor_prompt(template, &roster) {
                errors.push(ValidationError::InvalidValue {
                    field: "supervisor.system_prompt".to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    fn validate_workers(settings: &Settings, errors: &mut Vec<ValidationError>) {
        for (kind, agent) in settings.agents.iter() {
            let prefix = format!("agents.{}", kind);

            if agent.description.trim().is_empty() {
                errors.push(ValidationError::MissingField(format!("{}.description", prefix)));
            }
            if agent.max_iterations == 0 {
                errors.push(ValidationError::InvalidValue {
                    field: format!("{}.max_iterations", prefix),
                    reason: "must be at least 1".to_string(),
                });
            }
            if agent.timeout_seconds == 0 {
                errors.push(ValidationError::InvalidValue {
                    field: format!("{}.timeout_seconds", prefix),
                    reason: "must be greater than 0".to_string(),
                });
            }
            if let Some(llm) = &agent.llm {
                Self::validate_llm(&format!("{}.llm", prefix), llm, errors);
            }

            let mut seen = HashSet::new();
            for tool in &agent.tools {
                if !KNOWN_TOOLS.contains(&tool.as_str()) {
                    errors.push(ValidationError::CrossReference(format!(
                        "{} references unknown tool '{}' (known: {})",
                        prefix,
                        tool,
                        KNOWN_TOOLS.join(", ")
                    )));
                }
                if !seen.insert(tool) {
                    errors.push(ValidationError::Duplicate(format!(
                        "{} lists tool '{}' more than once",
                        prefix, tool
                    )));
                }
            }
        }
    }

    fn validate_tools(settings: &Settings, errors: &mut Vec<ValidationError>) {
        let tools = &settings.tools;

        if tools.search.max_results == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "tools.search.max_results".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if tools.scrape.max_chars == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "tools.scrape.max_chars".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if tools.files.sandbox_dir.as_os_str().is_empty() {
            errors.push(ValidationError::MissingField("tools.files.sandbox_dir".to_string()));
        }
        if tools.retrieval.top_k == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "tools.retrieval.top_k".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let retrieval_used = settings
            .agents
            .iter()
            .any(|(_, agent)| agent.tools.iter().any(|t| t == retrieval::TOOL_NAME));
        if retrieval_used && tools.retrieval.index_host.trim().is_empty() {
            errors.push(ValidationError::MissingField(
                "tools.retrieval.index_host".to_string(),
            ));
        }
    }

    fn validate_dispatch(settings: &Settings, errors: &mut Vec<ValidationError>) {
        if settings.dispatch.mode == DispatchMode::Bounded && settings.dispatch.max_steps == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "dispatch.max_steps".to_string(),
                reason: "bounded mode needs at least one step".to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::DispatchConfig;

    fn valid() -> Settings {
        let mut settings = Settings::default();
        settings.tools.retrieval.index_host = "docs-abc.svc.pinecone.io".to_string();
        settings
    }

    #[test]
    fn defaults_with_index_host_are_valid() {
        assert!(ConfigValidator::validate(&valid()).is_ok());
    }

    #[test]
    fn invalid_port() {
        let mut settings = valid();
        settings.server.port = 0;
        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn retrieval_needs_index_host() {
        let errors = ConfigValidator::validate(&Settings::default()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("tools.retrieval.index_host")));

        let mut settings = Settings::default();
        settings.agents.rag_agent.tools.clear();
        assert!(ConfigValidator::validate(&settings).is_ok());
    }

    #[test]
    fn unknown_and_duplicate_tools() {
        let mut settings = valid();
        settings.agents.researcher.tools = vec![
            "web_search".to_string(),
            "shell".to_string(),
            "web_search".to_string(),
        ];
        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::CrossReference(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Duplicate(_))));
    }

    #[test]
    fn bounded_dispatch_needs_steps() {
        let mut settings = valid();
        settings.dispatch = DispatchConfig::bounded(0);
        assert!(ConfigValidator::validate(&settings).is_err());
    }

    #[test]
    fn enabled_api_key_auth_needs_keys() {
        let mut settings = valid();
        settings.auth.enabled = true;
        settings.auth.mode = AuthMode::ApiKey;
        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert!(errors[0].to_string().contains("auth.api_keys"));
    }

    #[test]
    fn broken_supervisor_template_is_reported() {
        let mut settings = valid();
        settings.supervisor.system_prompt = Some("{% if %}".to_string());
        assert!(ConfigValidator::validate(&settings).is_err());
    }
}
