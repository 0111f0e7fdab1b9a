use std::collections::BTreeSet;
use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub mod tools;
pub mod validator;

use crate::agents::config::{DispatchConfig, LlmProviderConfig, SupervisorConfig, WorkersConfig};
use crate::cli::Cli;
use crate::domain::auth::AuthConfig;
use tools::ToolsConfig;

/// Prefix of environment overrides, e.g. `AIDE_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "AIDE";

/// Everything the service reads at startup. Built once, never reloaded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitConfig>,
    /// Shared LLM settings; the supervisor and workers may override them
    pub llm: LlmProviderConfig,
    pub supervisor: SupervisorConfig,
    pub agents: WorkersConfig,
    pub tools: ToolsConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_second: u32,
    pub burst_size: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Settings {
    /// Load `path` (if present) plus `AIDE_*` environment overrides, then
    /// apply command-line overrides and validate.
    ///
    /// Precedence: CLI > environment > config file > built-in defaults.
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(&cli.config)?;
        settings.apply_cli_overrides(cli);
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate without CLI overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let settings = Self::load(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Merge defaults, the config file and the environment, without validating
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
        }

        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }

    /// LLM settings of every model client the service will build
    pub fn llm_configs(&self) -> Vec<&LlmProviderConfig> {
        let mut configs = vec![&self.llm];
        configs.extend(self.supervisor.llm.as_ref());
        configs.extend(self.agents.iter().filter_map(|(_, agent)| agent.llm.as_ref()));
        configs
    }

    /// Environment variables holding the credentials this configuration uses
    pub fn credential_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .llm_configs()
            .into_iter()
            .filter_map(|llm| llm.api_key_env.clone())
            .collect();
        names.insert(self.tools.search.api_key_env.clone());
        names.insert(self.tools.retrieval.api_key_env.clone());
        names.extend(self.tools.retrieval.embedding.api_key_env.clone());
        names
    }

    /// Effective configuration as TOML. Credentials are referenced by
    /// variable name only, so the output holds no secrets except auth keys,
    /// which are masked.
    pub fn to_toml(&self) -> Result<String, anyhow::Error> {
        let mut redacted = self.clone();
        if let Some(keys) = redacted.auth.api_keys.as_mut() {
            keys.iter_mut().for_each(|k| *k = "***".to_string());
        }
        if redacted.auth.jwt_secret.is_some() {
            redacted.auth.jwt_secret = Some("***".to_string());
        }
        Ok(toml::to_string_pretty(&redacted)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::DispatchMode;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = Settings::load("/nonexistent/aide.toml").unwrap();
        assert_eq!(settings.server, ServerSettings::default());
        assert_eq!(settings.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(settings.tools.scrape.max_chars, 5000);
        assert_eq!(settings.tools.retrieval.top_k, 5);
        assert_eq!(settings.dispatch.mode, DispatchMode::OneShot);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = write_config(
            r#"
            [server]
            port = 9100

            [agents.rag_agent]
            description = "Company handbook"
            tools = ["retrieve_documents"]
            max_iterations = 2

            [dispatch]
            mode = "bounded"
            max_steps = 4
            "#,
        );

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.agents.rag_agent.description, "Company handbook");
        assert_eq!(settings.agents.rag_agent.max_iterations, 2);
        assert_eq!(
            settings.agents.researcher.tools,
            vec!["web_search", "scrape_url", "write_file"]
        );
        assert_eq!(settings.dispatch, DispatchConfig::bounded(4));
    }

    #[test]
    fn credential_names_cover_every_backend() {
        let mut settings = Settings::default();
        settings.tools.retrieval.embedding.api_key_env = Some("EMBEDDINGS_KEY".to_string());
        let names: Vec<_> = settings.credential_names().into_iter().collect();
        assert_eq!(
            names,
            vec!["EMBEDDINGS_KEY", "GROQ_API_KEY", "PINECONE_API_KEY", "TAVILY_API_KEY"]
        );
    }

    #[test]
    fn toml_dump_masks_auth_secrets() {
        let mut settings = Settings::default();
        settings.auth.api_keys = Some(vec!["live-key".to_string()]);
        settings.auth.jwt_secret = Some("hmac".to_string());

        let dumped = settings.to_toml().unwrap();
        assert!(!dumped.contains("live-key"));
        assert!(!dumped.contains("hmac"));
        assert!(dumped.contains("GROQ_API_KEY"));
    }
}
