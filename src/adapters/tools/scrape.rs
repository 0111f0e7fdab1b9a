use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{check_status, http_client, parse_args, schema_for, ToolAdapter, ToolError};
use crate::config::tools::ScrapeConfig;
use crate::domain::Tool;

pub const TOOL_NAME: &str = "scrape_url";

/// Appended when the cleaned text exceeds the character budget
pub const TRUNCATION_MARKER: &str = "\n...[truncated]";

/// Strips markup from an HTML document, leaving one text run per line
pub struct HtmlCleaner {
    hidden: Vec<Regex>,
    tag: Regex,
}

impl HtmlCleaner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            hidden: vec![
                Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>")?,
                Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>")?,
                Regex::new(r"(?is)<noscript\b[^>]*>.*?</noscript\s*>")?,
                Regex::new(r"(?s)<!--.*?-->")?,
            ],
            tag: Regex::new(r"(?s)<[^>]*>")?,
        })
    }

    /// Remove script, style and noscript blocks and every tag, then trim each
    /// line and drop the blank ones.
    pub fn clean(&self, html: &str) -> String {
        let mut text = html.to_string();
        for re in &self.hidden {
            text = re.replace_all(&text, "\n").into_owned();
        }
        let text = self.tag.replace_all(&text, "\n");

        text.lines()
            .map(|line| decode_entities(line.trim()))
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn decode_entities(line: &str) -> String {
    if !line.contains('&') {
        return line.to_string();
    }
    line.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Cut `text` to `max_chars` characters plus the marker.
///
/// Text at or under the budget comes back unchanged.
pub fn truncate_chars(text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        None => (text, false),
        Some((cut, _)) => {
            let mut truncated = text[..cut].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            (truncated, true)
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ScrapeArgs {
    /// Absolute http(s) URL of the page to read
    url: String,
}

/// `scrape_url` tool
pub struct ScrapeTool {
    client: reqwest::Client,
    cleaner: HtmlCleaner,
    max_chars: usize,
}

impl ScrapeTool {
    pub fn new(config: &ScrapeConfig) -> Result<Self, ToolError> {
        Ok(Self {
            client: http_client(config.timeout_seconds, Some(&config.user_agent))?,
            cleaner: HtmlCleaner::new().map_err(|e| ToolError::Parse(e.to_string()))?,
            max_chars: config.max_chars,
        })
    }

    /// Clean and truncate a fetched page body
    pub fn extract(&self, body: &str) -> (String, bool) {
        truncate_chars(self.cleaner.clean(body), self.max_chars)
    }
}

#[async_trait]
impl ToolAdapter for ScrapeTool {
    fn definition(&self) -> Tool {
        Tool {
            name: TOOL_NAME.to_string(),
            description: "Download a web page and return its readable text with scripts, styles and markup removed."
                .to_string(),
            input_schema: schema_for::<ScrapeArgs>(),
            output_schema: None,
        }
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: ScrapeArgs = parse_args(args)?;
        let url = args.url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArguments(
                "url must start with http:// or https://".to_string(),
            ));
        }

        let response = check_status(self.client.get(url).send().await?).await?;
        let body = response.text().await?;
        let (text, truncated) = self.extract(&body);
        tracing::debug!(url, chars = text.len(), truncated, "page scraped");

        Ok(json!({ "url": url, "text": text, "truncated": truncated }))
    }
}
