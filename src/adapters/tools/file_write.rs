use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_args, schema_for, ToolAdapter, ToolError};
use crate::config::tools::FileWriteConfig;
use crate::domain::Tool;

pub const TOOL_NAME: &str = "write_file";

#[derive(Debug, Deserialize, JsonSchema)]
struct WriteArgs {
    /// Relative file name inside the workspace, e.g. `notes/summary.md`
    filename: String,
    /// Text to write; replaces any existing file
    content: String,
}

/// `write_file` tool confined to a sandbox directory
pub struct FileWriteTool {
    sandbox: PathBuf,
    max_bytes: usize,
}

impl FileWriteTool {
    pub fn new(config: &FileWriteConfig) -> Self {
        Self {
            sandbox: config.sandbox_dir.clone(),
            max_bytes: config.max_bytes,
        }
    }

    /// Resolve a model-supplied name to a path under the sandbox.
    ///
    /// Only plain relative components are accepted.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, ToolError> {
        let trimmed = filename.trim();
        if trimmed.is_empty() {
            return Err(ToolError::PathRejected("filename is empty".to_string()));
        }

        let requested = Path::new(trimmed);
        let mut relative = PathBuf::new();
        for component in requested.components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(ToolError::PathRejected(format!("{} escapes the workspace", trimmed)))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(ToolError::PathRejected(format!("{} is absolute", trimmed)))
                }
            }
        }
        if relative.as_os_str().is_empty() {
            return Err(ToolError::PathRejected(format!("{} names no file", trimmed)));
        }

        Ok(self.sandbox.join(relative))
    }

    async fn write(&self, path: &Path, content: &str) -> Result<(), ToolError> {
        tokio::fs::create_dir_all(&self.sandbox).await?;
        let root = tokio::fs::canonicalize(&self.sandbox).await?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
            // Catch symlinked directories pointing outside the sandbox
            let parent = tokio::fs::canonicalize(parent).await?;
            if !parent.starts_with(&root) {
                return Err(ToolError::PathRejected(format!(
                    "{} resolves outside the workspace",
                    path.display()
                )));
            }
        }

        // A symlink at the target name would be followed by the write
        if let Ok(meta) = tokio::fs::symlink_metadata(path).await {
            if meta.file_type().is_symlink() {
                return Err(ToolError::PathRejected(format!(
                    "{} is a symbolic link",
                    path.display()
                )));
            }
        }

        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl ToolAdapter for FileWriteTool {
    fn definition(&self) -> Tool {
        Tool {
            name: TOOL_NAME.to_string(),
            description: "Save text to a file in the assistant's workspace directory.".to_string(),
            input_schema: schema_for::<WriteArgs>(),
            output_schema: None,
        }
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: WriteArgs = parse_args(args)?;
        if args.content.len() > self.max_bytes {
            return Err(ToolError::InvalidArguments(format!(
                "content is {} bytes, limit is {}",
                args.content.len(),
                self.max_bytes
            )));
        }

        let path = self.resolve(&args.filename)?;
        self.write(&path, &args.content).await?;
        tracing::info!(path = %path.display(), bytes = args.content.len(), "file written");

        Ok(Value::String(format!(
            "File {} created successfully.",
            args.filename.trim()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn tool(dir: &TempDir) -> FileWriteTool {
        FileWriteTool::new(&FileWriteConfig {
            sandbox_dir: dir.path().join("workspace"),
            max_bytes: 64,
        })
    }

    #[tokio::test]
    async fn writes_inside_the_sandbox() {
        let dir = TempDir::new().unwrap();
        let output = tool(&dir)
            .call(json!({"filename": "notes/today.md", "content": "hello"}))
            .await
            .unwrap();

        assert_eq!(output, json!("File notes/today.md created successfully."));
        let written = std::fs::read_to_string(dir.path().join("workspace/notes/today.md")).unwrap();
        assert_eq!(written, "hello");
    }

    #[test]
    fn rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let tool = tool(&dir);
        for name in ["../outside.txt", "a/../../b.txt", "/etc/passwd", "", "  ", "."] {
            assert!(
                matches!(tool.resolve(name), Err(ToolError::PathRejected(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn current_dir_components_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = tool(&dir).resolve("./report.txt").unwrap();
        assert_eq!(path, dir.path().join("workspace").join("report.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_target_is_not_followed() {
        let dir = TempDir::new().unwrap();
        let outside = dir.path().join("outside.txt");
        std::fs::write(&outside, "original").unwrap();
        std::fs::create_dir_all(dir.path().join("workspace")).unwrap();
        std::os::unix::fs::symlink(&outside, dir.path().join("workspace/link.txt")).unwrap();

        let err = tool(&dir)
            .call(json!({"filename": "link.txt", "content": "overwritten"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::PathRejected(_)));
        assert_eq!(std::fs::read_to_string(&outside).unwrap(), "original");
    }

    #[tokio::test]
    async fn oversized_content_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = tool(&dir)
            .call(json!({"filename": "big.txt", "content": "x".repeat(65)}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(!dir.path().join("workspace/big.txt").exists());
    }
}
