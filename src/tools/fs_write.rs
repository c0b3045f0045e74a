use crate::{
    errors::AppError,
    mcp::registry::Tool,
    sandbox::{self, Sandbox},
    tools::{optional_str, required_str},
};
use async_trait::async_trait;
use serde_json::json;
use std::fs;
use std::path::Path;

pub struct FsWriteTool {
    sandbox: Sandbox,
}

impl FsWriteTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for FsWriteTool {
    fn name(&self) -> &'static str { "fs_write" }

    fn capabilities(&self) -> serde_json::Value {
        json!({
            "input": {"type":"object","required":["path","content"],"properties": {"project": {"type":"string"},"path": {"type":"string"},"content": {"type":"string"}}},
            "output": {"type":"object","properties": {"path":{"type":"string"},"bytes_written":{"type":"integer"}}}
        })
    }

    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        let path = required_str(&params, "path")?;
        let content = required_str(&params, "content")?;
        let root = self.sandbox.root_for(optional_str(&params, "project"))?;
        let full = sandbox::resolve(&root, path)?;
        write_text(&full, content)?;
        Ok(json!({"path": full.display().to_string(), "bytes_written": content.len()}))
    }
}

/// Create parent directories and write (overwriting) a resolved path. Callers
/// must have run the path through the sandbox already.
pub(crate) fn write_text(full: &Path, content: &str) -> Result<(), AppError> {
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            tracing::warn!(path = %full.display(), error = %e, "mkdir failed");
            AppError::Internal("write failed".into())
        })?;
    }
    fs::write(full, content.as_bytes()).map_err(|e| {
        tracing::warn!(path = %full.display(), error = %e, "write failed");
        AppError::Internal("write failed".into())
    })
}
