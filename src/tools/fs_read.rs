use crate::{
    errors::AppError,
    mcp::registry::Tool,
    sandbox::{self, Sandbox},
    tools::{optional_str, required_str},
};
use async_trait::async_trait;
use serde_json::json;
use std::fs;

pub struct FsReadTool {
    sandbox: Sandbox,
}

impl FsReadTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for FsReadTool {
    fn name(&self) -> &'static str { "fs_read" }

    fn capabilities(&self) -> serde_json::Value {
        json!({
            "input": {"type":"object","required":["path"],"properties": {"project": {"type":"string"},"path": {"type":"string"}}},
            "output": {"type":"object","properties": {"path":{"type":"string"},"content":{"type":"string"}}}
        })
    }

    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        let path = required_str(&params, "path")?;
        let root = self.sandbox.root_for(optional_str(&params, "project"))?;
        let full = sandbox::resolve(&root, path)?;
        // NotFound stays distinct from the containment denial; other I/O
        // detail goes to the log, not the caller.
        let content = fs::read_to_string(&full).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound
            } else {
                tracing::warn!(path = %full.display(), error = %e, "read failed");
                AppError::Internal("read failed".into())
            }
        })?;
        Ok(json!({"path": full.display().to_string(), "content": content}))
    }
}
