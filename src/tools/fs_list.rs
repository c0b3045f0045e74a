use crate::{errors::AppError, mcp::registry::Tool, sandbox::Sandbox, tools::optional_str};
use async_trait::async_trait;
use serde_json::json;
use std::fs;

pub struct FsListTool {
    sandbox: Sandbox,
}

impl FsListTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for FsListTool {
    fn name(&self) -> &'static str { "fs_list" }

    fn capabilities(&self) -> serde_json::Value {
        json!({
            "input": {"type":"object","properties": {"project": {"type":"string"}}},
            "output": {"type":"object","properties": {"files":{"type":"array","items":{"type":"string"}}}}
        })
    }

    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        let root = self.sandbox.root_for(optional_str(&params, "project"))?;
        // Immediate entries of the trusted root only, regular files only. An
        // enumeration failure yields an empty set rather than an error.
        let mut files: Vec<String> = Vec::new();
        if let Ok(entries) = fs::read_dir(&root) {
            for entry in entries.flatten() {
                if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    files.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }
        files.sort();
        Ok(json!({"files": files}))
    }
}
