//! Generators that lay down starter files for third-party agent frameworks.
//!
//! Template bodies are opaque; the interesting part is that every generated
//! relative path — including ones built from a caller-supplied agent or chain
//! name — goes through the sandbox before anything is written.

use crate::{
    errors::AppError,
    mcp::registry::Tool,
    sandbox::{self, Sandbox},
    tools::{fs_write::write_text, optional_str, required_str},
};
use async_trait::async_trait;
use serde_json::json;
use std::fs;

const CREWAI_MAIN: &str = include_str!("../../templates/crewai_main.py");
const CREWAI_AGENT: &str = include_str!("../../templates/crewai_agent.py");
const LANGCHAIN_CHAIN: &str = include_str!("../../templates/langchain_chain.py");
const AG2_SETUP: &str = include_str!("../../templates/ag2_setup.py");

pub struct CrewaiProjectTool {
    sandbox: Sandbox,
}

impl CrewaiProjectTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for CrewaiProjectTool {
    fn name(&self) -> &'static str { "scaffold_crewai_project" }

    fn capabilities(&self) -> serde_json::Value {
        json!({
            "input": {"type":"object","properties": {"project": {"type":"string"}}},
            "output": {"type":"object","properties": {"root":{"type":"string"},"created":{"type":"array","items":{"type":"string"}}}}
        })
    }

    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        let root = self.sandbox.root_for(optional_str(&params, "project"))?;
        let mut created = Vec::new();
        for dir in ["agents", "tasks", "tools"] {
            let full = sandbox::resolve(&root, dir)?;
            fs::create_dir_all(&full).map_err(|e| {
                tracing::warn!(path = %full.display(), error = %e, "mkdir failed");
                AppError::Internal("scaffold failed".into())
            })?;
            created.push(dir.to_string());
        }
        let main_py = sandbox::resolve(&root, "main.py")?;
        write_text(&main_py, CREWAI_MAIN)?;
        created.push("main.py".to_string());
        Ok(json!({"root": root.display().to_string(), "created": created}))
    }
}

pub struct CrewaiAgentTool {
    sandbox: Sandbox,
}

impl CrewaiAgentTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for CrewaiAgentTool {
    fn name(&self) -> &'static str { "scaffold_crewai_agent" }

    fn capabilities(&self) -> serde_json::Value {
        json!({
            "input": {"type":"object","required":["agent_name","role","goal","backstory"],"properties": {
                "project": {"type":"string"},
                "agent_name": {"type":"string"},
                "role": {"type":"string"},
                "goal": {"type":"string"},
                "backstory": {"type":"string"}
            }},
            "output": {"type":"object","properties": {"path":{"type":"string"}}}
        })
    }

    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        let agent_name = required_str(&params, "agent_name")?;
        let code = CREWAI_AGENT
            .replace("{agent_name}", agent_name)
            .replace("{role}", required_str(&params, "role")?)
            .replace("{goal}", required_str(&params, "goal")?)
            .replace("{backstory}", required_str(&params, "backstory")?);
        let root = self.sandbox.root_for(optional_str(&params, "project"))?;
        // agent_name lands in a filename; it gets no more trust than any
        // other caller-supplied path.
        let full = sandbox::resolve(&root, &format!("agents/{agent_name}.py"))?;
        write_text(&full, &code)?;
        Ok(json!({"path": full.display().to_string()}))
    }
}

pub struct LangchainChainTool {
    sandbox: Sandbox,
}

impl LangchainChainTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for LangchainChainTool {
    fn name(&self) -> &'static str { "scaffold_langchain_chain" }

    fn capabilities(&self) -> serde_json::Value {
        json!({
            "input": {"type":"object","required":["chain_name","prompt_template"],"properties": {
                "project": {"type":"string"},
                "chain_name": {"type":"string"},
                "prompt_template": {"type":"string"}
            }},
            "output": {"type":"object","properties": {"path":{"type":"string"}}}
        })
    }

    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        let chain_name = required_str(&params, "chain_name")?;
        let code = LANGCHAIN_CHAIN
            .replace("{chain_name}", chain_name)
            .replace("{prompt_template}", required_str(&params, "prompt_template")?);
        let root = self.sandbox.root_for(optional_str(&params, "project"))?;
        let full = sandbox::resolve(&root, &format!("chains/{chain_name}.py"))?;
        write_text(&full, &code)?;
        Ok(json!({"path": full.display().to_string()}))
    }
}

pub struct Ag2SetupTool {
    sandbox: Sandbox,
}

impl Ag2SetupTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for Ag2SetupTool {
    fn name(&self) -> &'static str { "scaffold_ag2_setup" }

    fn capabilities(&self) -> serde_json::Value {
        json!({
            "input": {"type":"object","properties": {"project": {"type":"string"}}},
            "output": {"type":"object","properties": {"path":{"type":"string"}}}
        })
    }

    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        let root = self.sandbox.root_for(optional_str(&params, "project"))?;
        let full = sandbox::resolve(&root, "ag2_setup.py")?;
        write_text(&full, AG2_SETUP)?;
        Ok(json!({"path": full.display().to_string()}))
    }
}
