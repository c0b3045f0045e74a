use crate::{config::Config, errors::AppError, sandbox::Sandbox};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

pub type DynTool = Arc<dyn Tool + Send + Sync + 'static>;

#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<(String, DynTool)>,
}

impl ToolRegistry {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        use crate::tools::{
            fs_list::FsListTool,
            fs_read::FsReadTool,
            fs_write::FsWriteTool,
            ping::PingTool,
            scaffold::{Ag2SetupTool, CrewaiAgentTool, CrewaiProjectTool, LangchainChainTool},
        };
        let sandbox = Sandbox::new(cfg.workspace.clone());
        let entries: Vec<DynTool> = vec![
            Arc::new(PingTool),
            Arc::new(FsReadTool::new(sandbox.clone())),
            Arc::new(FsWriteTool::new(sandbox.clone())),
            Arc::new(FsListTool::new(sandbox.clone())),
            Arc::new(CrewaiProjectTool::new(sandbox.clone())),
            Arc::new(CrewaiAgentTool::new(sandbox.clone())),
            Arc::new(LangchainChainTool::new(sandbox.clone())),
            Arc::new(Ag2SetupTool::new(sandbox)),
        ];
        let mut tools: Vec<(String, DynTool)> = entries
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();
        tools.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Self { tools })
    }

    pub fn get(&self, name: &str) -> Option<DynTool> {
        self.tools.iter().find(|(n, _)| n == name).map(|(_, t)| t.clone())
    }

    pub fn list_names(&self) -> Vec<String> {
        self.tools.iter().map(|(n, _)| n.clone()).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub id: String,
    pub tool: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub stream: bool,
}

#[async_trait]
pub trait Tool {
    fn name(&self) -> &'static str;
    fn capabilities(&self) -> serde_json::Value;
    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError>;
    async fn call_stream(&self, _params: serde_json::Value) -> Result<crate::server::StreamBody, AppError> {
        Err(AppError::ToolError("streaming not supported".into()))
    }
}
