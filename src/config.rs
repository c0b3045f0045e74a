use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub workspace: Workspace,
    pub server: Server,
    pub auth: Auth,
    pub limits: Limits,
}

/// Where tool calls are rooted. `Fixed` pins one process-wide root; `Parent`
/// roots each call at `parent_dir/<project>` with the folder created on demand.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum Workspace {
    Fixed { root_dir: PathBuf },
    Parent { parent_dir: PathBuf },
}

impl Workspace {
    pub fn base_dir(&self) -> &Path {
        match self {
            Workspace::Fixed { root_dir } => root_dir,
            Workspace::Parent { parent_dir } => parent_dir,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub bind_addr: String,
    pub port: u16,
    #[serde(default = "default_base_path")]
    pub base_path: String,
}
fn default_base_path() -> String { "/mcp".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct Auth {
    pub bearer_token: String,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Limits {
    pub max_request_kb: usize,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.workspace.base_dir().is_absolute() {
            anyhow::bail!(
                "workspace dir must be absolute: {}",
                self.workspace.base_dir().display()
            );
        }
        if self.auth.bearer_token.trim().is_empty() { anyhow::bail!("bearer_token must not be empty"); }
        if self.auth.allowed_origins.is_empty() { anyhow::bail!("allowed_origins must not be empty"); }
        if self.limits.max_request_kb == 0 { anyhow::bail!("max_request_kb must be > 0"); }
        Ok(())
    }
}
