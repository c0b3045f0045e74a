use crate::{errors::AppError, mcp::registry::Tool, tools::optional_str};
use async_trait::async_trait;
use serde_json::json;

pub struct PingTool;

#[async_trait]
impl Tool for PingTool {
    fn name(&self) -> &'static str { "ping" }

    fn capabilities(&self) -> serde_json::Value {
        json!({
            "input": {"type":"object","properties": {"message": {"type":"string"}}},
            "output": {"type":"object","properties": {"pong":{"type":"boolean"},"message":{"type":"string"}}}
        })
    }

    async fn call(&self, params: serde_json::Value) -> Result<serde_json::Value, AppError> {
        let message = optional_str(&params, "message").unwrap_or("pong");
        Ok(json!({"pong": true, "message": message}))
    }
}
