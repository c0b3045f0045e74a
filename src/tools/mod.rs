pub mod fs_list;
pub mod fs_read;
pub mod fs_write;
pub mod ping;
pub mod scaffold;

use crate::errors::AppError;

pub(crate) fn required_str<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, AppError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::ToolError(format!("missing {key}")))
}

pub(crate) fn optional_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}
