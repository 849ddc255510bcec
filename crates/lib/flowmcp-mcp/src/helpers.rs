use std::borrow::Cow;

use flowmcp_core::CoreError;
use rmcp::ErrorData;
use rmcp::model::ErrorCode;
use serde_json::{Map, Value};

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

pub(crate) fn map_err(err: CoreError) -> ErrorData {
    let code = match &err {
        CoreError::NotFound(_) => ErrorCode::RESOURCE_NOT_FOUND,
        CoreError::InvalidInput(_) => ErrorCode::INVALID_PARAMS,
        _ => ErrorCode::INTERNAL_ERROR,
    };
    mcp_err(code, err.to_string())
}

/// Tool arguments must be a JSON object; absent or null means none.
pub(crate) fn arguments(value: Option<Value>) -> Result<Map<String, Value>, ErrorData> {
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(mcp_err(
            ErrorCode::INVALID_PARAMS,
            format!("arguments must be a JSON object, got {other}"),
        )),
    }
}
