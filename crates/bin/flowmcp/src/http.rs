//! Schema runtime that performs the outbound HTTP request with reqwest.

use std::time::Duration;

use async_trait::async_trait;
use flowmcp_core::params::describe_parameter;
use flowmcp_core::{PreparedCall, RuntimeError, SchemaRuntime};
use flowmcp_store::ParamLocation;
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use tracing::debug;

const MAX_ERROR_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct HttpRuntime {
    client: reqwest::Client,
}

impl HttpRuntime {
    /// # Errors
    /// Returns the client build error, e.g. when no TLS backend is available.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("flowmcp/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SchemaRuntime for HttpRuntime {
    async fn invoke(&self, call: &PreparedCall) -> Result<Value, RuntimeError> {
        let plan = plan_request(call)?;
        let method = Method::from_bytes(plan.method.as_bytes())
            .map_err(|_| RuntimeError::new(format!("unsupported method {}", plan.method)))?;
        debug!("{} {}", plan.method, plan.url);

        let mut request = self.client.request(method, &plan.url);
        if !plan.query.is_empty() {
            request = request.query(&plan.query);
        }
        for (name, value) in &plan.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &plan.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| RuntimeError::new(format!("request failed: {err}")))?;
        let status = response.status();
        let text = response.text().await.map_err(|err| {
            RuntimeError::with_status(status.as_u16(), format!("failed to read body: {err}"))
        })?;
        let payload = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| Value::String(text));

        if !status.is_success() {
            return Err(RuntimeError::with_status(
                status.as_u16(),
                error_message(status, &payload),
            ));
        }
        Ok(payload)
    }
}

/// Request parts derived from a prepared call.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestPlan {
    method: String,
    url: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Map<String, Value>>,
}

fn plan_request(call: &PreparedCall) -> Result<RequestPlan, RuntimeError> {
    let root = call
        .root
        .as_deref()
        .map(str::trim)
        .filter(|root| !root.is_empty())
        .ok_or_else(|| RuntimeError::new(format!("schema {} has no root URL", call.namespace)))?;
    let lookup = |name: &str| {
        call.parameters
            .get(name)
            .map(value_text)
            .or_else(|| call.environment.get(name).cloned())
    };

    let mut path = call.route.path.clone();
    let mut query = Vec::new();
    let mut body = Map::new();
    for spec in &call.route.parameters {
        let key = spec.position.key.trim();
        if key.is_empty() {
            continue;
        }
        let value = if spec.is_user_param() {
            match call.parameters.get(key) {
                None | Some(Value::Null) => {
                    if describe_parameter(spec).required {
                        return Err(RuntimeError::new(format!("Missing required parameter \"{key}\"")));
                    }
                    continue;
                }
                Some(value) => value.clone(),
            }
        } else {
            let template = spec.position.value.as_deref().unwrap_or_default();
            Value::String(interpolate(template, lookup))
        };

        match spec.position.location {
            ParamLocation::Insert => {
                path = path.replace(&format!("{{{{{key}}}}}"), &value_text(&value));
            }
            ParamLocation::Query => query.push((key.to_string(), value_text(&value))),
            ParamLocation::Body => {
                body.insert(key.to_string(), value);
            }
        }
    }

    let path = interpolate(&path, lookup);
    if let Some(name) = first_placeholder(&path) {
        return Err(RuntimeError::new(format!(
            "Unresolved placeholder \"{name}\" in path {path}"
        )));
    }

    let headers = call
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), interpolate(value, lookup)))
        .collect();

    Ok(RequestPlan {
        method: call.route.method.to_ascii_uppercase(),
        url: join_url(root, &path),
        query,
        headers,
        body: (!body.is_empty()).then_some(body),
    })
}

/// Replaces `{{name}}` placeholders; unknown names are left in place.
fn interpolate(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        match lookup(after[..end].trim()) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

fn first_placeholder(text: &str) -> Option<&str> {
    let start = text.find("{{")? + 2;
    let end = text[start..].find("}}")?;
    Some(text[start..start + end].trim())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn join_url(root: &str, path: &str) -> String {
    let root = root.trim_end_matches('/');
    if path.is_empty() || path.starts_with('/') {
        format!("{root}{path}")
    } else {
        format!("{root}/{path}")
    }
}

fn error_message(status: StatusCode, payload: &Value) -> String {
    let detail = match payload {
        Value::String(text) => text.clone(),
        Value::Object(map) => ["message", "error", "detail"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map_or_else(|| payload.to_string(), str::to_string),
        other => other.to_string(),
    };
    let detail: String = detail.chars().take(MAX_ERROR_CHARS).collect();
    match status.canonical_reason() {
        Some(reason) if detail.trim().is_empty() => reason.to_string(),
        Some(reason) => format!("{reason}: {detail}"),
        None => detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use flowmcp_store::Route;
    use indexmap::IndexMap;
    use serde_json::json;

    fn prepared(route: Value, parameters: Value) -> PreparedCall {
        let Value::Object(parameters) = parameters else {
            panic!("parameters must be an object");
        };
        let mut headers = IndexMap::new();
        headers.insert("x-api-key".to_string(), "{{DEMO_API_KEY}}".to_string());
        PreparedCall {
            source: "demo".to_string(),
            namespace: "demo".to_string(),
            route_name: "getPrice".to_string(),
            route: serde_json::from_value::<Route>(route).expect("route parses"),
            root: Some("https://api.example.com/v1/".to_string()),
            headers,
            parameters,
            environment: BTreeMap::from([("DEMO_API_KEY".to_string(), "secret".to_string())]),
        }
    }

    #[test]
    fn parameters_are_placed_by_location() {
        let call = prepared(
            json!({
                "method": "post",
                "path": "/coins/{{id}}",
                "parameters": [
                    { "position": { "key": "id", "value": "{{USER_PARAM}}", "location": "insert" },
                      "z": { "primitive": "string()", "options": [] } },
                    { "position": { "key": "vs", "value": "{{USER_PARAM}}", "location": "query" },
                      "z": { "primitive": "array()", "options": [] } },
                    { "position": { "key": "limit", "value": "{{USER_PARAM}}", "location": "body" },
                      "z": { "primitive": "number()", "options": [] } },
                    { "position": { "key": "key", "value": "{{DEMO_API_KEY}}", "location": "query" } }
                ]
            }),
            json!({ "id": "bitcoin", "vs": ["usd", "eur"], "limit": 5 }),
        );

        let plan = plan_request(&call).expect("plan builds");
        assert_eq!(plan.method, "POST");
        assert_eq!(plan.url, "https://api.example.com/v1/coins/bitcoin");
        assert_eq!(
            plan.query,
            vec![
                ("vs".to_string(), "usd,eur".to_string()),
                ("key".to_string(), "secret".to_string()),
            ]
        );
        assert_eq!(plan.headers, vec![("x-api-key".to_string(), "secret".to_string())]);
        assert_eq!(plan.body.map(Value::Object), Some(json!({ "limit": 5 })));
    }

    #[test]
    fn missing_required_parameter_fails_before_sending() {
        let call = prepared(
            json!({
                "method": "GET",
                "path": "/price",
                "parameters": [
                    { "position": { "key": "id", "value": "{{USER_PARAM}}", "location": "query" },
                      "z": { "primitive": "string()", "options": [] } }
                ]
            }),
            json!({}),
        );
        let err = plan_request(&call).expect_err("id is required");
        assert!(err.message.contains("\"id\""));
        assert_eq!(err.http_status, None);
    }

    #[test]
    fn optional_parameters_may_be_absent() {
        let call = prepared(
            json!({
                "method": "GET",
                "path": "/price",
                "parameters": [
                    { "position": { "key": "id", "value": "{{USER_PARAM}}", "location": "query" },
                      "z": { "primitive": "string()", "options": ["optional()"] } }
                ]
            }),
            json!({}),
        );
        let plan = plan_request(&call).expect("plan builds");
        assert!(plan.query.is_empty());
        assert!(plan.body.is_none());
    }

    #[test]
    fn unresolved_path_placeholders_are_errors() {
        let call = prepared(json!({ "method": "GET", "path": "/coins/{{id}}" }), json!({}));
        let err = plan_request(&call).expect_err("id unresolved");
        assert!(err.message.contains("Unresolved placeholder \"id\""));
    }

    #[test]
    fn schema_without_root_is_rejected() {
        let mut call = prepared(json!({ "method": "GET", "path": "/ping" }), json!({}));
        call.root = None;
        assert!(plan_request(&call).is_err());
    }

    #[test]
    fn interpolation_leaves_unknown_names() {
        let lookup = |name: &str| (name == "A").then(|| "1".to_string());
        assert_eq!(interpolate("{{A}}-{{B}}-{{ A }}", lookup), "1-{{B}}-1");
        assert_eq!(interpolate("open {{A", lookup), "open {{A");
    }

    #[test]
    fn error_messages_prefer_api_message_fields() {
        let message = error_message(StatusCode::UNAUTHORIZED, &json!({ "error": "invalid key" }));
        assert_eq!(message, "Unauthorized: invalid key");
        let message = error_message(StatusCode::NOT_FOUND, &Value::String(String::new()));
        assert_eq!(message, "Not Found");
    }
}
