//! Structural extraction of route parameters.
//!
//! Descriptors are read straight from the declarative `z` annotation of each
//! parameter. Nothing here evaluates schema validation logic; the schema
//! runtime stays responsible for validating values at call time.

use flowmcp_store::{ParamLocation, ParamSpec, Route};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Enum,
    Array,
    Object,
}

impl ParamKind {
    const fn json_type(self) -> &'static str {
        match self {
            Self::String | Self::Enum => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// Normalized description of a user parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(skip)]
    pub location: ParamLocation,
}

/// Describes every user parameter of a route, in declaration order.
#[must_use]
pub fn extract_parameters(route: &Route) -> Vec<ParamDescriptor> {
    route
        .parameters
        .iter()
        .filter(|spec| spec.is_user_param())
        .map(describe_parameter)
        .collect()
}

#[must_use]
pub fn describe_parameter(spec: &ParamSpec) -> ParamDescriptor {
    let name = spec.position.key.clone();
    let location = spec.position.location;

    let Some(annotation) = spec.z.as_ref() else {
        return ParamDescriptor {
            name,
            kind: ParamKind::String,
            required: true,
            default: None,
            values: None,
            location,
        };
    };

    let (kind, values) = parse_primitive(&annotation.primitive).unwrap_or((ParamKind::String, None));
    let mut required = true;
    let mut default = None;
    for option in &annotation.options {
        let option = option.trim();
        if option == "optional()" {
            required = false;
        } else if let Some(raw) = call_argument(option, "default") {
            required = false;
            default = Some(default_value(raw, kind));
        }
    }

    ParamDescriptor {
        name,
        kind,
        required,
        default,
        values,
        location,
    }
}

/// Parses a primitive annotation such as `number()` or `enum(a,b)`.
///
/// Returns `None` for annotations that are not recognized.
#[must_use]
pub fn parse_primitive(primitive: &str) -> Option<(ParamKind, Option<Vec<String>>)> {
    let primitive = primitive.trim();
    if let Some(raw) = call_argument(primitive, "enum") {
        let values = raw
            .split(',')
            .map(|value| unquote(value.trim()).to_string())
            .filter(|value| !value.is_empty())
            .collect();
        return Some((ParamKind::Enum, Some(values)));
    }

    let name = primitive.split('(').next().unwrap_or_default().trim();
    let kind = match name {
        "string" => ParamKind::String,
        "number" => ParamKind::Number,
        "boolean" => ParamKind::Boolean,
        "array" => ParamKind::Array,
        "object" => ParamKind::Object,
        _ => return None,
    };
    Some((kind, None))
}

/// Builds a JSON Schema object describing the parameters, for tool listings.
#[must_use]
pub fn to_input_schema(params: &[ParamDescriptor]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in params {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(param.kind.json_type()));
        if let Some(values) = &param.values {
            property.insert("enum".to_string(), json!(values));
        }
        if let Some(default) = &param.default {
            property.insert("default".to_string(), default.clone());
        }
        properties.insert(param.name.clone(), Value::Object(property));
        if param.required {
            required.push(param.name.clone());
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn call_argument<'a>(raw: &'a str, function: &str) -> Option<&'a str> {
    raw.strip_prefix(function)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
        .map(str::trim)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|inner| inner.strip_suffix('\'')))
        .unwrap_or(value)
}

fn default_value(raw: &str, kind: ParamKind) -> Value {
    match kind {
        ParamKind::Number => raw
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| raw.parse::<f64>().map(Value::from))
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        ParamKind::Boolean => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        ParamKind::Array | ParamKind::Object => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
        ParamKind::String | ParamKind::Enum => Value::String(unquote(raw).to_string()),
    }
}
