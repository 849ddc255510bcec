//! Tool references and canonical tool names.
//!
//! A reference has the form `source/relative/file.json[::routeName]`. Without
//! a route it stands for every route of the file; expansion happens where the
//! reference is used, never while parsing. Canonical names are
//! `{snake_case(route)}_{namespace}`.

use std::{error::Error, fmt, str::FromStr};

use flowmcp_store::schema::{ROUTE_SEPARATOR, make_tool_ref};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    Empty,
    MissingSource(String),
    MissingFile(String),
    EmptyRoute(String),
    MultipleRoutes(String),
    InvalidPath(String),
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "tool reference is empty"),
            Self::MissingSource(raw) => write!(
                f,
                "tool reference \"{raw}\" has no source (expected source/file[::route])"
            ),
            Self::MissingFile(raw) => write!(f, "tool reference \"{raw}\" has no schema file"),
            Self::EmptyRoute(raw) => {
                write!(f, "tool reference \"{raw}\" has an empty route after {ROUTE_SEPARATOR}")
            }
            Self::MultipleRoutes(raw) => write!(
                f,
                "tool reference \"{raw}\" contains more than one {ROUTE_SEPARATOR} separator"
            ),
            Self::InvalidPath(raw) => {
                write!(f, "tool reference \"{raw}\" does not name a file inside its source")
            }
        }
    }
}

impl Error for ReferenceError {}

/// Parsed `source/file[::route]` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolRef {
    pub source: String,
    pub file: String,
    pub route: Option<String>,
}

impl ToolRef {
    /// Parses a reference string.
    ///
    /// # Errors
    /// Returns `ReferenceError` when the source, file, or route part is missing
    /// or malformed, or when more than one `::` separator is present.
    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReferenceError::Empty);
        }

        let mut parts = trimmed.split(ROUTE_SEPARATOR);
        let location = parts.next().unwrap_or_default();
        let route = parts.next();
        if parts.next().is_some() {
            return Err(ReferenceError::MultipleRoutes(trimmed.to_string()));
        }

        let route = match route.map(str::trim) {
            Some("") => return Err(ReferenceError::EmptyRoute(trimmed.to_string())),
            Some(route) => Some(route.to_string()),
            None => None,
        };

        let Some((source, file)) = location.split_once('/') else {
            return Err(ReferenceError::MissingFile(trimmed.to_string()));
        };
        if source.trim().is_empty() {
            return Err(ReferenceError::MissingSource(trimmed.to_string()));
        }
        if file.trim().is_empty() {
            return Err(ReferenceError::MissingFile(trimmed.to_string()));
        }
        if file
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(ReferenceError::InvalidPath(trimmed.to_string()));
        }

        Ok(Self {
            source: source.trim().to_string(),
            file: file.trim().to_string(),
            route,
        })
    }

    #[must_use]
    pub fn new(source: impl Into<String>, file: impl Into<String>, route: Option<String>) -> Self {
        Self {
            source: source.into(),
            file: file.into(),
            route,
        }
    }

    #[must_use]
    pub fn with_route(&self, route: &str) -> Self {
        Self {
            source: self.source.clone(),
            file: self.file.clone(),
            route: Some(route.to_string()),
        }
    }

    /// The same reference without its route part.
    #[must_use]
    pub fn file_ref(&self) -> Self {
        Self {
            source: self.source.clone(),
            file: self.file.clone(),
            route: None,
        }
    }

    /// Whether this reference names the same schema file as `other`.
    #[must_use]
    pub fn same_file(&self, other: &Self) -> bool {
        self.source == other.source && self.file == other.file
    }
}

impl fmt::Display for ToolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&make_tool_ref(&self.source, &self.file, self.route.as_deref()))
    }
}

impl FromStr for ToolRef {
    type Err = ReferenceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

/// Converts `getStatus` to `get_status`. Hyphens and spaces become underscores.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.trim().chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch == ' ' {
            out.push('_');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Canonical tool name for a route within a namespace.
#[must_use]
pub fn to_canonical_name(route: &str, namespace: &str) -> String {
    format!("{}_{}", to_snake_case(route), namespace.trim())
}

/// Returns the first candidate whose canonical name equals `name`.
///
/// Candidates are visited in their given order; there is no ranking, so on a
/// collision the earliest entry wins.
pub fn find_first_match<'a, T: 'a>(
    candidates: impl IntoIterator<Item = &'a T>,
    name: &str,
    key: impl Fn(&T) -> (&str, &str),
) -> Option<&'a T> {
    candidates.into_iter().find(|&candidate| {
        let (route, namespace) = key(candidate);
        to_canonical_name(route, namespace) == name
    })
}
