//! Operation manifest: the routes to document and the types they exchange.
//!
//! A manifest is a YAML or JSON file listing HTTP operations. Every `type` field is a Rust
//! type expression (`Page<Employee>`, `Option<u32>`, `Vec<crate::models::Tag>`) resolved
//! against the project's types.
//!
//! ```yaml
//! info:
//!   title: Staff API
//!   version: 1.2.0
//! operations:
//!   - method: get
//!     path: /employees/{id}
//!     operationId: getEmployee
//!     parameters:
//!       - name: id
//!         in: path
//!         type: u64
//!     responses:
//!       - status: 200
//!         type: Employee
//! ```

use crate::descriptor::TypeRef;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

fn default_content_type() -> String {
    "application/json".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationManifest {
    #[serde(default)]
    pub info: ManifestInfo,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// Document info; command-line flags take precedence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestInfo {
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub method: HttpMethod,
    /// Route path; `{id}` and `:id` segments are both accepted
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: Vec<Response>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Rust type expression
    #[serde(rename = "type")]
    pub type_expr: String,
    /// Defaults to `true` for path parameters and to "not `Option`" otherwise
    pub required: Option<bool>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub style: Option<String>,
    pub explode: Option<bool>,
    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    #[serde(rename = "type")]
    pub type_expr: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default = "default_true")]
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status: StatusCode,
    /// Body type; omitted for responses without content
    #[serde(rename = "type")]
    pub type_expr: Option<String>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub description: Option<String>,
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Link objects, passed through verbatim
    #[serde(default)]
    pub links: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    #[serde(rename = "type")]
    pub type_expr: String,
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// `200`, `"2XX"` or `"default"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusCode {
    Code(u16),
    Text(String),
}

impl StatusCode {
    pub fn is_valid(&self) -> bool {
        match self {
            StatusCode::Code(code) => (100..=599).contains(code),
            StatusCode::Text(text) => {
                if text == "default" {
                    return true;
                }
                if let Ok(code) = text.parse::<u16>() {
                    return (100..=599).contains(&code);
                }
                let bytes = text.as_bytes();
                bytes.len() == 3 && (b'1'..=b'5').contains(&bytes[0]) && &text[1..] == "XX"
            }
        }
    }

    /// Reason phrase used when a response has no description
    pub fn default_description(&self) -> &'static str {
        let code = match self {
            StatusCode::Code(code) => Some(*code),
            StatusCode::Text(text) => text.parse().ok(),
        };
        match code {
            Some(200) => "OK",
            Some(201) => "Created",
            Some(202) => "Accepted",
            Some(204) => "No Content",
            Some(400) => "Bad Request",
            Some(401) => "Unauthorized",
            Some(403) => "Forbidden",
            Some(404) => "Not Found",
            Some(409) => "Conflict",
            Some(422) => "Unprocessable Entity",
            Some(500) => "Internal Server Error",
            Some(code) if (200..300).contains(&code) => "Successful response",
            _ => "Response",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Code(code) => write!(f, "{}", code),
            StatusCode::Text(text) => f.write_str(text),
        }
    }
}

impl OperationManifest {
    /// Loads and validates a manifest; `.json` files are read as JSON, anything else as YAML
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading operation manifest from {}", path.display());
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let manifest: Self =
            serde_yaml::from_str(content).map_err(|e| Error::Manifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let manifest: Self =
            serde_json::from_str(content).map_err(|e| Error::Manifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Rejects manifests that cannot describe a valid document
    pub fn validate(&self) -> Result<()> {
        let mut routes = HashSet::new();
        for operation in &self.operations {
            let route = format!("{} {}", operation.method, operation.path);
            if !operation.path.starts_with('/') {
                return Err(Error::Manifest(format!("{}: path must start with `/`", route)));
            }
            if !routes.insert((operation.method, normalize_path(&operation.path))) {
                return Err(Error::Manifest(format!("{} is declared more than once", route)));
            }

            let template = path_parameters(&operation.path);
            let mut names = HashSet::new();
            for parameter in &operation.parameters {
                if parameter.name.trim().is_empty() {
                    return Err(Error::Manifest(format!("{}: parameter name is blank", route)));
                }
                if !names.insert((parameter.location, parameter.name.as_str())) {
                    return Err(Error::Manifest(format!(
                        "{}: parameter `{}` is declared twice",
                        route, parameter.name
                    )));
                }
                if parameter.location == ParameterLocation::Path {
                    if parameter.required == Some(false) {
                        return Err(Error::Manifest(format!(
                            "{}: path parameter `{}` must be required",
                            route, parameter.name
                        )));
                    }
                    if !template.contains(&parameter.name.as_str()) {
                        return Err(Error::Manifest(format!(
                            "{}: path parameter `{}` does not appear in the path",
                            route, parameter.name
                        )));
                    }
                }
                TypeRef::parse(&parameter.type_expr)?;
            }

            if let Some(body) = &operation.request_body {
                TypeRef::parse(&body.type_expr)?;
            }

            let mut statuses = HashSet::new();
            for response in &operation.responses {
                if !response.status.is_valid() {
                    return Err(Error::Manifest(format!(
                        "{}: invalid response status `{}`",
                        route, response.status
                    )));
                }
                if !statuses.insert(response.status.to_string()) {
                    return Err(Error::Manifest(format!(
                        "{}: response {} is declared twice",
                        route, response.status
                    )));
                }
                if let Some(expr) = &response.type_expr {
                    TypeRef::parse(expr)?;
                }
                for header in &response.headers {
                    TypeRef::parse(&header.type_expr)?;
                }
            }
        }
        Ok(())
    }
}

/// Converts `:param` segments to OpenAPI `{param}` segments
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Names of the templated segments of a path (`{id}` or `:id`)
fn path_parameters(path: &str) -> Vec<&str> {
    path.split('/')
        .filter_map(|part| {
            part.strip_prefix(':')
                .or_else(|| part.strip_prefix('{').and_then(|p| p.strip_suffix('}')))
        })
        .collect()
}
