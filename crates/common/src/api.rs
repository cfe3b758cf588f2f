//! Normalized API description
//!
//! The spec adapter lowers both OpenAPI 3 and Swagger 2 documents into these
//! types. Maps are ordered so that iteration over paths and methods is stable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reserved vendor extension key carrying kusk options
pub const EXTENSION_KEY: &str = "x-kusk";

/// HTTP methods an OpenAPI path item may carry, lowercase as they appear in a spec
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// In-memory model of a parsed OpenAPI/Swagger document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDescription {
    /// URL template -> path item
    pub paths: BTreeMap<String, PathItem>,

    /// Top-level servers
    #[serde(default)]
    pub servers: Vec<Server>,

    /// Top-level `x-kusk` block
    #[serde(default)]
    pub extension: Option<Value>,
}

/// Operations and metadata for one URL template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// Uppercase HTTP method -> operation
    pub operations: BTreeMap<String, Operation>,

    /// Path-level servers
    #[serde(default)]
    pub servers: Vec<Server>,

    /// Path-level `x-kusk` block
    #[serde(default)]
    pub extension: Option<Value>,
}

/// A single HTTP operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation ID (unique identifier)
    #[serde(default)]
    pub operation_id: Option<String>,

    /// Parameters, path-level ones already folded in
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Operation-level `x-kusk` block
    #[serde(default)]
    pub extension: Option<Value>,
}

/// Parameter location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    /// Parse an OpenAPI `in` value
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

/// Parameter definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,

    /// Location: path, query, header, cookie
    #[serde(rename = "in")]
    pub location: ParameterLocation,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

/// Server information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Server URL
    pub url: String,

    /// Server description
    #[serde(default)]
    pub description: Option<String>,
}

impl Operation {
    /// Names of parameters declared `in: path`
    pub fn path_parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Path)
            .map(|p| p.name.as_str())
    }

    /// Whether any parameter is declared `in: path`
    pub fn has_path_parameters(&self) -> bool {
        self.path_parameters().next().is_some()
    }
}

impl ApiDescription {
    /// Number of (path, method) pairs
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations.len()).sum()
    }
}

/// Extract `{name}` placeholders from a URL template, in order of appearance
///
/// # Examples
/// ```
/// use kusk_gen_common::path_template_params;
///
/// assert_eq!(
///     path_template_params("/pets/{petId}/photos/{photoId}"),
///     vec!["petId", "photoId"]
/// );
/// assert!(path_template_params("/pets").is_empty());
/// ```
pub fn path_template_params(template: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                params.push(&after[..end]);
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    params
}

/// `x-kusk` blocks collected from every scope of a document
///
/// Mirrors the path/operation hierarchy of the spec. Blocks are kept as raw
/// JSON values; the resolver gives them a type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionBlock {
    /// Top-level block
    pub global: Option<Value>,

    /// Per-path blocks, only for paths carrying at least one block
    pub paths: BTreeMap<String, PathExtension>,
}

/// `x-kusk` blocks found under a single path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathExtension {
    /// Path-level block
    pub options: Option<Value>,

    /// Uppercase HTTP method -> operation-level block
    pub operations: BTreeMap<String, Value>,
}

impl ExtensionBlock {
    pub fn is_empty(&self) -> bool {
        self.global.is_none() && self.paths.is_empty()
    }
}
