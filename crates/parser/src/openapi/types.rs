//! OpenAPI 3.x type definitions
//!
//! Simplified representation focusing on what routing needs: paths,
//! operations, parameters, servers and `x-kusk` blocks. Schemas are not
//! modelled; request bodies are kept opaque.

use kusk_gen_common::Server;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// OpenAPI document root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiSpec {
    /// OpenAPI version (e.g., "3.0.3")
    pub openapi: String,

    /// API metadata
    #[serde(default)]
    pub info: Option<Info>,

    /// Servers
    #[serde(default)]
    pub servers: Vec<Server>,

    /// API paths (endpoints)
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,

    /// Reusable components
    #[serde(default)]
    pub components: Option<Components>,

    /// Top-level kusk options
    #[serde(rename = "x-kusk", default, skip_serializing_if = "Option::is_none")]
    pub x_kusk: Option<Value>,
}

/// API information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

/// Path item (operations for a path)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,

    /// Parameters shared by every operation of the path
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,

    #[serde(default)]
    pub servers: Vec<Server>,

    #[serde(rename = "x-kusk", default, skip_serializing_if = "Option::is_none")]
    pub x_kusk: Option<Value>,
}

impl PathItem {
    /// Operations paired with their lowercase method name, in a fixed order
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("get", &self.get),
            ("put", &self.put),
            ("post", &self.post),
            ("delete", &self.delete),
            ("options", &self.options),
            ("head", &self.head),
            ("patch", &self.patch),
            ("trace", &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }

    /// Mutable slot for a lowercase method name
    pub fn operation_slot(&mut self, method: &str) -> Option<&mut Option<Operation>> {
        match method {
            "get" => Some(&mut self.get),
            "put" => Some(&mut self.put),
            "post" => Some(&mut self.post),
            "delete" => Some(&mut self.delete),
            "options" => Some(&mut self.options),
            "head" => Some(&mut self.head),
            "patch" => Some(&mut self.patch),
            "trace" => Some(&mut self.trace),
            _ => None,
        }
    }
}

/// HTTP operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    /// Operation ID (unique identifier)
    #[serde(rename = "operationId", default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,

    /// Request body, not interpreted
    #[serde(rename = "requestBody", default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,

    #[serde(rename = "x-kusk", default, skip_serializing_if = "Option::is_none")]
    pub x_kusk: Option<Value>,
}

/// Parameter or reference to a component parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    /// Reference, e.g. `#/components/parameters/PetId`
    Reference {
        #[serde(rename = "$ref")]
        ref_path: String,
    },

    /// Inline parameter
    Parameter(Parameter),
}

/// Parameter definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    /// Location: query, header, path, cookie
    #[serde(rename = "in")]
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// Reusable components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
}

const COMPONENT_PARAMETER_PREFIX: &str = "#/components/parameters/";

impl OpenApiSpec {
    /// Resolve a parameter reference, e.g. `#/components/parameters/PetId`
    pub fn resolve_parameter_ref(&self, ref_path: &str) -> Option<&Parameter> {
        let name = ref_path.strip_prefix(COMPONENT_PARAMETER_PREFIX)?;
        self.components
            .as_ref()
            .and_then(|c| c.parameters.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_or_ref_untagged() {
        let params: Vec<ParameterOrRef> = serde_json::from_str(
            r##"[{"$ref": "#/components/parameters/PetId"}, {"name": "limit", "in": "query"}]"##,
        )
        .unwrap();
        assert!(matches!(&params[0], ParameterOrRef::Reference { ref_path } if ref_path.ends_with("PetId")));
        assert!(matches!(&params[1], ParameterOrRef::Parameter(p) if p.location == "query"));
    }

    #[test]
    fn test_operations_order() {
        let item: PathItem = serde_json::from_str(r#"{"post": {}, "get": {}, "x-kusk": {"disabled": true}}"#)
            .unwrap();
        let methods: Vec<_> = item.operations().map(|(m, _)| m).collect();
        assert_eq!(methods, vec!["get", "post"]);
        assert!(item.x_kusk.is_some());
    }
}
