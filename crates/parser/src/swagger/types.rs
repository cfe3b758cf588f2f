//! Swagger 2.0 type definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::openapi::Info;

/// Swagger document root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwaggerSpec {
    /// Swagger version, "2.0"
    pub swagger: String,

    #[serde(default)]
    pub info: Option<Info>,

    /// Host (and optional port) serving the API
    #[serde(default)]
    pub host: Option<String>,

    /// Prefix shared by every path
    #[serde(rename = "basePath", default)]
    pub base_path: Option<String>,

    /// Transfer protocols, e.g. ["https"]
    #[serde(default)]
    pub schemes: Vec<String>,

    /// Default request MIME types
    #[serde(default)]
    pub consumes: Vec<String>,

    #[serde(default)]
    pub paths: BTreeMap<String, SwaggerPathItem>,

    /// Reusable parameters, referenced as `#/parameters/<name>`
    #[serde(default)]
    pub parameters: BTreeMap<String, SwaggerParameter>,

    #[serde(rename = "x-kusk", default)]
    pub x_kusk: Option<Value>,
}

/// Path item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwaggerPathItem {
    #[serde(default)]
    pub get: Option<SwaggerOperation>,

    #[serde(default)]
    pub put: Option<SwaggerOperation>,

    #[serde(default)]
    pub post: Option<SwaggerOperation>,

    #[serde(default)]
    pub delete: Option<SwaggerOperation>,

    #[serde(default)]
    pub options: Option<SwaggerOperation>,

    #[serde(default)]
    pub head: Option<SwaggerOperation>,

    #[serde(default)]
    pub patch: Option<SwaggerOperation>,

    #[serde(default)]
    pub parameters: Vec<SwaggerParameterOrRef>,

    #[serde(rename = "x-kusk", default)]
    pub x_kusk: Option<Value>,
}

impl SwaggerPathItem {
    /// Operations paired with their lowercase method name
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &SwaggerOperation)> {
        [
            ("get", &self.get),
            ("put", &self.put),
            ("post", &self.post),
            ("delete", &self.delete),
            ("options", &self.options),
            ("head", &self.head),
            ("patch", &self.patch),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

/// Operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwaggerOperation {
    #[serde(rename = "operationId", default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Request MIME types, overriding the document default
    #[serde(default)]
    pub consumes: Vec<String>,

    #[serde(default)]
    pub parameters: Vec<SwaggerParameterOrRef>,

    #[serde(rename = "x-kusk", default)]
    pub x_kusk: Option<Value>,
}

/// Parameter or reference to a document-level parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SwaggerParameterOrRef {
    Reference {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Parameter(SwaggerParameter),
}

/// Parameter definition
///
/// Unlike OpenAPI 3, `in` may also be `body` or `formData`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwaggerParameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    /// Body schema, only for `in: body`
    #[serde(default)]
    pub schema: Option<Value>,

    /// Primitive type for non-body parameters
    #[serde(rename = "type", default)]
    pub param_type: Option<String>,
}

const PARAMETER_PREFIX: &str = "#/parameters/";

impl SwaggerSpec {
    /// Resolve a parameter reference, e.g. `#/parameters/PetId`
    pub fn resolve_parameter_ref(&self, ref_path: &str) -> Option<&SwaggerParameter> {
        let name = ref_path.strip_prefix(PARAMETER_PREFIX)?;
        self.parameters.get(name)
    }
}
