//! Spec document parser
//!
//! Decodes YAML or JSON, detects the document flavor from its header and
//! produces the normalized `ApiDescription`.

use crate::openapi::{convert_openapi_to_api_description, OpenApiSpec};
use crate::swagger::{convert_swagger_to_openapi, SwaggerSpec};
use kusk_gen_common::{ApiDescription, GeneratorError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Flavor of an input document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFlavor {
    /// OpenAPI 3.0.x / 3.1.x
    OpenApi3,

    /// Swagger 2.0
    Swagger2,
}

/// Parser for OpenAPI 3 and Swagger 2 documents
///
/// Holds the decoded document as a JSON value; YAML input is converted on
/// load so structural decoding only ever sees JSON.
pub struct SpecParser {
    document: Value,
    flavor: SpecFlavor,
}

impl SpecParser {
    /// Load a spec from a file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let api = SpecParser::from_file("petstore.yaml")?.parse()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| GeneratorError::SpecIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Decode a spec from raw bytes, YAML or JSON
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut document = decode(bytes)?;
        normalize_version_fields(&mut document);
        let flavor = detect_flavor(&document)?;
        debug!(?flavor, "detected spec flavor");
        Ok(Self { document, flavor })
    }

    pub fn flavor(&self) -> SpecFlavor {
        self.flavor
    }

    /// Decode into the OpenAPI 3 model, converting Swagger 2 first
    pub fn openapi(&self) -> Result<OpenApiSpec> {
        match self.flavor {
            SpecFlavor::OpenApi3 => unmarshal(&self.document),
            SpecFlavor::Swagger2 => {
                let swagger: SwaggerSpec = unmarshal(&self.document)?;
                convert_swagger_to_openapi(&swagger)
            }
        }
    }

    /// Parse into the normalized `ApiDescription`
    pub fn parse(&self) -> Result<ApiDescription> {
        let spec = self.openapi()?;
        let api = convert_openapi_to_api_description(&spec)?;
        debug!(
            paths = api.paths.len(),
            operations = api.operation_count(),
            "parsed spec"
        );
        Ok(api)
    }
}

fn decode(bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| GeneratorError::SpecParse(format!("spec is not valid UTF-8: {e}")))?;
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();

    if trimmed.starts_with('{') {
        serde_json::from_str(trimmed)
            .map_err(|e| GeneratorError::SpecParse(format!("invalid JSON: {e}")))
    } else {
        serde_yaml::from_str(trimmed)
            .map_err(|e| GeneratorError::SpecParse(format!("invalid YAML: {e}")))
    }
}

/// Unquoted YAML versions such as `swagger: 2.0` decode as numbers
fn normalize_version_fields(document: &mut Value) {
    if let Some(header) = document.as_object_mut() {
        for key in ["openapi", "swagger"] {
            if let Some(version) = header.get_mut(key) {
                if version.is_number() {
                    *version = Value::String(version.to_string());
                }
            }
        }
    }
}

fn detect_flavor(document: &Value) -> Result<SpecFlavor> {
    let Some(header) = document.as_object() else {
        return Err(GeneratorError::SpecParse(
            "document root must be a mapping".to_string(),
        ));
    };

    if let Some(version) = header.get("openapi") {
        return match version.as_str() {
            Some(v) if v.starts_with("3.") => Ok(SpecFlavor::OpenApi3),
            _ => Err(GeneratorError::SpecParse(format!(
                "unsupported openapi version {version}"
            ))),
        };
    }
    if header.contains_key("swagger") {
        return Ok(SpecFlavor::Swagger2);
    }

    Err(GeneratorError::SpecParse(
        "document is neither OpenAPI 3 nor Swagger 2: missing `openapi` or `swagger` field"
            .to_string(),
    ))
}

fn unmarshal<T: serde::de::DeserializeOwned>(document: &Value) -> Result<T> {
    T::deserialize(document).map_err(|e| GeneratorError::SpecUnmarshal(e.to_string()))
}
