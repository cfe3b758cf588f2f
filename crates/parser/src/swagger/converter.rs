//! Converts Swagger 2.0 documents to OpenAPI 3
//!
//! Only the parts routing depends on are carried over: servers, paths,
//! operations, parameters and `x-kusk` blocks. `body` and `formData`
//! parameters are folded into a `requestBody`.

use super::types::{SwaggerOperation, SwaggerParameter, SwaggerParameterOrRef, SwaggerSpec};
use crate::openapi::{OpenApiSpec, Operation, Parameter, ParameterOrRef, PathItem};
use kusk_gen_common::{GeneratorError, Result, Server};
use serde_json::{json, Map, Value};
use tracing::debug;

const OPENAPI_VERSION: &str = "3.0.3";
const DEFAULT_SCHEME: &str = "https";
const DEFAULT_CONSUMES: &str = "application/json";
const FORM_CONSUMES: &str = "application/x-www-form-urlencoded";

/// Convert a Swagger 2.0 document to an equivalent OpenAPI 3 document
pub fn convert_swagger_to_openapi(swagger: &SwaggerSpec) -> Result<OpenApiSpec> {
    if !swagger.swagger.starts_with("2.") && swagger.swagger != "2" {
        return Err(GeneratorError::SpecConvert(format!(
            "unsupported swagger version {:?}, only 2.0 can be converted",
            swagger.swagger
        )));
    }

    let mut openapi = OpenApiSpec {
        openapi: OPENAPI_VERSION.to_string(),
        info: swagger.info.clone(),
        servers: convert_servers(swagger),
        paths: Default::default(),
        components: None,
        x_kusk: swagger.x_kusk.clone(),
    };

    for (path, raw_item) in &swagger.paths {
        let mut item = PathItem {
            x_kusk: raw_item.x_kusk.clone(),
            ..Default::default()
        };

        for param in &raw_item.parameters {
            let param = resolve(swagger, param)?;
            match classify(param)? {
                Converted::Parameter(p) => item.parameters.push(ParameterOrRef::Parameter(p)),
                Converted::Body | Converted::FormData => {
                    debug!(%path, parameter = %param.name, "dropping path-level body parameter");
                }
            }
        }

        for (method, raw_op) in raw_item.operations() {
            let operation = convert_operation(swagger, raw_op)?;
            if let Some(slot) = item.operation_slot(method) {
                *slot = Some(operation);
            }
        }

        openapi.paths.insert(path.clone(), item);
    }

    Ok(openapi)
}

fn convert_servers(swagger: &SwaggerSpec) -> Vec<Server> {
    let base_path = swagger.base_path.clone().unwrap_or_default();
    match &swagger.host {
        Some(host) => {
            let schemes = if swagger.schemes.is_empty() {
                vec![DEFAULT_SCHEME.to_string()]
            } else {
                swagger.schemes.clone()
            };
            schemes
                .iter()
                .map(|scheme| Server {
                    url: format!("{scheme}://{host}{base_path}"),
                    description: None,
                })
                .collect()
        }
        None if !base_path.is_empty() => vec![Server {
            url: base_path,
            description: None,
        }],
        None => Vec::new(),
    }
}

fn convert_operation(swagger: &SwaggerSpec, raw: &SwaggerOperation) -> Result<Operation> {
    let mut parameters = Vec::new();
    let mut body_schema: Option<Value> = None;
    let mut form_fields = Map::new();

    for param in &raw.parameters {
        let param = resolve(swagger, param)?;
        match classify(param)? {
            Converted::Parameter(p) => parameters.push(ParameterOrRef::Parameter(p)),
            Converted::Body => body_schema = Some(param.schema.clone().unwrap_or_else(|| json!({}))),
            Converted::FormData => {
                let field_type = param.param_type.clone().unwrap_or_else(|| "string".to_string());
                form_fields.insert(param.name.clone(), json!({ "type": field_type }));
            }
        }
    }

    let consumes = if raw.consumes.is_empty() {
        &swagger.consumes
    } else {
        &raw.consumes
    };

    let request_body = if let Some(schema) = body_schema {
        let mut content = Map::new();
        let types: Vec<&str> = if consumes.is_empty() {
            vec![DEFAULT_CONSUMES]
        } else {
            consumes.iter().map(String::as_str).collect()
        };
        for mime in types {
            content.insert(mime.to_string(), json!({ "schema": schema }));
        }
        Some(json!({ "content": content }))
    } else if !form_fields.is_empty() {
        let mime = consumes
            .iter()
            .find(|c| c.starts_with("multipart/") || c.as_str() == FORM_CONSUMES)
            .map(String::as_str)
            .unwrap_or(FORM_CONSUMES);
        Some(json!({
            "content": {
                mime: {"schema": {"type": "object", "properties": form_fields}}
            }
        }))
    } else {
        None
    };

    Ok(Operation {
        operation_id: raw.operation_id.clone(),
        summary: raw.summary.clone(),
        description: raw.description.clone(),
        parameters,
        request_body,
        x_kusk: raw.x_kusk.clone(),
    })
}

fn resolve<'a>(
    swagger: &'a SwaggerSpec,
    param: &'a SwaggerParameterOrRef,
) -> Result<&'a SwaggerParameter> {
    match param {
        SwaggerParameterOrRef::Parameter(p) => Ok(p),
        SwaggerParameterOrRef::Reference { ref_path } => swagger
            .resolve_parameter_ref(ref_path)
            .ok_or_else(|| {
                GeneratorError::SpecConvert(format!("unresolved parameter reference {ref_path}"))
            }),
    }
}

enum Converted {
    Parameter(Parameter),
    Body,
    FormData,
}

fn classify(param: &SwaggerParameter) -> Result<Converted> {
    match param.location.as_str() {
        "path" | "query" | "header" => Ok(Converted::Parameter(Parameter {
            name: param.name.clone(),
            location: param.location.clone(),
            description: param.description.clone(),
            required: param.required,
            schema: param
                .param_type
                .as_ref()
                .map(|t| json!({ "type": t })),
        })),
        "body" => Ok(Converted::Body),
        "formData" => Ok(Converted::FormData),
        other => Err(GeneratorError::SpecConvert(format!(
            "parameter {} has unsupported location {other:?}",
            param.name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swagger(json: &str) -> SwaggerSpec {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_servers_from_host_and_base_path() {
        let spec = swagger(
            r#"{"swagger": "2.0", "host": "petstore.swagger.io", "basePath": "/v2", "schemes": ["https", "http"]}"#,
        );
        let openapi = convert_swagger_to_openapi(&spec).unwrap();
        let urls: Vec<_> = openapi.servers.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["https://petstore.swagger.io/v2", "http://petstore.swagger.io/v2"]);
    }

    #[test]
    fn test_body_parameter_becomes_request_body() {
        let spec = swagger(
            r##"{
                "swagger": "2.0",
                "consumes": ["application/xml"],
                "paths": {
                    "/pet": {
                        "post": {
                            "operationId": "addPet",
                            "parameters": [{"name": "body", "in": "body", "schema": {"$ref": "#/definitions/Pet"}}]
                        }
                    }
                }
            }"##,
        );
        let openapi = convert_swagger_to_openapi(&spec).unwrap();
        let op = openapi.paths["/pet"].post.as_ref().unwrap();
        assert!(op.parameters.is_empty());
        let body = op.request_body.as_ref().unwrap();
        assert!(body["content"]["application/xml"]["schema"].is_object());
    }

    #[test]
    fn test_form_data_becomes_request_body() {
        let spec = swagger(
            r#"{
                "swagger": "2.0",
                "paths": {
                    "/pet/{petId}": {
                        "post": {
                            "consumes": ["multipart/form-data"],
                            "parameters": [
                                {"name": "petId", "in": "path", "required": true, "type": "integer"},
                                {"name": "file", "in": "formData", "type": "file"}
                            ]
                        }
                    }
                }
            }"#,
        );
        let openapi = convert_swagger_to_openapi(&spec).unwrap();
        let op = openapi.paths["/pet/{petId}"].post.as_ref().unwrap();
        assert_eq!(op.parameters.len(), 1);
        let body = op.request_body.as_ref().unwrap();
        assert_eq!(
            body["content"]["multipart/form-data"]["schema"]["properties"]["file"]["type"],
            "file"
        );
    }

    #[test]
    fn test_document_level_parameter_reference() {
        let spec = swagger(
            r##"{
                "swagger": "2.0",
                "parameters": {"PetId": {"name": "petId", "in": "path", "type": "string"}},
                "paths": {"/pet/{petId}": {"get": {"parameters": [{"$ref": "#/parameters/PetId"}]}}}
            }"##,
        );
        let openapi = convert_swagger_to_openapi(&spec).unwrap();
        let op = openapi.paths["/pet/{petId}"].get.as_ref().unwrap();
        assert!(matches!(&op.parameters[0], ParameterOrRef::Parameter(p) if p.location == "path"));
    }

    #[test]
    fn test_unknown_location_fails_conversion() {
        let spec = swagger(
            r#"{"swagger": "2.0", "paths": {"/a": {"get": {"parameters": [{"name": "x", "in": "matrix"}]}}}}"#,
        );
        assert!(matches!(
            convert_swagger_to_openapi(&spec),
            Err(GeneratorError::SpecConvert(_))
        ));
    }

    #[test]
    fn test_unsupported_version_fails_conversion() {
        let spec = swagger(r#"{"swagger": "1.2"}"#);
        assert!(matches!(
            convert_swagger_to_openapi(&spec),
            Err(GeneratorError::SpecConvert(_))
        ));
    }
}
