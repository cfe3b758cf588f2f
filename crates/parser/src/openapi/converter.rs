//! Converts an OpenAPI 3 document to the normalized `ApiDescription`

use super::types::{OpenApiSpec, Operation as RawOperation, ParameterOrRef};
use kusk_gen_common::{
    path_template_params, ApiDescription, GeneratorError, Operation, Parameter,
    ParameterLocation, PathItem, Result,
};
use tracing::warn;

/// Convert OpenAPI spec to ApiDescription
pub fn convert_openapi_to_api_description(spec: &OpenApiSpec) -> Result<ApiDescription> {
    let mut api = ApiDescription {
        paths: Default::default(),
        servers: spec.servers.clone(),
        extension: spec.x_kusk.clone(),
    };

    for (path, raw_item) in &spec.paths {
        let shared = resolve_parameters(spec, path, &raw_item.parameters)?;

        let mut item = PathItem {
            operations: Default::default(),
            servers: raw_item.servers.clone(),
            extension: raw_item.x_kusk.clone(),
        };

        for (method, raw_op) in raw_item.operations() {
            let operation = convert_operation(spec, path, &shared, raw_op)?;
            warn_undeclared_path_params(path, method, &operation);
            item.operations.insert(method.to_uppercase(), operation);
        }

        api.paths.insert(path.clone(), item);
    }

    Ok(api)
}

fn convert_operation(
    spec: &OpenApiSpec,
    path: &str,
    shared: &[Parameter],
    raw: &RawOperation,
) -> Result<Operation> {
    let own = resolve_parameters(spec, path, &raw.parameters)?;

    // operation parameters override path parameters with the same (name, in)
    let mut parameters: Vec<Parameter> = shared
        .iter()
        .filter(|p| {
            !own.iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .cloned()
        .collect();
    parameters.extend(own);

    Ok(Operation {
        operation_id: raw.operation_id.clone(),
        parameters,
        extension: raw.x_kusk.clone(),
    })
}

fn resolve_parameters(
    spec: &OpenApiSpec,
    path: &str,
    raw: &[ParameterOrRef],
) -> Result<Vec<Parameter>> {
    raw.iter()
        .map(|param| {
            let param = match param {
                ParameterOrRef::Parameter(p) => p,
                ParameterOrRef::Reference { ref_path } => {
                    spec.resolve_parameter_ref(ref_path).ok_or_else(|| {
                        GeneratorError::SpecUnmarshal(format!(
                            "unresolved parameter reference {ref_path} in path {path}"
                        ))
                    })?
                }
            };
            let location = ParameterLocation::parse(&param.location).ok_or_else(|| {
                GeneratorError::SpecUnmarshal(format!(
                    "parameter {} in path {path} has unknown location {:?}",
                    param.name, param.location
                ))
            })?;
            Ok(Parameter::new(param.name.clone(), location))
        })
        .collect()
}

fn warn_undeclared_path_params(path: &str, method: &str, operation: &Operation) {
    for name in path_template_params(path) {
        if !operation.path_parameters().any(|p| p == name) {
            warn!(
                %path,
                %method,
                parameter = name,
                "path template parameter is not declared as `in: path`, it will be matched literally"
            );
        }
    }
}
