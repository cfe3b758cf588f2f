//! Options resolver
//!
//! Merges three layers, lowest precedence first:
//! 1. compiled defaults (`Options::default()`)
//! 2. the top-level `x-kusk` block of the spec
//! 3. user flags
//!
//! Path- and operation-level `x-kusk` blocks become `SubOptions` overrides,
//! applied per operation by [`Options::sub_options_for`].

use crate::merge::merge_layer;
use crate::{
    ApiDescription, ExtensionBlock, GeneratorError, Operation, Options, Result, SubOptions,
};
use serde_json::Value;
use tracing::debug;

/// Produces validated `Options` from defaults, in-spec options and flags
#[derive(Debug, Clone)]
pub struct OptionsResolver {
    defaults: Options,
}

impl Default for OptionsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsResolver {
    /// Resolver backed by the compiled defaults
    pub fn new() -> Self {
        Self::with_defaults(Options::default())
    }

    /// Resolver backed by custom defaults
    pub fn with_defaults(defaults: Options) -> Self {
        Self { defaults }
    }

    /// Merge all layers and validate the result
    ///
    /// `flags` is a nested object holding only the flags the user passed,
    /// e.g. `{"service": {"name": "petstore"}}`.
    pub fn resolve(&self, extension: &ExtensionBlock, flags: &Value) -> Result<Options> {
        let mut problems = Vec::new();
        let mut merged = serde_json::to_value(&self.defaults)?;

        if let Some(global) = &extension.global {
            if global.is_object() {
                debug!("applying top-level x-kusk options");
                merge_layer(&mut merged, global);
            } else {
                problems.push("x-kusk at top level must be an object".to_string());
            }
        }

        if !flags.is_null() {
            debug!(flags = %flags, "applying flag options");
            merge_layer(&mut merged, flags);
        }

        let mut options: Options = serde_json::from_value(merged).map_err(|e| {
            GeneratorError::OptionsValidation(vec![format!("invalid option value: {e}")])
        })?;

        for (path, path_extension) in &extension.paths {
            if let Some(block) = &path_extension.options {
                match parse_sub_options(block) {
                    Ok(sub) => {
                        options.path_sub_options.insert(path.clone(), sub);
                    }
                    Err(e) => problems.push(format!("x-kusk at path {path}: {e}")),
                }
            }
            for (method, block) in &path_extension.operations {
                let key = Options::operation_key(method, path);
                match parse_sub_options(block) {
                    Ok(sub) => {
                        options.operation_sub_options.insert(key, sub);
                    }
                    Err(e) => problems.push(format!("x-kusk at operation {key}: {e}")),
                }
            }
        }

        problems.extend(options.validation_problems());
        if !problems.is_empty() {
            return Err(GeneratorError::OptionsValidation(problems));
        }

        if !options.path.trim_prefix.is_empty() && !options.path.trim_prefix_applies() {
            tracing::warn!(
                base = %options.path.base,
                trim_prefix = %options.path.trim_prefix,
                "path.base does not start with path.trim_prefix, prefix will not be trimmed"
            );
        }

        Ok(options)
    }
}

fn parse_sub_options(block: &Value) -> std::result::Result<SubOptions, String> {
    if !block.is_object() {
        return Err("must be an object".to_string());
    }
    serde_json::from_value(block.clone()).map_err(|e| e.to_string())
}

/// An operation that survived disable filtering, with its effective overrides
#[derive(Debug, Clone)]
pub struct EffectiveOperation<'a> {
    /// URL template as written in the spec
    pub path: &'a str,

    /// Uppercase HTTP method
    pub method: &'a str,

    pub operation: &'a Operation,

    /// Global options overlaid with path and operation overrides
    pub options: SubOptions,
}

impl Options {
    /// Operations to render, sorted by (path, method)
    ///
    /// An operation is kept when its effective `disabled` is false, where the
    /// operation override wins over the path override, which wins over the
    /// global switch.
    pub fn effective_operations<'a>(&self, api: &'a ApiDescription) -> Vec<EffectiveOperation<'a>> {
        let mut effective = Vec::new();
        for (path, item) in &api.paths {
            for (method, operation) in &item.operations {
                let options = self.sub_options_for(path, method);
                if options.is_disabled() {
                    debug!(%method, %path, "operation disabled, skipping");
                    continue;
                }
                effective.push(EffectiveOperation {
                    path,
                    method,
                    operation,
                    options,
                });
            }
        }
        effective
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PathExtension, PathItem};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn extension(global: Value) -> ExtensionBlock {
        ExtensionBlock {
            global: Some(global),
            paths: BTreeMap::new(),
        }
    }

    #[test]
    fn test_flags_override_spec_override_defaults() {
        let ext = extension(json!({
            "service": {"name": "from-spec", "port": 8080},
            "namespace": "spec-ns"
        }));
        let flags = json!({"service": {"name": "from-flags"}});

        let options = OptionsResolver::new().resolve(&ext, &flags).unwrap();
        assert_eq!(options.service.name, "from-flags");
        assert_eq!(options.service.port, 8080);
        assert_eq!(options.service.namespace, "default");
        assert_eq!(options.namespace, "spec-ns");
    }

    #[test]
    fn test_flag_list_replaces_spec_list() {
        let ext = extension(json!({
            "service": {"name": "svc"},
            "cors": {"origins": ["https://a.example", "https://b.example"]}
        }));
        let flags = json!({"cors": {"origins": ["https://c.example"]}});

        let options = OptionsResolver::new().resolve(&ext, &flags).unwrap();
        assert_eq!(options.cors.origins, vec!["https://c.example"]);
    }

    #[test]
    fn test_explicit_false_flag_overrides_spec() {
        let ext = extension(json!({"service": {"name": "svc"}, "path": {"split": true}}));
        let flags = json!({"path": {"split": false}});
        let options = OptionsResolver::new().resolve(&ext, &flags).unwrap();
        assert!(!options.path.split);
    }

    #[test]
    fn test_missing_service_name_fails_validation() {
        let err = OptionsResolver::new()
            .resolve(&ExtensionBlock::default(), &Value::Null)
            .unwrap_err();
        match err {
            GeneratorError::OptionsValidation(problems) => {
                assert_eq!(problems, vec!["service.name is required".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_value_type_is_a_validation_error() {
        let ext = extension(json!({"service": {"name": "svc", "port": "eighty"}}));
        let err = OptionsResolver::new().resolve(&ext, &Value::Null).unwrap_err();
        assert!(matches!(err, GeneratorError::OptionsValidation(_)));
    }

    #[test]
    fn test_sub_option_errors_are_aggregated() {
        let mut paths = BTreeMap::new();
        paths.insert(
            "/pets".to_string(),
            PathExtension {
                options: Some(json!("nope")),
                operations: BTreeMap::from([(
                    "GET".to_string(),
                    json!({"rate_limits": {"burst": 5}}),
                )]),
            },
        );
        let ext = ExtensionBlock {
            global: None,
            paths,
        };

        let err = OptionsResolver::new()
            .resolve(&ext, &json!({"service": {"name": "svc"}}))
            .unwrap_err();
        match err {
            GeneratorError::OptionsValidation(problems) => {
                assert_eq!(problems.len(), 2, "{problems:?}");
                assert_eq!(problems[0], "x-kusk at path /pets: must be an object");
                assert!(problems[1].starts_with("operation GET/pets: rate_limits.burst"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    fn api(paths: &[(&str, &[&str])]) -> ApiDescription {
        let mut api = ApiDescription::default();
        for (path, methods) in paths {
            let mut item = PathItem::default();
            for method in *methods {
                item.operations
                    .insert(method.to_string(), Operation::default());
            }
            api.paths.insert(path.to_string(), item);
        }
        api
    }

    #[test]
    fn test_operation_re_enables_disabled_path() {
        let api = api(&[("/", &["GET", "PATCH", "POST"])]);
        let mut paths = BTreeMap::new();
        paths.insert(
            "/".to_string(),
            PathExtension {
                options: Some(json!({"disabled": true})),
                operations: BTreeMap::from([("GET".to_string(), json!({"disabled": false}))]),
            },
        );
        let ext = ExtensionBlock {
            global: Some(json!({"service": {"name": "svc"}})),
            paths,
        };

        let options = OptionsResolver::new().resolve(&ext, &Value::Null).unwrap();
        let effective = options.effective_operations(&api);
        assert_eq!(effective.len(), 1);
        assert_eq!((effective[0].path, effective[0].method), ("/", "GET"));
    }

    #[test]
    fn test_global_disable_with_operation_re_enable() {
        let api = api(&[("/a", &["GET"]), ("/b", &["GET", "POST"])]);
        let mut options = Options::default();
        options.service.name = "svc".to_string();
        options.disabled = true;
        assert!(options.effective_operations(&api).is_empty());

        options.operation_sub_options.insert(
            "POST/b".to_string(),
            SubOptions {
                disabled: Some(false),
                ..Default::default()
            },
        );
        let effective = options.effective_operations(&api);
        assert_eq!(effective.len(), 1);
        assert_eq!((effective[0].path, effective[0].method), ("/b", "POST"));
    }

    #[test]
    fn test_operation_disable_wins_over_path_enable() {
        let api = api(&[("/a", &["DELETE", "GET"])]);
        let mut options = Options::default();
        options.path_sub_options.insert(
            "/a".to_string(),
            SubOptions {
                disabled: Some(false),
                ..Default::default()
            },
        );
        options.operation_sub_options.insert(
            "DELETE/a".to_string(),
            SubOptions {
                disabled: Some(true),
                ..Default::default()
            },
        );
        let methods: Vec<_> = options
            .effective_operations(&api)
            .iter()
            .map(|op| op.method)
            .collect();
        assert_eq!(methods, vec!["GET"]);
    }

    #[test]
    fn test_effective_operations_are_sorted() {
        let api = api(&[("/b", &["POST", "GET"]), ("/a", &["PUT"])]);
        let options = Options::default();
        let order: Vec<_> = options
            .effective_operations(&api)
            .iter()
            .map(|op| format!("{} {}", op.method, op.path))
            .collect();
        assert_eq!(order, vec!["PUT /a", "GET /b", "POST /b"]);
    }
}
