//! Common types and utilities for kusk-gen
//!
//! This crate contains the shared error type, the normalized API description
//! produced by the spec adapter, the option model handed to generators, and
//! the resolver that merges defaults, in-spec `x-kusk` blocks and CLI flags.

mod api;
mod merge;
mod options;
mod resolver;

pub use api::{
    path_template_params, ApiDescription, ExtensionBlock, Operation, Parameter,
    ParameterLocation, PathExtension, PathItem, Server, EXTENSION_KEY, HTTP_METHODS,
};
pub use merge::merge_layer;
pub use options::{
    ClusterOptions, CorsOptions, IngressOptions, NginxIngressOptions, Options, Overlay,
    OverrideScope, PathOptions, RateLimitOptions, ServiceOptions, SubOptions, TimeoutOptions,
};
pub use resolver::{EffectiveOperation, OptionsResolver};

use thiserror::Error;

/// Errors that can occur while turning a spec into manifests
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("failed to read spec {path}")]
    SpecIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("spec parse error: {0}")]
    SpecParse(String),

    #[error("spec unmarshal error: {0}")]
    SpecUnmarshal(String),

    #[error("swagger to openapi conversion failed: {0}")]
    SpecConvert(String),

    #[error("invalid options: {}", .0.join("; "))]
    OptionsValidation(Vec<String>),

    #[error("template render error: {0}")]
    TemplateRender(String),

    #[error("unknown generator: {0}")]
    UnknownGenerator(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for kusk-gen operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_single_line() {
        let err = GeneratorError::OptionsValidation(vec![
            "service.name is required".to_string(),
            "service.port must be between 1 and 65535".to_string(),
        ]);
        let message = err.to_string();
        assert!(!message.contains('\n'));
        assert_eq!(
            message,
            "invalid options: service.name is required; service.port must be between 1 and 65535"
        );
    }

    #[test]
    fn test_unknown_generator_message() {
        let err = GeneratorError::UnknownGenerator("istio".to_string());
        assert_eq!(err.to_string(), "unknown generator: istio");
    }
}
