//! Ambassador / Emissary-ingress generators
//!
//! Both versions share [`AbstractGenerator`], which derives mapping names,
//! expands path templates into prefixes, collects rate limits and renders
//! the tera templates. The concrete generators only pick the templates and
//! API versions.

mod v1;
mod v2;

pub use v1::AmbassadorGenerator;
pub use v2::AmbassadorV2Generator;

use crate::manifest::{burst_factor, service_url, yaml_stream};
use crate::strip_path;
use crate::templates::{Renderer, RATE_LIMIT};
use kusk_gen_common::{
    path_template_params, ApiDescription, EffectiveOperation, GeneratorError, Operation, Options,
    Result, SubOptions,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Replacement for every `{name}` placeholder of a regex-enabled prefix
pub const PATH_PARAM_REGEX: &str = "([a-zA-Z0-9]*)";

#[derive(Debug, Serialize)]
struct MappingData {
    name: String,
    namespace: String,
    prefix: String,
    prefix_regex: bool,
    method: Option<String>,
    /// `host` field of v1 mappings, empty for any
    host: String,
    /// `hostname` field of v2 mappings, `*` for any
    hostname: String,
    service: String,
    regex_rewrite: Option<RegexRewrite>,
    cors: Option<CorsData>,
    timeout_ms: Option<u64>,
    idle_timeout_ms: Option<u64>,
    rate_limit_label: Option<String>,
}

#[derive(Debug, Serialize)]
struct RegexRewrite {
    pattern: String,
    substitution: String,
}

#[derive(Debug, Serialize)]
struct CorsData {
    origins: Vec<String>,
    methods: Vec<String>,
    headers: Vec<String>,
    exposed_headers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials: Option<bool>,
    max_age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct RateLimitData {
    api_version: &'static str,
    name: String,
    namespace: String,
    label: String,
    rps: u32,
    burst_factor: Option<u32>,
}

/// Routing target of one mapping before rendering
struct Route<'a> {
    name: String,
    prefix: String,
    prefix_regex: bool,
    method: Option<&'a str>,
    options: SubOptions,
}

/// Shared Ambassador rendering
pub struct AbstractGenerator {
    renderer: Renderer,
    mapping_template: &'static str,
    rate_limit_api_version: &'static str,
}

impl AbstractGenerator {
    pub fn new(mapping_template: &'static str, rate_limit_api_version: &'static str) -> Result<Self> {
        Ok(Self {
            renderer: Renderer::new()?,
            mapping_template,
            rate_limit_api_version,
        })
    }

    /// Render Mappings sorted by (path, method), then RateLimits sorted by name
    ///
    /// Fails when mappings sharing a rate-limit group disagree on its limits.
    pub fn generate(&self, options: &Options, api: &ApiDescription) -> Result<String> {
        let operations = options.effective_operations(api);
        if operations.is_empty() {
            debug!("no effective operations, nothing to render");
            return Ok(String::new());
        }

        let routes = if options.path.is_root_only() {
            debug!(base = %options.path.base, "root-only mode, rendering a single mapping");
            vec![Route {
                name: options.service.name.to_lowercase(),
                prefix: options.path.base.clone(),
                prefix_regex: false,
                method: None,
                options: SubOptions::from_global(options),
            }]
        } else {
            operations
                .iter()
                .map(|op| operation_route(options, op))
                .collect()
        };

        let mut rate_limits = BTreeMap::new();
        let mut documents = Vec::with_capacity(routes.len());
        for route in &routes {
            let data = self.mapping_data(options, route, &mut rate_limits)?;
            documents.push(self.renderer.render(self.mapping_template, &data)?);
        }
        for rate_limit in rate_limits.values() {
            documents.push(self.renderer.render(RATE_LIMIT, rate_limit)?);
        }

        Ok(yaml_stream(documents))
    }

    fn mapping_data(
        &self,
        options: &Options,
        route: &Route<'_>,
        rate_limits: &mut BTreeMap<String, RateLimitData>,
    ) -> Result<MappingData> {
        let sub = &route.options;

        let regex_rewrite = options.path.trim_prefix_applies().then(|| RegexRewrite {
            pattern: format!("{}(.*)", options.path.trim_prefix),
            substitution: "\\1".to_string(),
        });

        let cors = (!sub.cors.is_empty()).then(|| CorsData {
            origins: sub.cors.origins.clone(),
            methods: sub.cors.methods.clone(),
            headers: sub.cors.headers.clone(),
            exposed_headers: sub.cors.expose_headers.clone(),
            credentials: sub.cors.credentials,
            max_age: sub.cors.max_age,
        });

        let rate_limit_label = if sub.rate_limits.is_empty() {
            None
        } else {
            let label = if sub.rate_limits.group.is_empty() {
                format!("kusk-operation-{}", route.name)
            } else {
                format!("kusk-group-{}", sub.rate_limits.group)
            };
            let limit = RateLimitData {
                api_version: self.rate_limit_api_version,
                name: label.clone(),
                namespace: options.namespace.clone(),
                label: label.clone(),
                rps: sub.rate_limits.rps,
                burst_factor: burst_factor(sub.rate_limits.rps, sub.rate_limits.burst),
            };
            match rate_limits.get(&label) {
                Some(existing) if existing != &limit => {
                    return Err(GeneratorError::OptionsValidation(vec![format!(
                        "{label} is shared by mappings with different rate limits \
                         ({} rps, burst factor {:?} vs {} rps, burst factor {:?})",
                        existing.rps, existing.burst_factor, limit.rps, limit.burst_factor
                    )]));
                }
                Some(_) => {}
                None => {
                    rate_limits.insert(label.clone(), limit);
                }
            }
            Some(label)
        };

        Ok(MappingData {
            name: route.name.clone(),
            namespace: options.namespace.clone(),
            prefix: route.prefix.clone(),
            prefix_regex: route.prefix_regex,
            method: route.method.map(str::to_string),
            host: sub.host.clone(),
            hostname: if sub.host.is_empty() {
                "*".to_string()
            } else {
                sub.host.clone()
            },
            service: service_url(options),
            regex_rewrite,
            cors,
            timeout_ms: seconds_to_ms(sub.timeouts.request_timeout),
            idle_timeout_ms: seconds_to_ms(sub.timeouts.idle_timeout),
            rate_limit_label,
        })
    }
}

fn operation_route<'a>(options: &Options, op: &EffectiveOperation<'a>) -> Route<'a> {
    let (pattern, prefix_regex) = path_pattern(op.path, op.operation);
    Route {
        name: mapping_name(&options.service.name, op.method, op.path, op.operation),
        prefix: options.path.join(&pattern),
        prefix_regex,
        method: Some(op.method),
        options: op.options.clone(),
    }
}

/// `{service}-{operationId}`, or `{service}-{method}{stripped path}` without one, lowercased
pub fn mapping_name(service: &str, method: &str, path: &str, operation: &Operation) -> String {
    let name = match operation.operation_id.as_deref() {
        Some(id) if !id.is_empty() => format!("{service}-{id}"),
        _ => format!("{service}-{method}{}", strip_path(path)),
    };
    name.to_lowercase()
}

/// Expand a URL template into a mapping prefix
///
/// Placeholders become [`PATH_PARAM_REGEX`] when at least one of them is
/// declared as an `in: path` parameter; the boolean reports whether that
/// happened.
pub fn path_pattern(template: &str, operation: &Operation) -> (String, bool) {
    let placeholders = path_template_params(template);
    let declared = placeholders
        .iter()
        .any(|name| operation.path_parameters().any(|p| p == *name));
    if !declared {
        return (template.to_string(), false);
    }

    let mut pattern = template.to_string();
    for name in placeholders {
        pattern = pattern.replace(&format!("{{{name}}}"), PATH_PARAM_REGEX);
    }
    (pattern, true)
}

fn seconds_to_ms(seconds: u32) -> Option<u64> {
    (seconds > 0).then(|| u64::from(seconds) * 1000)
}
