//! NGINX Ingress generator
//!
//! Emits one `networking.k8s.io/v1` Ingress forwarding everything under the
//! base path to the service. Rewrites, CORS, timeouts and rate limits are
//! expressed as `nginx.ingress.kubernetes.io/*` annotations, all taken from
//! the global options.

use crate::flags::{common_flags, FlagKind, FlagSpec};
use crate::manifest::{burst_factor, yaml_stream, Object, ObjectMeta};
use crate::Generator;
use kusk_gen_common::{ApiDescription, Options, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const API_VERSION: &str = "networking.k8s.io/v1";
pub const KIND: &str = "Ingress";
pub const INGRESS_CLASS: &str = "nginx";

const ANNOTATION_PREFIX: &str = "nginx.ingress.kubernetes.io/";

pub type Ingress = Object<IngressSpec>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    pub ingress_class_name: String,
    pub rules: Vec<IngressRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub http: HttpIngressRuleValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpIngressRuleValue {
    pub paths: Vec<HttpIngressPath>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpIngressPath {
    pub path: String,
    pub path_type: String,
    pub backend: IngressBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressBackend {
    pub service: IngressServiceBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressServiceBackend {
    pub name: String,
    pub port: ServiceBackendPort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBackendPort {
    pub number: u32,
}

pub struct NginxIngressGenerator;

impl NginxIngressGenerator {
    /// Build the Ingress, `None` when no operation is effective
    pub fn ingress(&self, options: &Options, api: &ApiDescription) -> Option<Ingress> {
        if options.effective_operations(api).is_empty() {
            debug!("no effective operations, skipping Ingress");
            return None;
        }

        let mut annotations = BTreeMap::new();
        let path = ingress_path(options, &mut annotations);
        cors_annotations(options, &mut annotations);
        timeout_annotations(options, &mut annotations);
        rate_limit_annotations(options, &mut annotations);

        let host = if options.ingress.host.is_empty() {
            &options.host
        } else {
            &options.ingress.host
        };

        let mut metadata = ObjectMeta::new(
            format!("{}-ingress", options.service.name),
            options.namespace.clone(),
        );
        metadata.annotations = annotations;

        Some(Object::new(
            API_VERSION,
            KIND,
            metadata,
            IngressSpec {
                ingress_class_name: INGRESS_CLASS.to_string(),
                rules: vec![IngressRule {
                    host: (!host.is_empty()).then(|| host.clone()),
                    http: HttpIngressRuleValue {
                        paths: vec![HttpIngressPath {
                            path,
                            path_type: "Prefix".to_string(),
                            backend: IngressBackend {
                                service: IngressServiceBackend {
                                    name: options.service.name.clone(),
                                    port: ServiceBackendPort {
                                        number: options.service.port,
                                    },
                                },
                            },
                        }],
                    },
                }],
            },
        ))
    }
}

fn annotate(annotations: &mut BTreeMap<String, String>, key: &str, value: impl Into<String>) {
    annotations.insert(format!("{ANNOTATION_PREFIX}{key}"), value.into());
}

/// Rule path, adding the rewrite annotation it needs
fn ingress_path(options: &Options, annotations: &mut BTreeMap<String, String>) -> String {
    let base = &options.path.base;
    let rewrite_target = &options.nginx_ingress.rewrite_target;

    if !rewrite_target.is_empty() {
        annotate(annotations, "rewrite-target", rewrite_target.clone());
        base.clone()
    } else if options.path.trim_prefix_applies() {
        annotate(annotations, "rewrite-target", "/$2");
        let prefix = match base.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        format!("{prefix}(/|$)(.*)")
    } else {
        base.clone()
    }
}

fn cors_annotations(options: &Options, annotations: &mut BTreeMap<String, String>) {
    let cors = &options.cors;
    if cors.is_empty() {
        return;
    }

    annotate(annotations, "enable-cors", "true");
    if !cors.origins.is_empty() {
        annotate(annotations, "cors-allow-origin", cors.origins.join(", "));
    }
    if !cors.methods.is_empty() {
        annotate(annotations, "cors-allow-methods", cors.methods.join(", "));
    }
    if !cors.headers.is_empty() {
        annotate(annotations, "cors-allow-headers", cors.headers.join(", "));
    }
    if !cors.expose_headers.is_empty() {
        annotate(annotations, "cors-expose-headers", cors.expose_headers.join(", "));
    }
    // the controller defaults to true
    if cors.credentials == Some(false) {
        annotate(annotations, "cors-allow-credentials", "false");
    }
    if cors.max_age > 0 {
        annotate(annotations, "cors-max-age", cors.max_age.to_string());
    }
}

fn timeout_annotations(options: &Options, annotations: &mut BTreeMap<String, String>) {
    let timeout = options.timeouts.request_timeout;
    if timeout > 0 {
        annotate(annotations, "proxy-read-timeout", timeout.to_string());
        annotate(annotations, "proxy-send-timeout", timeout.to_string());
    }
}

fn rate_limit_annotations(options: &Options, annotations: &mut BTreeMap<String, String>) {
    let limits = &options.rate_limits;
    if limits.is_empty() {
        return;
    }
    annotate(annotations, "limit-rps", limits.rps.to_string());
    if let Some(multiplier) = burst_factor(limits.rps, limits.burst) {
        annotate(annotations, "limit-burst-multiplier", multiplier.to_string());
    }
}

impl Generator for NginxIngressGenerator {
    fn cmd(&self) -> &'static str {
        "nginx-ingress"
    }

    fn short_description(&self) -> &'static str {
        "Generates an NGINX Ingress for your service"
    }

    fn long_description(&self) -> &'static str {
        "Generates a networking.k8s.io/v1 Ingress for the NGINX ingress controller \
         that forwards the API base path to your service, with CORS, timeout, \
         rate limit and rewrite annotations."
    }

    fn flags(&self) -> Vec<FlagSpec> {
        let mut flags = common_flags();
        flags.push(FlagSpec::new(
            "ingress.host",
            FlagKind::String,
            "host the Ingress rule matches, defaults to --host",
        ));
        flags.push(FlagSpec::new(
            "nginx_ingress.rewrite_target",
            FlagKind::String,
            "explicit rewrite target annotation",
        ));
        flags
    }

    fn generate(&self, options: &Options, api: &ApiDescription) -> Result<String> {
        let documents = self
            .ingress(options, api)
            .map(|ingress| ingress.to_yaml())
            .transpose()?;
        Ok(yaml_stream(documents))
    }
}
