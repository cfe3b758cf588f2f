//! Linkerd `ServiceProfile` generator
//!
//! One route per effective (path, method). The URL template is used as the
//! route's `pathRegex` unchanged.

use crate::flags::{common_flags, FlagKind, FlagSpec};
use crate::manifest::{yaml_stream, Object, ObjectMeta};
use crate::Generator;
use kusk_gen_common::{ApiDescription, Options, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const API_VERSION: &str = "linkerd.io/v1alpha2";
pub const KIND: &str = "ServiceProfile";

pub type ServiceProfile = Object<ServiceProfileSpec>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProfileSpec {
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// `METHOD path`
    pub name: String,
    pub condition: RequestMatch,
    /// Go duration, e.g. `30s`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMatch {
    pub method: String,
    pub path_regex: String,
}

pub struct LinkerdGenerator;

impl LinkerdGenerator {
    /// Build the ServiceProfile, `None` when no operation is effective
    pub fn service_profile(&self, options: &Options, api: &ApiDescription) -> Option<ServiceProfile> {
        let routes: Vec<RouteSpec> = options
            .effective_operations(api)
            .into_iter()
            .map(|op| RouteSpec {
                name: format!("{} {}", op.method, op.path),
                condition: RequestMatch {
                    method: op.method.to_string(),
                    path_regex: op.path.to_string(),
                },
                timeout: (op.options.timeouts.request_timeout > 0)
                    .then(|| format!("{}s", op.options.timeouts.request_timeout)),
            })
            .collect();

        if routes.is_empty() {
            debug!("no effective operations, skipping ServiceProfile");
            return None;
        }

        let name = format!(
            "{}.{}.svc.{}",
            options.service.name, options.service.namespace, options.cluster.cluster_domain
        );
        Some(Object::new(
            API_VERSION,
            KIND,
            ObjectMeta::new(name, options.service.namespace.clone()),
            ServiceProfileSpec { routes },
        ))
    }
}

impl Generator for LinkerdGenerator {
    fn cmd(&self) -> &'static str {
        "linkerd"
    }

    fn short_description(&self) -> &'static str {
        "Generates Linkerd Service Profiles for your service"
    }

    fn long_description(&self) -> &'static str {
        "Generates a Linkerd ServiceProfile with one route per API operation, \
         so Linkerd reports per-route metrics and applies per-route timeouts."
    }

    fn flags(&self) -> Vec<FlagSpec> {
        let mut flags = common_flags();
        flags.push(FlagSpec::new(
            "cluster.cluster_domain",
            FlagKind::String,
            "internal Kubernetes cluster domain",
        ));
        flags
    }

    fn generate(&self, options: &Options, api: &ApiDescription) -> Result<String> {
        let documents = self
            .service_profile(options, api)
            .map(|profile| profile.to_yaml())
            .transpose()?;
        Ok(yaml_stream(documents))
    }
}
