//! Option model handed to generators
//!
//! `Options` is the fully resolved, service-wide configuration. `SubOptions`
//! carries what can be overridden per path or per operation through `x-kusk`
//! blocks. Field names match the keys accepted in `x-kusk` and the dotted CLI
//! flags (`--service.port`, `--cors.origins`, ...).

use crate::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized configuration passed to a generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Global kill switch
    pub disabled: bool,

    /// Namespace for generated resources
    pub namespace: String,

    /// Upstream service the API is served by
    pub service: ServiceOptions,

    /// Base path handling
    pub path: PathOptions,

    /// HTTP Host to match, empty for any
    pub host: String,

    pub cluster: ClusterOptions,

    pub ingress: IngressOptions,

    pub nginx_ingress: NginxIngressOptions,

    pub cors: CorsOptions,

    pub timeouts: TimeoutOptions,

    pub rate_limits: RateLimitOptions,

    /// URL template -> overrides, filled from path-level `x-kusk` blocks
    #[serde(skip)]
    pub path_sub_options: BTreeMap<String, SubOptions>,

    /// `METHOD` + URL template -> overrides, filled from operation-level `x-kusk` blocks
    #[serde(skip)]
    pub operation_sub_options: BTreeMap<String, SubOptions>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            disabled: false,
            namespace: "default".to_string(),
            service: ServiceOptions::default(),
            path: PathOptions::default(),
            host: String::new(),
            cluster: ClusterOptions::default(),
            ingress: IngressOptions::default(),
            nginx_ingress: NginxIngressOptions::default(),
            cors: CorsOptions::default(),
            timeouts: TimeoutOptions::default(),
            rate_limits: RateLimitOptions::default(),
            path_sub_options: BTreeMap::new(),
            operation_sub_options: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceOptions {
    pub namespace: String,
    pub name: String,
    pub port: u32,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            name: String::new(),
            port: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    /// Prefix every route is served under
    pub base: String,

    /// Prefix stripped before forwarding upstream; only applied when `base` starts with it
    pub trim_prefix: String,

    /// One object per (method, path) instead of a single base-path object
    pub split: bool,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            base: "/".to_string(),
            trim_prefix: String::new(),
            split: false,
        }
    }
}

impl PathOptions {
    /// Whether `trim_prefix` is set and actually prefixes `base`
    pub fn trim_prefix_applies(&self) -> bool {
        !self.trim_prefix.is_empty() && self.base.starts_with(&self.trim_prefix)
    }

    /// Prepend the base path to a URL template
    ///
    /// ```
    /// use kusk_gen_common::PathOptions;
    ///
    /// let mut path = PathOptions::default();
    /// assert_eq!(path.join("/pet"), "/pet");
    /// path.base = "/api/v3/".to_string();
    /// assert_eq!(path.join("/pet"), "/api/v3/pet");
    /// ```
    pub fn join(&self, template: &str) -> String {
        let joined = format!("{}{}", self.base.trim_end_matches('/'), template);
        if joined.is_empty() {
            "/".to_string()
        } else {
            joined
        }
    }

    /// Whether all operations collapse into a single base-path object
    pub fn is_root_only(&self) -> bool {
        !self.split && !self.base.is_empty() && self.base != "/"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    pub cluster_domain: String,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            cluster_domain: "cluster.local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressOptions {
    pub host: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NginxIngressOptions {
    pub rewrite_target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsOptions {
    pub origins: Vec<String>,
    pub methods: Vec<String>,
    pub headers: Vec<String>,
    pub expose_headers: Vec<String>,
    /// Unset leaves the gateway default in place
    pub credentials: Option<bool>,
    /// Seconds
    pub max_age: u32,
}

impl CorsOptions {
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
            && self.methods.is_empty()
            && self.headers.is_empty()
            && self.expose_headers.is_empty()
            && self.credentials.is_none()
            && self.max_age == 0
    }
}

/// Timeouts in seconds, 0 meaning unset
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutOptions {
    pub request_timeout: u32,
    pub idle_timeout: u32,
}

impl TimeoutOptions {
    pub fn is_empty(&self) -> bool {
        self.request_timeout == 0 && self.idle_timeout == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitOptions {
    /// Operations sharing a group share one limit
    pub group: String,
    pub rps: u32,
    pub burst: u32,
}

impl RateLimitOptions {
    pub fn is_empty(&self) -> bool {
        self.rps == 0
    }
}

/// Overrides attached to a path or an operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubOptions {
    /// Unset inherits from the enclosing scope
    pub disabled: Option<bool>,
    pub host: String,
    pub cors: CorsOptions,
    pub timeouts: TimeoutOptions,
    pub rate_limits: RateLimitOptions,
}

impl SubOptions {
    /// Global options seen through the per-operation lens
    pub fn from_global(options: &Options) -> Self {
        Self {
            disabled: Some(options.disabled),
            host: options.host.clone(),
            cors: options.cors.clone(),
            timeouts: options.timeouts.clone(),
            rate_limits: options.rate_limits.clone(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }
}

/// Overlay a higher-precedence value onto `self`
///
/// Zero values (empty strings, `0`, empty lists, `None`) in `other` count as
/// unset and leave `self` untouched.
pub trait Overlay {
    fn overlay(&mut self, other: &Self);
}

fn overlay_string(target: &mut String, other: &str) {
    if !other.is_empty() {
        *target = other.to_string();
    }
}

fn overlay_list(target: &mut Vec<String>, other: &[String]) {
    if !other.is_empty() {
        *target = other.to_vec();
    }
}

fn overlay_number(target: &mut u32, other: u32) {
    if other != 0 {
        *target = other;
    }
}

impl Overlay for CorsOptions {
    fn overlay(&mut self, other: &Self) {
        overlay_list(&mut self.origins, &other.origins);
        overlay_list(&mut self.methods, &other.methods);
        overlay_list(&mut self.headers, &other.headers);
        overlay_list(&mut self.expose_headers, &other.expose_headers);
        if other.credentials.is_some() {
            self.credentials = other.credentials;
        }
        overlay_number(&mut self.max_age, other.max_age);
    }
}

impl Overlay for TimeoutOptions {
    fn overlay(&mut self, other: &Self) {
        overlay_number(&mut self.request_timeout, other.request_timeout);
        overlay_number(&mut self.idle_timeout, other.idle_timeout);
    }
}

impl Overlay for RateLimitOptions {
    fn overlay(&mut self, other: &Self) {
        overlay_string(&mut self.group, &other.group);
        overlay_number(&mut self.rps, other.rps);
        overlay_number(&mut self.burst, other.burst);
    }
}

impl Overlay for SubOptions {
    fn overlay(&mut self, other: &Self) {
        if other.disabled.is_some() {
            self.disabled = other.disabled;
        }
        overlay_string(&mut self.host, &other.host);
        self.cors.overlay(&other.cors);
        self.timeouts.overlay(&other.timeouts);
        self.rate_limits.overlay(&other.rate_limits);
    }
}

/// Where an effective setting for an operation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OverrideScope {
    Global,
    Path,
    Operation,
}

impl Options {
    /// Key into `operation_sub_options`: uppercase method followed by the URL template
    pub fn operation_key(method: &str, path: &str) -> String {
        format!("{}{}", method.to_uppercase(), path)
    }

    /// Effective overrides for one operation: global, then path, then operation
    pub fn sub_options_for(&self, path: &str, method: &str) -> SubOptions {
        let mut effective = SubOptions::from_global(self);
        if let Some(path_options) = self.path_sub_options.get(path) {
            effective.overlay(path_options);
        }
        if let Some(op_options) = self
            .operation_sub_options
            .get(&Self::operation_key(method, path))
        {
            effective.overlay(op_options);
        }
        effective
    }

    /// Innermost scope whose overrides satisfy `is_set`
    pub fn override_scope<F>(&self, path: &str, method: &str, is_set: F) -> OverrideScope
    where
        F: Fn(&SubOptions) -> bool,
    {
        if self
            .operation_sub_options
            .get(&Self::operation_key(method, path))
            .is_some_and(&is_set)
        {
            OverrideScope::Operation
        } else if self.path_sub_options.get(path).is_some_and(&is_set) {
            OverrideScope::Path
        } else {
            OverrideScope::Global
        }
    }

    /// Check invariants, failing with every violation at once
    pub fn validate(&self) -> Result<()> {
        let problems = self.validation_problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(GeneratorError::OptionsValidation(problems))
        }
    }

    /// List violated invariants
    pub fn validation_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.namespace.is_empty() {
            problems.push("namespace must not be empty".to_string());
        }
        if self.service.name.is_empty() {
            problems.push("service.name is required".to_string());
        }
        if self.service.namespace.is_empty() {
            problems.push("service.namespace must not be empty".to_string());
        }
        if !(1..=65535).contains(&self.service.port) {
            problems.push(format!(
                "service.port must be between 1 and 65535, got {}",
                self.service.port
            ));
        }
        if self.cluster.cluster_domain.is_empty() {
            problems.push("cluster.cluster_domain must not be empty".to_string());
        }
        if !self.path.base.starts_with('/') {
            problems.push(format!(
                "path.base must start with '/', got {:?}",
                self.path.base
            ));
        }
        if self.path.base.contains(|c| c == '"' || c == '\\') {
            problems.push(format!(
                "path.base must not contain quotes or backslashes, got {:?}",
                self.path.base
            ));
        }

        check_host("host", &self.host, &mut problems);
        check_host("ingress.host", &self.ingress.host, &mut problems);
        check_rate_limits("rate_limits", &self.rate_limits, &mut problems);

        for (path, sub) in &self.path_sub_options {
            sub.collect_problems(&format!("path {path}"), &mut problems);
        }
        for (key, sub) in &self.operation_sub_options {
            sub.collect_problems(&format!("operation {key}"), &mut problems);
        }

        problems
    }
}

impl SubOptions {
    fn collect_problems(&self, scope: &str, problems: &mut Vec<String>) {
        check_host(&format!("{scope}: host"), &self.host, problems);
        check_rate_limits(&format!("{scope}: rate_limits"), &self.rate_limits, problems);
    }
}

fn check_host(field: &str, host: &str, problems: &mut Vec<String>) {
    if host.contains("://") || host.contains('/') {
        problems.push(format!(
            "{field} must be a bare hostname without scheme or path, got {host:?}"
        ));
    }
    if host.contains(|c| c == '"' || c == '\\') {
        problems.push(format!("{field} must not contain quotes or backslashes, got {host:?}"));
    }
}

fn check_rate_limits(field: &str, limits: &RateLimitOptions, problems: &mut Vec<String>) {
    if limits.burst > 0 && limits.rps == 0 {
        problems.push(format!("{field}.burst requires {field}.rps"));
    }
}
