//! Traefik CRD generator
//!
//! Emits `Middleware` objects (strip-prefix, CORS headers, rate limit),
//! `ServersTransport` objects for timeouts and a single `IngressRoute`.
//!
//! Settings overridden at path or operation scope become objects of their
//! own, named after the scope:
//!
//! | Scope     | Name                                |
//! |-----------|-------------------------------------|
//! | global    | `{service}-cors`                    |
//! | path      | `{service}-{pathSlug}-cors`         |
//! | operation | `{service}-{pathSlug}-{method}-cors`|
//!
//! and likewise with `-ratelimit` and `-transport`. Objects are deduplicated
//! by spec, so an override equal to an already emitted object reuses it. When
//! two scopes derive the same name for different specs (`/` and `/root` both
//! slug to `root`), the later one in (path, method) order gets a numeric
//! suffix: `{service}-root-cors-2`.

use crate::flags::{common_flags, FlagSpec};
use crate::manifest::{yaml_stream, Object, ObjectMeta};
use crate::{path_slug, Generator};
use kusk_gen_common::{
    ApiDescription, CorsOptions, Options, OverrideScope, RateLimitOptions, Result, SubOptions,
    TimeoutOptions,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use tracing::debug;

pub const API_VERSION: &str = "traefik.containo.us/v1alpha1";

pub type Middleware = Object<MiddlewareSpec>;
pub type ServersTransport = Object<ServersTransportSpec>;
pub type IngressRoute = Object<IngressRouteSpec>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiddlewareSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_prefix: Option<StripPrefix>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StripPrefix {
    pub prefixes: Vec<String>,
}

/// CORS subset of the headers middleware
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headers {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_control_allow_origin_list: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_control_allow_methods: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_control_allow_headers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_control_expose_headers: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_control_allow_credentials: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_control_max_age: Option<u32>,

    #[serde(default)]
    pub add_vary_header: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimit {
    pub average: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServersTransportSpec {
    pub forwarding_timeouts: ForwardingTimeouts,
}

/// Go durations, e.g. `30s`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardingTimeouts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_header_timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_conn_timeout: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngressRouteSpec {
    pub routes: Vec<Route>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub kind: String,

    #[serde(rename = "match")]
    pub match_rule: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middlewares: Vec<MiddlewareRef>,

    pub services: Vec<ServiceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRef {
    pub name: String,
    pub namespace: String,
    pub port: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers_transport: Option<String>,
}

impl From<&CorsOptions> for MiddlewareSpec {
    fn from(cors: &CorsOptions) -> Self {
        Self {
            headers: Some(Headers {
                access_control_allow_origin_list: cors.origins.clone(),
                access_control_allow_methods: cors.methods.clone(),
                access_control_allow_headers: cors.headers.clone(),
                access_control_expose_headers: cors.expose_headers.clone(),
                access_control_allow_credentials: cors.credentials,
                access_control_max_age: (cors.max_age > 0).then_some(cors.max_age),
                add_vary_header: true,
            }),
            ..Default::default()
        }
    }
}

impl From<&RateLimitOptions> for MiddlewareSpec {
    fn from(limits: &RateLimitOptions) -> Self {
        Self {
            rate_limit: Some(RateLimit {
                average: limits.rps,
                burst: (limits.burst > 0).then_some(limits.burst),
            }),
            ..Default::default()
        }
    }
}

impl From<&TimeoutOptions> for ServersTransportSpec {
    fn from(timeouts: &TimeoutOptions) -> Self {
        let duration = |seconds: u32| (seconds > 0).then(|| format!("{seconds}s"));
        Self {
            forwarding_timeouts: ForwardingTimeouts {
                response_header_timeout: duration(timeouts.request_timeout),
                idle_conn_timeout: duration(timeouts.idle_timeout),
            },
        }
    }
}

/// Objects keyed by name, deduplicated by spec
struct ObjectTable<S> {
    names: HashMap<S, String>,
    objects: BTreeMap<String, S>,
}

impl<S: Clone + Eq + Hash> ObjectTable<S> {
    fn new() -> Self {
        Self {
            names: HashMap::new(),
            objects: BTreeMap::new(),
        }
    }

    /// Name of the object carrying `spec`, adding it as `name` if unseen
    ///
    /// A name already taken by a different spec gets a `-2`, `-3`, ...
    /// suffix, so no route ever points at another scope's object.
    fn intern(&mut self, name: String, spec: S) -> String {
        if let Some(existing) = self.names.get(&spec) {
            return existing.clone();
        }
        let name = self.free_name(name);
        self.names.insert(spec.clone(), name.clone());
        self.objects.insert(name.clone(), spec);
        name
    }

    fn free_name(&self, name: String) -> String {
        if !self.objects.contains_key(&name) {
            return name;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{name}-{n}");
            if !self.objects.contains_key(&candidate) {
                debug!(name = %name, renamed = %candidate, "object name taken by another spec");
                return candidate;
            }
            n += 1;
        }
    }
}

/// Where a route sits, for naming scoped objects
struct RouteScope<'a> {
    path: &'a str,
    method: &'a str,
}

struct Builder<'o> {
    options: &'o Options,
    middlewares: ObjectTable<MiddlewareSpec>,
    transports: ObjectTable<ServersTransportSpec>,
    strip_prefix: Option<String>,
}

impl<'o> Builder<'o> {
    fn new(options: &'o Options) -> Self {
        let mut middlewares = ObjectTable::new();
        let strip_prefix = options.path.trim_prefix_applies().then(|| {
            middlewares.intern(
                format!("{}-strip-prefix", options.service.name),
                MiddlewareSpec {
                    strip_prefix: Some(StripPrefix {
                        prefixes: vec![options.path.trim_prefix.clone()],
                    }),
                    ..Default::default()
                },
            )
        });
        Self {
            options,
            middlewares,
            transports: ObjectTable::new(),
            strip_prefix,
        }
    }

    fn object_name(
        &self,
        scope: Option<&RouteScope<'_>>,
        which: OverrideScope,
        suffix: &str,
    ) -> String {
        let service = &self.options.service.name;
        match (scope, which) {
            (Some(s), OverrideScope::Operation) => format!(
                "{service}-{}-{}-{suffix}",
                path_slug(s.path),
                s.method.to_lowercase()
            ),
            (Some(s), OverrideScope::Path) => format!("{service}-{}-{suffix}", path_slug(s.path)),
            _ => format!("{service}-{suffix}"),
        }
    }

    fn scope_of<F>(&self, scope: Option<&RouteScope<'_>>, is_set: F) -> OverrideScope
    where
        F: Fn(&SubOptions) -> bool,
    {
        match scope {
            Some(s) => self.options.override_scope(s.path, s.method, is_set),
            None => OverrideScope::Global,
        }
    }

    fn route(
        &mut self,
        match_rule: String,
        scope: Option<RouteScope<'_>>,
        sub: &SubOptions,
    ) -> Route {
        let scope = scope.as_ref();
        let mut middlewares = Vec::new();

        if let Some(name) = &self.strip_prefix {
            middlewares.push(MiddlewareRef { name: name.clone() });
        }

        if !sub.cors.is_empty() {
            let which = self.scope_of(scope, |s| !s.cors.is_empty());
            let name = self.object_name(scope, which, "cors");
            let name = self.middlewares.intern(name, MiddlewareSpec::from(&sub.cors));
            middlewares.push(MiddlewareRef { name });
        }

        if !sub.rate_limits.is_empty() {
            let which = self.scope_of(scope, |s| !s.rate_limits.is_empty());
            let name = self.object_name(scope, which, "ratelimit");
            let name = self
                .middlewares
                .intern(name, MiddlewareSpec::from(&sub.rate_limits));
            middlewares.push(MiddlewareRef { name });
        }

        let servers_transport = (!sub.timeouts.is_empty()).then(|| {
            let which = self.scope_of(scope, |s| !s.timeouts.is_empty());
            let name = self.object_name(scope, which, "transport");
            self.transports
                .intern(name, ServersTransportSpec::from(&sub.timeouts))
        });

        Route {
            kind: "Rule".to_string(),
            match_rule,
            middlewares,
            services: vec![ServiceRef {
                name: self.options.service.name.clone(),
                namespace: self.options.service.namespace.clone(),
                port: self.options.service.port,
                servers_transport,
            }],
        }
    }

    fn into_documents(self, mut routes: Vec<Route>) -> Result<Vec<String>> {
        let options = self.options;
        let meta = |name: &str| ObjectMeta::new(name, options.namespace.clone());
        let mut documents = Vec::new();

        for (name, spec) in self.middlewares.objects {
            let object: Middleware = Object::new(API_VERSION, "Middleware", meta(&name), spec);
            documents.push(object.to_yaml()?);
        }
        for (name, spec) in self.transports.objects {
            let object: ServersTransport =
                Object::new(API_VERSION, "ServersTransport", meta(&name), spec);
            documents.push(object.to_yaml()?);
        }

        routes.sort_by(|a, b| a.match_rule.cmp(&b.match_rule));
        let route: IngressRoute = Object::new(
            API_VERSION,
            "IngressRoute",
            meta(&options.service.name),
            IngressRouteSpec { routes },
        );
        documents.push(route.to_yaml()?);

        Ok(documents)
    }
}

/// `[Host("h") && ]PathPrefix("p")[ && Method("M")]`
pub fn match_rule(host: &str, prefix: &str, method: Option<&str>) -> String {
    let mut rule = String::new();
    if !host.is_empty() {
        rule.push_str(&format!("Host(\"{host}\") && "));
    }
    rule.push_str(&format!("PathPrefix(\"{prefix}\")"));
    if let Some(method) = method {
        rule.push_str(&format!(" && Method(\"{method}\")"));
    }
    rule
}

pub struct TraefikGenerator;

impl Generator for TraefikGenerator {
    fn cmd(&self) -> &'static str {
        "traefik"
    }

    fn short_description(&self) -> &'static str {
        "Generates Traefik resources for your service"
    }

    fn long_description(&self) -> &'static str {
        "Generates a Traefik IngressRoute with Middleware and ServersTransport \
         objects for strip-prefix, CORS, rate limit and timeout settings. \
         Path- and operation-level overrides get their own objects."
    }

    fn flags(&self) -> Vec<FlagSpec> {
        common_flags()
    }

    fn generate(&self, options: &Options, api: &ApiDescription) -> Result<String> {
        let operations = options.effective_operations(api);
        if operations.is_empty() {
            debug!("no effective operations, nothing to render");
            return Ok(String::new());
        }

        let mut builder = Builder::new(options);
        let routes = if options.path.is_root_only() {
            debug!(base = %options.path.base, "root-only mode, rendering a single route");
            let sub = SubOptions::from_global(options);
            let rule = match_rule(&sub.host, &options.path.base, None);
            vec![builder.route(rule, None, &sub)]
        } else {
            operations
                .iter()
                .map(|op| {
                    let prefix = options.path.join(op.path);
                    let rule = match_rule(&op.options.host, &prefix, Some(op.method));
                    let scope = RouteScope {
                        path: op.path,
                        method: op.method,
                    };
                    builder.route(rule, Some(scope), &op.options)
                })
                .collect()
        };

        Ok(yaml_stream(builder.into_documents(routes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_rule() {
        assert_eq!(
            match_rule("", "/pet", Some("PUT")),
            r#"PathPrefix("/pet") && Method("PUT")"#
        );
        assert_eq!(
            match_rule("example.com", "/api", None),
            r#"Host("example.com") && PathPrefix("/api")"#
        );
    }

    #[test]
    fn test_object_table_deduplicates_by_spec() {
        let mut table = ObjectTable::new();
        let spec = MiddlewareSpec::from(&RateLimitOptions {
            group: String::new(),
            rps: 5,
            burst: 0,
        });
        assert_eq!(table.intern("a-ratelimit".into(), spec.clone()), "a-ratelimit");
        assert_eq!(table.intern("a-pet-ratelimit".into(), spec), "a-ratelimit");
        assert_eq!(table.objects.len(), 1);
    }

    #[test]
    fn test_object_table_never_reuses_a_name_for_another_spec() {
        let mut table = ObjectTable::new();
        let limit = |rps| {
            MiddlewareSpec::from(&RateLimitOptions {
                group: String::new(),
                rps,
                burst: 0,
            })
        };
        assert_eq!(table.intern("a-root-ratelimit".into(), limit(5)), "a-root-ratelimit");
        assert_eq!(table.intern("a-root-ratelimit".into(), limit(7)), "a-root-ratelimit-2");
        assert_eq!(table.intern("a-root-ratelimit".into(), limit(9)), "a-root-ratelimit-3");
        assert_eq!(table.intern("a-root-ratelimit".into(), limit(7)), "a-root-ratelimit-2");
        assert_eq!(table.objects["a-root-ratelimit"], limit(5));
        assert_eq!(table.objects["a-root-ratelimit-2"], limit(7));
        assert_eq!(table.objects.len(), 3);
    }

    #[test]
    fn test_transport_durations() {
        let spec = ServersTransportSpec::from(&TimeoutOptions {
            request_timeout: 30,
            idle_timeout: 0,
        });
        assert_eq!(
            spec.forwarding_timeouts.response_header_timeout.as_deref(),
            Some("30s")
        );
        assert_eq!(spec.forwarding_timeouts.idle_conn_timeout, None);
    }
}
