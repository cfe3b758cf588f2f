//! Flag descriptors
//!
//! Generators describe their flags as data; the CLI turns them into clap
//! arguments and hands back only the values the user actually passed. Flag
//! names are the dotted option keys (`service.port`), so the collected
//! values nest straight into the flag layer of the option merge.

use kusk_gen_common::merge_layer;
use serde_json::{Map, Value};

/// Value type of a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    String,
    Integer,
    Boolean,
    /// Comma separated, e.g. `--cors.origins=a,b`
    StringList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    /// Dotted option key, also the long flag name
    pub name: &'static str,
    pub help: &'static str,
    pub kind: FlagKind,
}

impl FlagSpec {
    pub const fn new(name: &'static str, kind: FlagKind, help: &'static str) -> Self {
        Self { name, help, kind }
    }
}

/// A flag value as passed on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    String(String),
    Integer(u64),
    Boolean(bool),
    StringList(Vec<String>),
}

impl From<FlagValue> for Value {
    fn from(value: FlagValue) -> Self {
        match value {
            FlagValue::String(s) => Value::String(s),
            FlagValue::Integer(n) => Value::from(n),
            FlagValue::Boolean(b) => Value::Bool(b),
            FlagValue::StringList(items) => {
                Value::Array(items.into_iter().map(Value::String).collect())
            }
        }
    }
}

/// Flags every generator accepts
pub fn common_flags() -> Vec<FlagSpec> {
    use FlagKind::*;
    vec![
        FlagSpec::new("namespace", String, "namespace for generated resources"),
        FlagSpec::new("service.name", String, "target service name"),
        FlagSpec::new("service.namespace", String, "target service namespace"),
        FlagSpec::new("service.port", Integer, "target service port"),
        FlagSpec::new("path.base", String, "base path prefix for the API"),
        FlagSpec::new(
            "path.trim_prefix",
            String,
            "prefix stripped before requests reach the service",
        ),
        FlagSpec::new(
            "path.split",
            Boolean,
            "emit one object per operation instead of a single base-path object",
        ),
        FlagSpec::new("host", String, "HTTP host to match, empty for any"),
        FlagSpec::new("cors.origins", StringList, "allowed CORS origins"),
        FlagSpec::new("cors.methods", StringList, "allowed CORS methods"),
        FlagSpec::new("cors.headers", StringList, "allowed CORS request headers"),
        FlagSpec::new("cors.expose_headers", StringList, "CORS headers exposed to the client"),
        FlagSpec::new("cors.credentials", Boolean, "allow credentials in CORS requests"),
        FlagSpec::new("cors.max_age", Integer, "CORS preflight cache duration in seconds"),
        FlagSpec::new("timeouts.request_timeout", Integer, "request timeout in seconds"),
        FlagSpec::new("timeouts.idle_timeout", Integer, "idle connection timeout in seconds"),
        FlagSpec::new("rate_limits.group", String, "rate limit group shared by operations"),
        FlagSpec::new("rate_limits.rps", Integer, "requests per second"),
        FlagSpec::new("rate_limits.burst", Integer, "burst size in requests"),
    ]
}

/// Nest dotted flag values into an object, e.g. `service.port=8080` into
/// `{"service": {"port": 8080}}`
pub fn flags_to_value<'a, I>(flags: I) -> Value
where
    I: IntoIterator<Item = (&'a str, FlagValue)>,
{
    let mut root = Value::Object(Map::new());
    for (name, value) in flags {
        let nested = name
            .rsplit('.')
            .fold(Value::from(value), |inner, segment| {
                let mut object = Map::new();
                object.insert(segment.to_string(), inner);
                Value::Object(object)
            });
        merge_layer(&mut root, &nested);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flags_to_value_nests_dotted_names() {
        let value = flags_to_value([
            ("service.name", FlagValue::String("petstore".into())),
            ("service.port", FlagValue::Integer(8080)),
            ("path.split", FlagValue::Boolean(false)),
            ("namespace", FlagValue::String("apis".into())),
            (
                "cors.origins",
                FlagValue::StringList(vec!["http://a".into(), "http://b".into()]),
            ),
        ]);
        assert_eq!(
            value,
            json!({
                "namespace": "apis",
                "service": {"name": "petstore", "port": 8080},
                "path": {"split": false},
                "cors": {"origins": ["http://a", "http://b"]}
            })
        );
    }

    #[test]
    fn test_no_flags_is_empty_object() {
        assert_eq!(flags_to_value(Vec::new()), json!({}));
    }

    #[test]
    fn test_common_flag_names_are_unique() {
        let flags = common_flags();
        let mut names: Vec<_> = flags.iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), flags.len());
    }
}
