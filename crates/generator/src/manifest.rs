//! Shared Kubernetes object plumbing

use kusk_gen_common::{Options, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Object metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }
}

/// A typed Kubernetes object: `apiVersion`, `kind`, `metadata`, `spec`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object<S> {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: S,
}

impl<S: Serialize> Object<S> {
    pub fn new(api_version: &str, kind: &str, metadata: ObjectMeta, spec: S) -> Self {
        Self {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            metadata,
            spec,
        }
    }

    /// Serialize as a single YAML document
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Join YAML documents into a `---` separated stream
///
/// ```
/// use kusk_gen_generator::manifest::yaml_stream;
///
/// let stream = yaml_stream(vec!["kind: A\n".to_string(), "kind: B".to_string()]);
/// assert_eq!(stream, "---\nkind: A\n---\nkind: B\n");
/// ```
pub fn yaml_stream<I>(documents: I) -> String
where
    I: IntoIterator<Item = String>,
{
    documents
        .into_iter()
        .map(|doc| format!("---\n{}\n", doc.trim_end()))
        .collect()
}

/// `name.namespace`, with `:port` appended when the port is set
pub fn service_url(options: &Options) -> String {
    let service = &options.service;
    if service.port == 0 {
        format!("{}.{}", service.name, service.namespace)
    } else {
        format!("{}.{}:{}", service.name, service.namespace, service.port)
    }
}

/// `ceil(burst / rps)`, `None` when either is zero
pub fn burst_factor(rps: u32, burst: u32) -> Option<u32> {
    if rps == 0 || burst == 0 {
        None
    } else {
        Some(burst.div_ceil(rps))
    }
}
