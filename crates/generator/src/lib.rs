//! Kubernetes manifest generators for kusk-gen
//!
//! Each generator turns resolved [`Options`] and a parsed [`ApiDescription`]
//! into a YAML stream of Kubernetes objects for one gateway or mesh:
//!
//! | Command         | Objects                                                     |
//! |-----------------|-------------------------------------------------------------|
//! | `ambassador`    | `Mapping`, `RateLimit` (`getambassador.io/v2`)              |
//! | `ambassador2`   | `Mapping` (`x.getambassador.io/v3alpha1`), `RateLimit`      |
//! | `linkerd`       | `ServiceProfile`                                            |
//! | `nginx-ingress` | `Ingress` (`networking.k8s.io/v1`)                          |
//! | `traefik`       | `Middleware`, `ServersTransport`, `IngressRoute`            |
//!
//! Output is deterministic: the same inputs always render the same bytes.

pub mod ambassador;
pub mod flags;
pub mod linkerd;
pub mod manifest;
pub mod nginx_ingress;
pub mod traefik;

mod templates;

pub use ambassador::{AmbassadorGenerator, AmbassadorV2Generator};
pub use flags::{common_flags, flags_to_value, FlagKind, FlagSpec, FlagValue};
pub use linkerd::LinkerdGenerator;
pub use nginx_ingress::NginxIngressGenerator;
pub use traefik::TraefikGenerator;

use kusk_gen_common::{ApiDescription, GeneratorError, Options, Result};
use std::collections::BTreeMap;

/// A manifest generator exposed as a CLI subcommand
#[cfg_attr(test, mockall::automock)]
pub trait Generator {
    /// Subcommand name, e.g. `ambassador`
    fn cmd(&self) -> &'static str;

    fn short_description(&self) -> &'static str;

    fn long_description(&self) -> &'static str;

    /// Flags accepted on top of `--in`
    fn flags(&self) -> Vec<FlagSpec>;

    /// Render the manifests as a `---` separated YAML stream
    fn generate(&self, options: &Options, api: &ApiDescription) -> Result<String>;
}

/// Name -> generator lookup
///
/// Filled once at startup and read-only afterwards.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: BTreeMap<&'static str, Box<dyn Generator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a generator, replacing any previous one with the same command
    pub fn register(&mut self, generator: Box<dyn Generator>) {
        self.generators.insert(generator.cmd(), generator);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Generator> {
        self.generators
            .get(name)
            .map(|g| &**g)
            .ok_or_else(|| GeneratorError::UnknownGenerator(name.to_string()))
    }

    /// Generators in command-name order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Generator> {
        self.generators.values().map(|g| &**g)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

/// URL template with `/`, `{` and `}` removed
///
/// ```
/// use kusk_gen_generator::strip_path;
///
/// assert_eq!(strip_path("/pet/{petId}/uploadImage"), "petpetIduploadImage");
/// ```
pub fn strip_path(path: &str) -> String {
    path.chars().filter(|c| !matches!(c, '/' | '{' | '}')).collect()
}

/// Name fragment derived from a URL template, `root` for `/`
pub fn path_slug(path: &str) -> String {
    let slug = strip_path(path).to_lowercase();
    if slug.is_empty() {
        "root".to_string()
    } else {
        slug
    }
}
