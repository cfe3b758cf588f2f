//! Emissary-ingress / Ambassador 2.x (`x.getambassador.io/v3alpha1` mappings)
//!
//! Differs from 1.x in the Mapping shape: a `hostname` is always set and
//! CORS fields are lists instead of comma-joined strings.

use super::AbstractGenerator;
use crate::flags::{common_flags, FlagSpec};
use crate::templates::MAPPING_V2;
use crate::Generator;
use kusk_gen_common::{ApiDescription, Options, Result};

const RATE_LIMIT_API_VERSION: &str = "getambassador.io/v3alpha1";

pub struct AmbassadorV2Generator {
    inner: AbstractGenerator,
}

impl AmbassadorV2Generator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: AbstractGenerator::new(MAPPING_V2, RATE_LIMIT_API_VERSION)?,
        })
    }
}

impl Generator for AmbassadorV2Generator {
    fn cmd(&self) -> &'static str {
        "ambassador2"
    }

    fn short_description(&self) -> &'static str {
        "Generates Ambassador 2.x Mappings for your service"
    }

    fn long_description(&self) -> &'static str {
        "Generates Emissary-ingress / Ambassador 2.x Mapping objects \
         (x.getambassador.io/v3alpha1) and RateLimit objects for every operation \
         of the API, or a single base-path Mapping when path.split is false."
    }

    fn flags(&self) -> Vec<FlagSpec> {
        common_flags()
    }

    fn generate(&self, options: &Options, api: &ApiDescription) -> Result<String> {
        self.inner.generate(options, api)
    }
}
