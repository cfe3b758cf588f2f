//! Ambassador 1.x (`getambassador.io/v2` CRDs)

use super::AbstractGenerator;
use crate::flags::{common_flags, FlagSpec};
use crate::templates::MAPPING_V1;
use crate::Generator;
use kusk_gen_common::{ApiDescription, Options, Result};

const RATE_LIMIT_API_VERSION: &str = "getambassador.io/v2";

pub struct AmbassadorGenerator {
    inner: AbstractGenerator,
}

impl AmbassadorGenerator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: AbstractGenerator::new(MAPPING_V1, RATE_LIMIT_API_VERSION)?,
        })
    }
}

impl Generator for AmbassadorGenerator {
    fn cmd(&self) -> &'static str {
        "ambassador"
    }

    fn short_description(&self) -> &'static str {
        "Generates Ambassador Mappings for your service"
    }

    fn long_description(&self) -> &'static str {
        "Generates Ambassador 1.x Mapping and RateLimit objects (getambassador.io/v2) \
         for every operation of the API, or a single base-path Mapping when \
         path.split is false."
    }

    fn flags(&self) -> Vec<FlagSpec> {
        common_flags()
    }

    fn generate(&self, options: &Options, api: &ApiDescription) -> Result<String> {
        self.inner.generate(options, api)
    }
}
