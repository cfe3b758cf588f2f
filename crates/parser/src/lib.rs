//! Spec adapter for kusk-gen
//!
//! Turns OpenAPI 3 and Swagger 2 documents, YAML or JSON, into the
//! normalized [`ApiDescription`] and extracts their `x-kusk` blocks.
//!
//! ## Pipeline
//!
//! 1. Decode bytes into a JSON value (YAML is converted on the way in)
//! 2. Detect the flavor from the `openapi` / `swagger` header field
//! 3. Swagger 2 only: convert to the OpenAPI 3 model
//! 4. Lower OpenAPI 3 into `ApiDescription`, resolving parameter references
//!    and folding path-level parameters into each operation

pub mod openapi;
pub mod swagger;

mod extension;
mod parser;

pub use extension::get_options;
pub use parser::{SpecFlavor, SpecParser};

use kusk_gen_common::{ApiDescription, Result};
use std::path::Path;

/// Parse a spec from raw bytes
pub fn parse(bytes: &[u8]) -> Result<ApiDescription> {
    SpecParser::from_bytes(bytes)?.parse()
}

/// Parse a spec file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ApiDescription> {
    SpecParser::from_file(path)?.parse()
}
