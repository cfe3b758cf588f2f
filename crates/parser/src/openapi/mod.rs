//! OpenAPI 3.x specification support
//!
//! Decodes OpenAPI 3.0.x / 3.1.x documents and lowers them into the
//! normalized `ApiDescription`. Swagger 2.0 documents reach this module only
//! after conversion by [`crate::swagger`].
//!
//! ## Usage
//! ```rust,ignore
//! use kusk_gen_parser::openapi::{convert_openapi_to_api_description, OpenApiSpec};
//!
//! let spec: OpenApiSpec = serde_json::from_value(document)?;
//! let api = convert_openapi_to_api_description(&spec)?;
//! ```

mod converter;
mod types;

pub use converter::convert_openapi_to_api_description;
pub use types::*;
