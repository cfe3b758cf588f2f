//! Swagger 2.0 specification support
//!
//! Swagger documents are never handed downstream as-is: they are converted
//! to an OpenAPI 3 document first, so every later stage sees one shape.
//!
//! | Swagger 2.0                    | OpenAPI 3                      |
//! |--------------------------------|--------------------------------|
//! | `host` + `basePath` + `schemes`| `servers[].url`                |
//! | `in: body` parameter           | `requestBody.content.<mime>`   |
//! | `in: formData` parameters      | form `requestBody`             |
//! | `#/parameters/X` references    | inlined parameters             |

mod converter;
mod types;

pub use converter::convert_swagger_to_openapi;
pub use types::*;
