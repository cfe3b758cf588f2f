//! Template loading and rendering

use kusk_gen_common::{GeneratorError, Result};
use regex::Regex;
use serde::Serialize;
use tera::{Context, Tera};

pub const MAPPING_V1: &str = "ambassador_mapping_v1.yaml";
pub const MAPPING_V2: &str = "ambassador_mapping_v2.yaml";
pub const RATE_LIMIT: &str = "ambassador_ratelimit.yaml";

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.add_raw_template(
        MAPPING_V1,
        include_str!("../templates/ambassador_mapping_v1.yaml.tera"),
    )
    .map_err(|e| {
        GeneratorError::TemplateRender(format!("Failed to load {MAPPING_V1} template: {e}"))
    })?;

    tera.add_raw_template(
        MAPPING_V2,
        include_str!("../templates/ambassador_mapping_v2.yaml.tera"),
    )
    .map_err(|e| {
        GeneratorError::TemplateRender(format!("Failed to load {MAPPING_V2} template: {e}"))
    })?;

    tera.add_raw_template(
        RATE_LIMIT,
        include_str!("../templates/ambassador_ratelimit.yaml.tera"),
    )
    .map_err(|e| {
        GeneratorError::TemplateRender(format!("Failed to load {RATE_LIMIT} template: {e}"))
    })?;

    Ok(tera)
}

/// Renders templates and collapses the blank lines left by template tags
pub struct Renderer {
    tera: Tera,
    blank_lines: Regex,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let blank_lines = Regex::new(r"\s*\n")
            .map_err(|e| GeneratorError::TemplateRender(format!("invalid pattern: {e}")))?;
        Ok(Self {
            tera: load_templates()?,
            blank_lines,
        })
    }

    /// Render `template` with `data` as its context
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        let context = Context::from_serialize(data)
            .map_err(|e| GeneratorError::TemplateRender(format!("{template}: {e}")))?;
        let rendered = self
            .tera
            .render(template, &context)
            .map_err(|e| GeneratorError::TemplateRender(format!("{template}: {e:?}")))?;
        Ok(self.normalize(&rendered))
    }

    fn normalize(&self, rendered: &str) -> String {
        let collapsed = self.blank_lines.replace_all(rendered, "\n");
        collapsed.trim_start_matches('\n').to_string()
    }
}
