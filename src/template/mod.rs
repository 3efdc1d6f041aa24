//! Template rendering for endpoint definitions.
//!
//! Every templated field of an endpoint goes through a [`TemplateRenderer`].
//! The executor receives its renderer at construction time, so tests and
//! embedders can swap the engine without touching global state.

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use thiserror::Error;

use crate::context::DataContext;

#[derive(Debug, Error)]
#[error("Failed to render template {template:?}: {source}")]
pub struct TemplateError {
    pub template: String,
    #[source]
    pub source: minijinja::Error,
}

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &DataContext) -> Result<String, TemplateError>;
}

/// Mustache-compatible rendering for `{{ name }}` and `{{ a.b }}` lookups.
///
/// Missing variables, and lookups through them, render as the empty string.
/// Output is never escaped.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, template: &str, context: &DataContext) -> Result<String, TemplateError> {
        if !template.contains("{{") && !template.contains("{%") {
            return Ok(template.to_string());
        }
        self.env
            .render_str(template, context)
            .map_err(|source| TemplateError {
                template: template.to_string(),
                source,
            })
    }
}
