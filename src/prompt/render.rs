//! Prompt Renderer - Render the parser-authoring prompt using Handlebars
//!
//! The default template is embedded; a replacement can be loaded from disk.

use std::path::Path;

use handlebars::Handlebars;
use serde::Serialize;

use crate::dataset::{Dataset, Schema};
use crate::domain::Target;
use crate::error::{ParsegenError, Result};

/// Name the active template is registered under
const TEMPLATE_NAME: &str = "parser";

/// Built-in parser-authoring prompt
pub const DEFAULT_TEMPLATE: &str = include_str!("templates/parser.hbs");

/// Rows of the reference dataset shown to the model
pub const PREVIEW_ROWS: usize = 5;

/// Variables available to the template
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub target: String,
    pub document_kind: String,
    pub columns: Vec<String>,
    pub amount_columns: Vec<String>,
    pub preview: String,
    pub attempt: u32,
    pub max_attempts: u32,
    pub previous_attempt: Option<u32>,
    pub feedback: Option<String>,
}

impl PromptContext {
    /// Context for one attempt; `document_ext` is shown upper-cased (`pdf` → `PDF`)
    pub fn new(
        target: &Target,
        document_ext: &str,
        schema: &Schema,
        reference: &Dataset,
        attempt: u32,
        max_attempts: u32,
    ) -> Self {
        Self {
            target: target.to_string(),
            document_kind: document_ext.to_uppercase(),
            columns: schema.names().into_iter().map(String::from).collect(),
            amount_columns: schema.amount_columns().into_iter().map(String::from).collect(),
            preview: reference.preview(PREVIEW_ROWS),
            attempt,
            max_attempts,
            previous_attempt: None,
            feedback: None,
        }
    }

    /// Attach the previous attempt's diagnostic
    pub fn with_feedback(mut self, previous_attempt: u32, diagnostic: impl Into<String>) -> Self {
        self.previous_attempt = Some(previous_attempt);
        self.feedback = Some(diagnostic.into());
        self
    }
}

/// Renders the prompt template
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl PromptRenderer {
    /// Renderer using the built-in template
    pub fn new() -> Result<Self> {
        Self::with_template(DEFAULT_TEMPLATE)
    }

    /// Renderer using a caller-supplied template string
    pub fn with_template(template: &str) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // Code and table previews must reach the model verbatim
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| ParsegenError::Prompt(format!("Failed to register template: {}", e)))?;
        Ok(Self { handlebars })
    }

    /// Renderer using a template file
    pub fn from_path(path: &Path) -> Result<Self> {
        let template = std::fs::read_to_string(path).map_err(|e| {
            ParsegenError::Prompt(format!("Failed to load template from {}: {}", path.display(), e))
        })?;
        log::info!("Loaded prompt template from {}", path.display());
        Self::with_template(&template)
    }

    /// Render the prompt for one attempt
    pub fn render(&self, context: &PromptContext) -> Result<String> {
        self.handlebars
            .render(TEMPLATE_NAME, context)
            .map_err(|e| ParsegenError::Prompt(format!("Failed to render template: {}", e)))
    }
}
