//! Prompt System - prompt rendering and response handling
//!
//! Renders the parser-authoring prompt with Handlebars and extracts candidate
//! code from the model's reply.

mod extract;
mod render;

pub use extract::extract_code;
pub use render::{DEFAULT_TEMPLATE, PREVIEW_ROWS, PromptContext, PromptRenderer};
