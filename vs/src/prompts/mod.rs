//! Prompt Template System
//!
//! Renders the `.pmt` scene template with theme vocabulary.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/scene.pmt` (user override)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod engine;

pub use engine::{PromptContext, PromptEngine, SCENE_TEMPLATE};
