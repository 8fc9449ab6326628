//! Vocabulary Catalog
//!
//! Maps theme names to their candidate titles and categorized vocabulary.
//! Loaded once at startup and immutable afterwards.

mod builtin;
mod loader;
mod lookup;
mod types;

pub use builtin::generic_vocabularies;
pub use loader::load_catalog;
pub use lookup::Catalog;
pub use types::{Theme, Vocabularies, VocabularyEntry};
