//! Prompt Engine
//!
//! Fills the scene template with a theme's vocabulary. Rendering never fails:
//! unknown themes get generic vocabulary and a broken template override falls
//! back to the embedded template.

use std::path::Path;
use std::sync::Arc;

use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::embedded;
use crate::catalog::{Catalog, Vocabularies, VocabularyEntry, generic_vocabularies};

/// Name of the scene template (`scene.pmt`)
pub const SCENE_TEMPLATE: &str = "scene";

/// Values substituted into the scene template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptContext {
    pub theme: String,
    pub title: String,
    pub characters: String,
    pub items: String,
    pub environment: String,
}

impl PromptContext {
    /// Build the substitution map for a theme, title and vocabulary
    pub fn new(theme: &str, title: &str, vocab: &Vocabularies) -> Self {
        debug!(%theme, %title, "PromptContext::new: called");
        Self {
            theme: theme.to_string(),
            title: title.to_string(),
            characters: join_entries(vocab.characters.iter()),
            items: join_entries(vocab.items_or_animals().iter()),
            environment: join_entries(vocab.scenery()),
        }
    }
}

fn join_entries<'a>(entries: impl Iterator<Item = &'a VocabularyEntry>) -> String {
    entries.map(VocabularyEntry::display).collect::<Vec<_>>().join(", ")
}

/// Renders image-generation prompts from the vocabulary catalog
pub struct PromptEngine {
    catalog: Arc<Catalog>,
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override of the scene template
    override_template: Option<String>,
}

impl PromptEngine {
    /// Create an engine, picking up `<prompts_dir>/scene.pmt` as an override if present
    pub fn new(catalog: Arc<Catalog>, prompts_dir: Option<&Path>) -> Self {
        debug!(?prompts_dir, "PromptEngine::new: called");
        let override_template = prompts_dir.and_then(|dir| {
            let path = dir.join(format!("{}.pmt", SCENE_TEMPLATE));
            read_override(&path)
        });

        Self {
            catalog,
            hbs: Self::handlebars(),
            override_template,
        }
    }

    /// Create an engine that only uses the embedded template
    pub fn embedded_only(catalog: Arc<Catalog>) -> Self {
        debug!("PromptEngine::embedded_only: called");
        Self {
            catalog,
            hbs: Self::handlebars(),
            override_template: None,
        }
    }

    fn handlebars() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text, never HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Build the substitution map for `theme`, using generic vocabulary when the
    /// catalog has no matching theme
    pub fn context(&self, theme: &str, title: &str) -> PromptContext {
        debug!(%theme, %title, "PromptEngine::context: called");
        match self.catalog.find_theme(theme) {
            Some(found) => {
                debug!(id = %found.id, "PromptEngine::context: theme resolved");
                PromptContext::new(theme, title, &found.vocabularies)
            }
            None => {
                info!("Theme '{}' not in catalog, using generic vocabulary", theme);
                PromptContext::new(theme, title, &generic_vocabularies())
            }
        }
    }

    /// Generate the image prompt for a theme and title
    pub fn generate_prompt(&self, theme: &str, title: &str) -> String {
        debug!(%theme, %title, "PromptEngine::generate_prompt: called");
        let context = self.context(theme, title);
        self.render(&context)
    }

    /// Render a context into the scene template
    pub fn render(&self, context: &PromptContext) -> String {
        debug!(has_override = self.override_template.is_some(), "PromptEngine::render: called");
        if let Some(ref template) = self.override_template {
            match self.hbs.render_template(template, context) {
                Ok(prompt) => return prompt,
                Err(e) => {
                    warn!(error = %e, "PromptEngine::render: override template failed, using embedded");
                }
            }
        }

        match self.hbs.render_template(embedded::SCENE, context) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "PromptEngine::render: embedded template failed, using plain prompt");
                plain_prompt(context)
            }
        }
    }
}

fn read_override(path: &Path) -> Option<String> {
    debug!(?path, "read_override: called");
    if !path.exists() {
        debug!("read_override: no override present");
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(content) => {
            info!("Using prompt template override {}", path.display());
            Some(content)
        }
        Err(e) => {
            warn!(?path, error = %e, "read_override: failed to read override");
            None
        }
    }
}

fn plain_prompt(context: &PromptContext) -> String {
    format!(
        "Children's vocabulary poster, theme {}, title \"{}\". Characters: {}. Items: {}. Environment: {}.",
        context.theme, context.title, context.characters, context.items, context.environment
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    fn engine() -> PromptEngine {
        PromptEngine::embedded_only(Arc::new(Catalog::builtin()))
    }

    #[test]
    fn test_known_theme_uses_catalog_vocabulary() {
        let prompt = engine().generate_prompt("超市", "走进超市");
        assert!(prompt.contains("\"走进超市\""));
        assert!(prompt.contains("shōu yín yuán 收银员, gù kè 顾客, lǐ huò yuán 理货员"));
        assert!(prompt.contains("gòu wù chē 购物车"));
        // facilities come before environment entries
        assert!(prompt.contains("huò jià 货架, shōu yín tái 收银台, bīng guì 冰柜, chū kǒu 出口, jià gé pái 价格牌"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_theme_fills_both_sites() {
        let prompt = engine().generate_prompt("超市", "走进超市");
        assert!(prompt.contains("illustrating the theme \"超市\""));
        assert!(prompt.contains("set in a 超市"));
    }

    #[test]
    fn test_animals_alias_feeds_items() {
        let prompt = engine().generate_prompt("动物园", "快乐动物园");
        assert!(prompt.contains("xióng māo 熊猫, hóu zi 猴子"));
    }

    #[test]
    fn test_substring_theme_resolves() {
        let context = engine().context("去医院", "看牙医");
        assert!(context.characters.contains("医生"));
        // the user's wording is kept in the prompt
        assert_eq!(context.theme, "去医院");
    }

    #[test]
    fn test_unknown_theme_uses_generic_vocabulary() {
        let prompt = engine().generate_prompt("太空站", "飞向太空");
        assert!(prompt.contains("xiǎo péng yǒu 小朋友"));
        assert!(prompt.contains("lán tiān 蓝天"));
        assert!(prompt.contains("飞向太空"));
    }

    #[test]
    fn test_empty_categories_render_empty() {
        let context = PromptContext::new("空", "空空", &Vocabularies::default());
        assert_eq!(context.characters, "");
        assert_eq!(context.items, "");
        assert_eq!(context.environment, "");
    }

    #[test]
    fn test_title_is_not_html_escaped() {
        let prompt = engine().generate_prompt("超市", "<Tom & Jerry's>");
        assert!(prompt.contains("<Tom & Jerry's>"));
    }

    #[test]
    fn test_override_template() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("scene.pmt")).unwrap();
        write!(file, "{{{{theme}}}}|{{{{title}}}}|{{{{items}}}}").unwrap();

        let engine = PromptEngine::new(Arc::new(Catalog::builtin()), Some(dir.path()));
        let prompt = engine.generate_prompt("医院", "看病");
        assert_eq!(prompt, "医院|看病|tīng zhěn qì 听诊器, tǐ wēn jì 体温计, yào 药");
    }

    #[test]
    fn test_broken_override_falls_back_to_embedded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scene.pmt"), "{{#if theme}} unclosed").unwrap();

        let engine = PromptEngine::new(Arc::new(Catalog::builtin()), Some(dir.path()));
        let prompt = engine.generate_prompt("医院", "看病");
        assert!(prompt.contains("TITLE"));
        assert!(prompt.contains("看病"));
    }

    #[test]
    fn test_missing_override_dir() {
        let engine = PromptEngine::new(Arc::new(Catalog::builtin()), Some(Path::new("/nonexistent/prompts")));
        assert!(engine.generate_prompt("超市", "走进超市").contains("走进超市"));
    }

    proptest! {
        #[test]
        fn prop_prompt_contains_title(theme in "\\PC{0,12}", title in "\\PC{0,24}") {
            let prompt = engine().generate_prompt(&theme, &title);
            let quoted = format!("\"{}\"", title);
            prop_assert!(!prompt.is_empty());
            prop_assert!(prompt.contains(&quoted));
        }
    }
}
