//! Theme lookup over a loaded catalog

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::builtin;
use super::types::Theme;

/// Immutable, insertion-ordered set of themes
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    themes: Vec<Theme>,
}

impl Catalog {
    pub fn new(themes: Vec<Theme>) -> Self {
        debug!(theme_count = themes.len(), "Catalog::new: called");
        Self { themes }
    }

    /// The hard-coded catalog used when loading fails
    pub fn builtin() -> Self {
        debug!("Catalog::builtin: called");
        Self::new(builtin::default_themes())
    }

    /// Parse a catalog document: `{ "<id>": { name, titles, vocabularies }, ... }`
    ///
    /// Key order of the document is kept. Entries that fail to parse are skipped
    /// with a warning so one bad theme does not discard the whole catalog.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        debug!(content_len = content.len(), "Catalog::from_json: called");
        let map: Map<String, Value> = serde_json::from_str(content)?;

        let mut themes = Vec::with_capacity(map.len());
        for (id, value) in map {
            match serde_json::from_value::<Theme>(value) {
                Ok(mut theme) => {
                    theme.id = id;
                    themes.push(theme);
                }
                Err(e) => {
                    warn!(%id, error = %e, "Catalog::from_json: skipping malformed theme");
                }
            }
        }

        Ok(Self::new(themes))
    }

    pub fn themes(&self) -> impl Iterator<Item = &Theme> {
        self.themes.iter()
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Look up a theme by catalog id
    pub fn get(&self, id: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.id == id)
    }

    /// Resolve a user-supplied theme name
    ///
    /// Exact display-name match wins. Otherwise the first theme (in catalog order)
    /// whose name contains the query, or is contained by it, is returned.
    /// Matching is case-sensitive.
    pub fn find_theme(&self, name: &str) -> Option<&Theme> {
        debug!(%name, "Catalog::find_theme: called");
        if let Some(theme) = self.themes.iter().find(|t| t.name == name) {
            debug!(id = %theme.id, "Catalog::find_theme: exact match");
            return Some(theme);
        }

        let fuzzy = self
            .themes
            .iter()
            .find(|t| t.name.contains(name) || name.contains(t.name.as_str()));
        match fuzzy {
            Some(theme) => debug!(id = %theme.id, "Catalog::find_theme: substring match"),
            None => debug!("Catalog::find_theme: no match"),
        }
        fuzzy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "park": {"name": "公园游乐场", "titles": ["公园里"], "vocabularies": {}},
        "market": {"name": "超市", "titles": ["走进超市"], "vocabularies": {}},
        "night_market": {"name": "夜市超市", "titles": [], "vocabularies": {}},
        "garden": {"name": "园", "vocabularies": {}}
    }"#;

    fn catalog() -> Catalog {
        Catalog::from_json(DOC).unwrap()
    }

    #[test]
    fn test_from_json_keeps_document_order() {
        let ids: Vec<_> = catalog().themes().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["park", "market", "night_market", "garden"]);
    }

    #[test]
    fn test_exact_match_beats_earlier_substring_match() {
        let catalog = catalog();
        // "夜市超市" contains "超市" but the exact match must win
        assert_eq!(catalog.find_theme("超市").unwrap().id, "market");
    }

    #[test]
    fn test_substring_match_query_inside_name() {
        assert_eq!(catalog().find_theme("夜市").unwrap().id, "night_market");
    }

    #[test]
    fn test_substring_match_name_inside_query() {
        assert_eq!(catalog().find_theme("我想去超市买东西").unwrap().id, "market");
    }

    #[test]
    fn test_short_name_first_match_policy() {
        // Both "公园游乐场" and "园" overlap "公园"; the earlier theme wins
        assert_eq!(catalog().find_theme("公园").unwrap().id, "park");
        assert_eq!(catalog().find_theme("花园").unwrap().id, "garden");
    }

    #[test]
    fn test_no_match() {
        assert!(catalog().find_theme("太空站").is_none());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let catalog = Catalog::from_json(r#"{"farm": {"name": "Farm"}}"#).unwrap();
        assert!(catalog.find_theme("farm").is_none());
        assert!(catalog.find_theme("Farmyard").is_some());
    }

    #[test]
    fn test_malformed_theme_skipped() {
        let catalog = Catalog::from_json(r#"{"bad": {"titles": []}, "ok": {"name": "好"}}"#).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("ok").is_some());
        assert!(catalog.get("bad").is_none());
    }

    #[test]
    fn test_builtin_catalog_resolves_known_names() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.find_theme("超市").unwrap().id, "supermarket");
        assert_eq!(catalog.find_theme("动物园").unwrap().id, "zoo");
    }
}
