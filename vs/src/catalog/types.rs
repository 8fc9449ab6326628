//! Catalog data types
//!
//! Themes and their vocabulary as they appear in the catalog JSON document.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A phonetic transcription paired with its native-script label
///
/// Accepts either a two-element array (`["chāo shì", "超市"]`) or an object
/// (`{"pinyin": "chāo shì", "hanzi": "超市"}`) when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocabularyEntry {
    pub phonetic: String,
    pub label: String,
}

impl VocabularyEntry {
    pub fn new(phonetic: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            phonetic: phonetic.into(),
            label: label.into(),
        }
    }

    /// Render as `"<phonetic> <label>"`
    pub fn display(&self) -> String {
        format!("{} {}", self.phonetic, self.label)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Pair(String, String),
    Object {
        #[serde(alias = "pinyin")]
        phonetic: String,
        #[serde(alias = "hanzi", alias = "word")]
        label: String,
    },
}

impl<'de> Deserialize<'de> for VocabularyEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entry = match RawEntry::deserialize(deserializer)? {
            RawEntry::Pair(phonetic, label) => Self { phonetic, label },
            RawEntry::Object { phonetic, label } => Self { phonetic, label },
        };
        Ok(entry)
    }
}

/// Vocabulary of a theme, partitioned into fixed categories
///
/// `animals` is a legacy alias some catalogs use in place of `items`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabularies {
    /// Roles and professions
    pub characters: Vec<VocabularyEntry>,
    /// Objects and tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<VocabularyEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animals: Option<Vec<VocabularyEntry>>,
    /// Fixed installations
    pub facilities: Vec<VocabularyEntry>,
    /// Backdrop and decor
    pub environment: Vec<VocabularyEntry>,
}

impl Vocabularies {
    /// Items, falling back to `animals` when the catalog has no `items` field
    pub fn items_or_animals(&self) -> &[VocabularyEntry] {
        debug!(has_items = self.items.is_some(), "Vocabularies::items_or_animals: called");
        match (&self.items, &self.animals) {
            (Some(items), _) => items,
            (None, Some(animals)) => {
                debug!("Vocabularies::items_or_animals: using animals alias");
                animals
            }
            (None, None) => &[],
        }
    }

    /// Facilities followed by environment entries
    pub fn scenery(&self) -> impl Iterator<Item = &VocabularyEntry> {
        self.facilities.iter().chain(self.environment.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
            && self.items_or_animals().is_empty()
            && self.facilities.is_empty()
            && self.environment.is_empty()
    }
}

/// A named scenario with candidate titles and vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Catalog key; filled in from the map key when loading
    #[serde(default, skip_serializing)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub vocabularies: Vocabularies,
}
