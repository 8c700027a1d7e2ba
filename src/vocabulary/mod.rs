//! Synonym vocabulary for donation categories
//!
//! This module provides:
//! - The on-disk vocabulary format (`[_meta]` + ordered `[[category]]` tables)
//! - `SynonymMap`, the validated, case-insensitive lookup table built from it
//! - A built-in default vocabulary embedded from `config-templates/synonyms.toml`

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Text of the vocabulary shipped with the crate
pub const BUILTIN_VOCABULARY: &str = include_str!("../../config-templates/synonyms.toml");

#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("Failed to read vocabulary file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse vocabulary: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Vocabulary defines no categories")]
    Empty,

    #[error("Category label cannot be empty (category #{index})")]
    EmptyLabel { index: usize },

    #[error("Duplicate category label: {label}")]
    DuplicateLabel { label: String },
}

/// Vocabulary file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyMeta {
    pub version: String,
}

/// One category as written in the vocabulary file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub label: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// Vocabulary file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    #[serde(rename = "_meta")]
    pub meta: VocabularyMeta,
    pub category: Vec<CategoryConfig>,
}

/// A canonical category and its synonyms
#[derive(Debug, Clone)]
pub struct Category {
    /// Canonical label, as declared
    pub label: String,
    /// Synonyms in declaration order, duplicates removed
    pub synonyms: Vec<String>,
    folded_label: String,
    folded_synonyms: HashSet<String>,
}

impl Category {
    /// Case-insensitive label equality
    pub fn label_matches(&self, text: &str) -> bool {
        self.folded_label == fold(text)
    }

    /// Case-insensitive synonym membership
    pub fn has_synonym(&self, text: &str) -> bool {
        self.folded_synonyms.contains(&fold(text))
    }

    pub(crate) fn folded_label(&self) -> &str {
        &self.folded_label
    }
}

/// Ordered mapping of canonical category label to synonym set
#[derive(Debug, Clone)]
pub struct SynonymMap {
    version: String,
    categories: Vec<Category>,
    by_label: HashMap<String, usize>,
}

impl SynonymMap {
    /// The vocabulary shipped with the crate
    pub fn builtin() -> Result<Self, VocabularyError> {
        Self::from_toml_str(BUILTIN_VOCABULARY)
    }

    /// Load a vocabulary from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, VocabularyError> {
        let content = std::fs::read_to_string(path).map_err(|e| VocabularyError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, VocabularyError> {
        let config: VocabularyConfig = toml::from_str(content)?;
        Self::from_config(config)
    }

    /// Build the lookup table from a parsed vocabulary
    pub fn from_config(config: VocabularyConfig) -> Result<Self, VocabularyError> {
        if config.category.is_empty() {
            return Err(VocabularyError::Empty);
        }

        let mut categories = Vec::with_capacity(config.category.len());
        let mut by_label = HashMap::new();

        for (index, category) in config.category.into_iter().enumerate() {
            let label = category.label.trim().to_string();
            if label.is_empty() {
                return Err(VocabularyError::EmptyLabel { index });
            }

            let folded_label = fold(&label);
            if by_label.insert(folded_label.clone(), index).is_some() {
                return Err(VocabularyError::DuplicateLabel { label });
            }

            let mut folded_synonyms = HashSet::new();
            let synonyms: Vec<String> = category
                .synonyms
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && folded_synonyms.insert(fold(s)))
                .collect();

            categories.push(Category {
                label,
                synonyms,
                folded_label,
                folded_synonyms,
            });
        }

        tracing::debug!(
            "Loaded vocabulary v{} with {} categories",
            config.meta.version,
            categories.len()
        );

        Ok(Self {
            version: config.meta.version,
            categories,
            by_label,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Categories in declaration order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Case-insensitive category lookup by label
    pub fn category(&self, label: &str) -> Option<&Category> {
        self.by_label
            .get(&fold(label))
            .map(|&idx| &self.categories[idx])
    }

    /// Synonyms registered under `label`, empty when the label is unknown
    pub fn synonyms_of(&self, label: &str) -> &[String] {
        self.category(label)
            .map(|c| c.synonyms.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `term` is a registered synonym of `label`
    pub fn is_synonym_of(&self, label: &str, term: &str) -> bool {
        self.category(label)
            .map(|c| c.has_synonym(term))
            .unwrap_or(false)
    }
}

/// Case folding used for every vocabulary comparison
pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let map = SynonymMap::builtin().unwrap();
        let labels: Vec<&str> = map.categories().iter().map(|c| c.label.as_str()).collect();

        assert_eq!(
            labels,
            vec![
                "Alimentos",
                "Roupas",
                "Kits de Higiene",
                "Água Potável",
                "Kits Infantis",
                "Medicamentos"
            ]
        );
        assert_eq!(map.version(), "1.0.0");
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let map = SynonymMap::builtin().unwrap();

        assert!(map.category("ÁGUA POTÁVEL").is_some());
        assert!(map.is_synonym_of("alimentos", "ARROZ"));
        assert!(!map.is_synonym_of("Roupas", "arroz"));
        assert!(map.synonyms_of("Desconhecido").is_empty());
    }

    #[test]
    fn test_duplicate_synonyms_collapse() {
        let content = r#"
            [_meta]
            version = "1"

            [[category]]
            label = "Roupas"
            synonyms = ["camiseta", "CAMISETA", "blusa", "camiseta"]
        "#;

        let map = SynonymMap::from_toml_str(content).unwrap();
        assert_eq!(map.synonyms_of("Roupas"), ["camiseta", "blusa"]);
        assert!(map.is_synonym_of("roupas", "Camiseta"));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let content = r#"
            [_meta]
            version = "1"

            [[category]]
            label = "Roupas"
            synonyms = []

            [[category]]
            label = "roupas"
            synonyms = ["camiseta"]
        "#;

        let err = SynonymMap::from_toml_str(content).unwrap_err();
        assert!(matches!(err, VocabularyError::DuplicateLabel { .. }));
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let config = VocabularyConfig {
            meta: VocabularyMeta {
                version: "1".to_string(),
            },
            category: vec![],
        };
        assert!(matches!(
            SynonymMap::from_config(config),
            Err(VocabularyError::Empty)
        ));
    }
}
