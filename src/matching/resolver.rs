//! Need canonicalization against the synonym vocabulary

use crate::vocabulary::{fold, SynonymMap};

/// How a need was mapped to its canonical form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Equal to a label, ignoring case
    Label,
    /// A registered synonym of the label
    Synonym,
    /// Label and need contain one another
    Partial,
    /// No category matched; the need is used as-is
    Unresolved,
}

/// Maps a free-text need onto a canonical category label
#[derive(Debug, Clone, Copy)]
pub struct SynonymResolver<'a> {
    vocabulary: &'a SynonymMap,
}

impl<'a> SynonymResolver<'a> {
    pub fn new(vocabulary: &'a SynonymMap) -> Self {
        Self { vocabulary }
    }

    /// Canonical label for `need`, or `need` unchanged when nothing matches
    pub fn resolve(&self, need: &str) -> String {
        self.resolve_with(need).0
    }

    /// Like [`resolve`](Self::resolve), also reporting which rule matched.
    ///
    /// Categories are tried in declaration order and every rule is checked
    /// for a category before moving on to the next one.
    pub fn resolve_with(&self, need: &str) -> (String, Resolution) {
        let folded = fold(need);

        for category in self.vocabulary.categories() {
            if category.label_matches(need) {
                return (category.label.clone(), Resolution::Label);
            }
            if category.has_synonym(need) {
                return (category.label.clone(), Resolution::Synonym);
            }
            let label = category.folded_label();
            if label.contains(folded.as_str()) || folded.contains(label) {
                return (category.label.clone(), Resolution::Partial);
            }
        }

        (need.to_string(), Resolution::Unresolved)
    }
}
