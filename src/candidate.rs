//! Collection-point candidates as supplied by the repository

use serde::{Deserialize, Serialize};

/// An active donation collection point eligible for matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Repository identifier
    pub id: i64,

    /// Category, usually one of the canonical labels but may be free text
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub description: String,

    pub city: String,

    #[serde(default)]
    pub district: String,

    #[serde(default)]
    pub street: String,

    /// Comma-separated free-text stock items
    #[serde(default)]
    pub stock: String,

    #[serde(default)]
    pub image_refs: Vec<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Candidate {
    /// Minimal candidate, remaining fields empty
    pub fn new(
        id: i64,
        kind: impl Into<String>,
        city: impl Into<String>,
        stock: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind: kind.into(),
            description: String::new(),
            city: city.into(),
            district: String::new(),
            street: String::new(),
            stock: stock.into(),
            image_refs: Vec::new(),
            active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_address(mut self, district: impl Into<String>, street: impl Into<String>) -> Self {
        self.district = district.into();
        self.street = street.into();
        self
    }

    /// Trimmed, non-empty stock tokens in declaration order
    pub fn stock_items(&self) -> impl Iterator<Item = &str> {
        self.stock
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
    }

    /// Case-insensitive city equality
    pub fn in_city(&self, city: &str) -> bool {
        self.city.to_lowercase() == city.to_lowercase()
    }

    /// Case-insensitive category equality
    pub fn has_kind(&self, kind: &str) -> bool {
        self.kind.to_lowercase() == kind.to_lowercase()
    }
}
