//! Entity types and result merging.

use serde::{Deserialize, Serialize};

/// Kind of extracted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    Organization,
    Location,
    Date,
    Time,
    Money,
    Percentage,
    Email,
    Phone,
    Url,
    PostalCode,
    Ssn,
    CreditCard,
    Iban,
    InvoiceNumber,
    Misc,
}

impl EntityKind {
    /// Map a model label (e.g. "B-PER", "ORG") to a kind.
    pub fn from_model_label(label: &str) -> Self {
        let label = label
            .trim_start_matches("B-")
            .trim_start_matches("I-")
            .to_ascii_uppercase();
        match label.as_str() {
            "PER" | "PERSON" => EntityKind::Person,
            "ORG" | "ORGANIZATION" => EntityKind::Organization,
            "LOC" | "LOCATION" | "GPE" => EntityKind::Location,
            "DATE" => EntityKind::Date,
            "TIME" => EntityKind::Time,
            "MONEY" => EntityKind::Money,
            "PERCENT" | "PERCENTAGE" => EntityKind::Percentage,
            _ => EntityKind::Misc,
        }
    }
}

/// Where an entity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitySource {
    /// Transformer NER model
    Model,
    /// Regex fallback pattern
    Pattern,
}

/// An extracted entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Entity kind
    pub kind: EntityKind,
    /// Matched text
    pub text: String,
    /// Byte span (start, end) in the source text; slices it directly
    pub start: usize,
    pub end: usize,
    /// Confidence score in [0, 1]
    pub score: f64,
    /// Which extractor produced the entity
    pub source: EntitySource,
}

impl Entity {
    pub fn new(
        kind: EntityKind,
        text: impl Into<String>,
        start: usize,
        end: usize,
        score: f64,
        source: EntitySource,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            start,
            end,
            score,
            source,
        }
    }

    fn overlaps(&self, other: &Entity) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn normalized_text(&self) -> String {
        self.text.trim().to_lowercase()
    }
}

/// Merge model and pattern results, deduplicating.
///
/// Two entities are duplicates when they share a kind and either overlap
/// in span or have the same normalized text. The higher-scored entity
/// wins. Output is sorted by span start, then end.
pub fn merge_entities(mut entities: Vec<Entity>) -> Vec<Entity> {
    // Higher score first so kept entities beat their duplicates
    entities.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Entity> = Vec::with_capacity(entities.len());
    for candidate in entities {
        let duplicate = kept.iter().any(|existing| {
            existing.kind == candidate.kind
                && (existing.overlaps(&candidate)
                    || existing.normalized_text() == candidate.normalized_text())
        });
        if !duplicate {
            kept.push(candidate);
        }
    }

    kept.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
    kept
}
