//! Regex fallback patterns for entity extraction.

use crate::entities::{Entity, EntityKind, EntitySource};
use once_cell::sync::Lazy;
use regex::Regex;

struct PatternDef {
    kind: EntityKind,
    regex: Regex,
    score: f64,
}

fn pattern(kind: EntityKind, pattern: &str, score: f64) -> PatternDef {
    PatternDef {
        kind,
        regex: Regex::new(pattern).expect("pattern table regex must compile"),
        score,
    }
}

static PATTERNS: Lazy<Vec<PatternDef>> = Lazy::new(|| {
    vec![
        pattern(
            EntityKind::Email,
            r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
            0.95,
        ),
        pattern(
            EntityKind::Url,
            r"https?://[^\s<>\)\]]+",
            0.95,
        ),
        pattern(
            EntityKind::Phone,
            r"\+?\d{1,3}[-. (]*\d{3}[-. )]*\d{3}[-. ]*\d{4}\b",
            0.8,
        ),
        // ISO and US-style dates
        pattern(EntityKind::Date, r"\b\d{4}-\d{2}-\d{2}\b", 0.9),
        pattern(EntityKind::Date, r"\b\d{1,2}/\d{1,2}/\d{2,4}\b", 0.7),
        pattern(
            EntityKind::Date,
            r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}\b",
            0.85,
        ),
        pattern(EntityKind::Time, r"\b\d{1,2}:\d{2}(?::\d{2})?\s*(?:[AaPp][Mm])?\b", 0.7),
        pattern(
            EntityKind::Money,
            r"[$€£]\s?\d{1,3}(?:[,.]\d{3})*(?:\.\d{2})?|\b\d+(?:\.\d{2})?\s?(?:USD|EUR|GBP)\b",
            0.85,
        ),
        pattern(EntityKind::Percentage, r"\b\d{1,3}(?:\.\d+)?\s?%", 0.85),
        pattern(EntityKind::Ssn, r"\b\d{3}-\d{2}-\d{4}\b", 0.9),
        pattern(
            EntityKind::CreditCard,
            r"\b\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}\b",
            0.75,
        ),
        pattern(
            EntityKind::Iban,
            r"\b[A-Z]{2}\d{2}[A-Z0-9]{11,30}\b",
            0.8,
        ),
        pattern(EntityKind::PostalCode, r"\b\d{5}(?:-\d{4})?\b", 0.4),
        pattern(
            EntityKind::InvoiceNumber,
            r"(?i)\b(?:inv|invoice)\s*[-#]?\s*\d{3,10}\b",
            0.85,
        ),
        pattern(
            EntityKind::Organization,
            r"\b[A-Z][A-Za-z&]+(?:\s+[A-Z][A-Za-z&]+)*\s+(?:Inc|LLC|Ltd|Corp|GmbH|AG)\.?\b",
            0.6,
        ),
    ]
});

/// Run every fallback pattern over the text.
///
/// Matches come back unmerged; callers combine them with model output via
/// [`crate::entities::merge_entities`].
pub fn extract_with_patterns(text: &str) -> Vec<Entity> {
    let mut entities = Vec::new();
    for def in PATTERNS.iter() {
        for m in def.regex.find_iter(text) {
            entities.push(Entity::new(
                def.kind,
                m.as_str(),
                m.start(),
                m.end(),
                def.score,
                EntitySource::Pattern,
            ));
        }
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_in(text: &str) -> Vec<EntityKind> {
        extract_with_patterns(text).into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_email_and_url() {
        let entities = extract_with_patterns("Contact ops@example.com or see https://example.com/docs.");
        assert!(entities.iter().any(|e| e.kind == EntityKind::Email && e.text == "ops@example.com"));
        assert!(entities.iter().any(|e| e.kind == EntityKind::Url));
    }

    #[test]
    fn test_dates() {
        assert!(kinds_in("Due 2024-03-15.").contains(&EntityKind::Date));
        assert!(kinds_in("Due 3/15/2024.").contains(&EntityKind::Date));
        assert!(kinds_in("Due March 15, 2024.").contains(&EntityKind::Date));
    }

    #[test]
    fn test_money_and_percentage() {
        let entities = extract_with_patterns("Total $1,234.56 at a 7.5% rate or 300 EUR flat.");
        assert!(entities.iter().any(|e| e.kind == EntityKind::Money && e.text.contains("1,234.56")));
        assert!(entities.iter().any(|e| e.kind == EntityKind::Money && e.text.contains("EUR")));
        assert!(entities.iter().any(|e| e.kind == EntityKind::Percentage));
    }

    #[test]
    fn test_identifiers() {
        assert!(kinds_in("SSN 123-45-6789").contains(&EntityKind::Ssn));
        assert!(kinds_in("Card 4111 1111 1111 1111").contains(&EntityKind::CreditCard));
        assert!(kinds_in("IBAN DE89370400440532013000").contains(&EntityKind::Iban));
        assert!(kinds_in("See invoice #12345 attached").contains(&EntityKind::InvoiceNumber));
    }

    #[test]
    fn test_organization_suffix() {
        let entities = extract_with_patterns("Billed to Acme Widgets Inc. today.");
        assert!(entities
            .iter()
            .any(|e| e.kind == EntityKind::Organization && e.text.starts_with("Acme")));
    }

    #[test]
    fn test_spans_match_source() {
        let text = "mail me at a@b.co please";
        let entities = extract_with_patterns(text);
        let email = entities.iter().find(|e| e.kind == EntityKind::Email).unwrap();
        assert_eq!(&text[email.start..email.end], email.text);
    }

    #[test]
    fn test_no_matches_in_plain_prose() {
        let entities = extract_with_patterns("the quick brown fox jumps over the lazy dog");
        assert!(entities.is_empty());
    }
}
