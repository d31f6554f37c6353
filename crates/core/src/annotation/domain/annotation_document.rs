use thiserror::Error;

use super::span::Span;
use super::tier::Tier;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DocumentError {
    #[error("tier already exists: {0}")]
    DuplicateTier(String),
    #[error("no such tier: {0}")]
    UnknownTier(String),
}

/// A tiered annotation document, independent of its file format.
///
/// Tier order is significant and preserved through every operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotationDocument {
    /// Creation timestamp as recorded by the file format, if any.
    pub date: Option<String>,
    tiers: Vec<Tier>,
}

impl AnnotationDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            tiers: Vec::new(),
        }
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(Tier::name).collect()
    }

    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name() == name)
    }

    pub fn spans(&self, tier: &str) -> Option<&[Span]> {
        self.tier(tier).map(Tier::spans)
    }

    pub fn span_count(&self) -> usize {
        self.tiers.iter().map(|t| t.spans().len()).sum()
    }

    /// Appends an empty tier.
    pub fn add_tier(&mut self, name: impl Into<String>) -> Result<(), DocumentError> {
        self.push_tier(Tier::new(name))
    }

    /// Appends a tier with its spans, as read from a file.
    pub fn push_tier(&mut self, tier: Tier) -> Result<(), DocumentError> {
        if self.tier(tier.name()).is_some() {
            return Err(DocumentError::DuplicateTier(tier.name().to_string()));
        }
        self.tiers.push(tier);
        Ok(())
    }

    pub fn remove_tier(&mut self, name: &str) -> Option<Tier> {
        let idx = self.tiers.iter().position(|t| t.name() == name)?;
        Some(self.tiers.remove(idx))
    }

    pub fn clear_tiers(&mut self) {
        self.tiers.clear();
    }

    pub fn add_span(&mut self, tier: &str, span: Span) -> Result<(), DocumentError> {
        let target = self
            .tiers
            .iter_mut()
            .find(|t| t.name() == tier)
            .ok_or_else(|| DocumentError::UnknownTier(tier.to_string()))?;
        target.push(span);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(names: &[&str]) -> AnnotationDocument {
        let mut doc = AnnotationDocument::new();
        for name in names {
            doc.add_tier(*name).unwrap();
        }
        doc
    }

    #[test]
    fn test_tier_order_is_insertion_order() {
        let doc = doc_with(&["C", "A", "B"]);
        assert_eq!(doc.tier_names(), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_duplicate_tier_rejected() {
        let mut doc = doc_with(&["spk1"]);
        assert_eq!(
            doc.add_tier("spk1"),
            Err(DocumentError::DuplicateTier("spk1".to_string()))
        );
        assert_eq!(doc.tiers().len(), 1);
    }

    #[test]
    fn test_remove_tier_keeps_order_of_others() {
        let mut doc = doc_with(&["default", "A", "B"]);
        let removed = doc.remove_tier("default").unwrap();
        assert_eq!(removed.name(), "default");
        assert_eq!(doc.tier_names(), vec!["A", "B"]);
        assert!(doc.remove_tier("missing").is_none());
    }

    #[test]
    fn test_add_span_appends_in_order() {
        let mut doc = doc_with(&["spk1", "spk2"]);
        doc.add_span("spk1", Span::new(0, 10, "a")).unwrap();
        doc.add_span("spk1", Span::new(5, 20, "b")).unwrap();
        doc.add_span("spk2", Span::new(0, 10, "c")).unwrap();

        let labels: Vec<_> = doc
            .spans("spk1")
            .unwrap()
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(doc.span_count(), 3);
    }

    #[test]
    fn test_add_span_to_unknown_tier_fails() {
        let mut doc = AnnotationDocument::new();
        let err = doc.add_span("ghost", Span::new(0, 1, "x")).unwrap_err();
        assert_eq!(err, DocumentError::UnknownTier("ghost".to_string()));
        assert_eq!(err.to_string(), "no such tier: ghost");
    }

    #[test]
    fn test_clear_tiers() {
        let mut doc = doc_with(&["default"]);
        doc.clear_tiers();
        assert!(doc.tiers().is_empty());
        assert!(doc.spans("default").is_none());
    }
}
