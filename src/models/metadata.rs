//! Corpus-level metadata: what the store can answer and how big the
//! document/concept universe is.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::DocumentPart;

/// One row of the node metadata table: a CURIE prefix the corpus contains
/// under a given biolink category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMetadata {
    pub id_prefix: String,
    pub category: String,
}

/// One row of the edge metadata table: a (subject category, object category,
/// predicate) triple the corpus can produce edges for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMetadata {
    pub subject: String,
    pub object: String,
    pub predicate: String,
}

/// Universe sizes the metric formulas divide by. Refreshed from the store on
/// startup and on demand, shared read-only across requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniverseCounts {
    /// Distinct concepts in the whole corpus.
    pub total_concepts: i64,
    /// Distinct concepts observed per part. A part missing from either map
    /// counts as zero.
    pub concept_counts: HashMap<DocumentPart, i64>,
    /// Documents per part.
    pub document_counts: HashMap<DocumentPart, i64>,
}

impl UniverseCounts {
    pub fn concept_count(&self, part: DocumentPart) -> i64 {
        self.concept_counts.get(&part).copied().unwrap_or(0)
    }

    pub fn document_count(&self, part: DocumentPart) -> i64 {
        self.document_counts.get(&part).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total_concepts == 0 && self.document_counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_part_counts_as_zero() {
        let mut counts = UniverseCounts::default();
        counts.total_concepts = 12;
        counts.concept_counts.insert(DocumentPart::Abstract, 12);
        counts.document_counts.insert(DocumentPart::Abstract, 400);
        assert_eq!(counts.document_count(DocumentPart::Abstract), 400);
        assert_eq!(counts.document_count(DocumentPart::Sentence), 0);
        assert_eq!(counts.concept_count(DocumentPart::Title), 0);
    }
}
