//! Document granularities at which co-occurrence is measured.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The granularity at which a co-occurrence was observed.
///
/// Counts are kept per part; an "article" co-occurrence means the two
/// concepts appear anywhere in the same article, "sentence" means the
/// same sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentPart {
    Abstract,
    Title,
    Sentence,
    Article,
}

impl DocumentPart {
    /// Every part, in the order counts are reported.
    pub const ALL: [DocumentPart; 4] = [
        DocumentPart::Abstract,
        DocumentPart::Title,
        DocumentPart::Sentence,
        DocumentPart::Article,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentPart::Abstract => "abstract",
            DocumentPart::Title => "title",
            DocumentPart::Sentence => "sentence",
            DocumentPart::Article => "article",
        }
    }

    /// Store table holding raw pair/document rows for this part.
    pub fn pair_table(&self) -> &'static str {
        match self {
            DocumentPart::Abstract => "concept_pairs_abstract",
            DocumentPart::Title => "concept_pairs_title",
            DocumentPart::Sentence => "concept_pairs_sentence",
            DocumentPart::Article => "concept_pairs_article",
        }
    }
}

impl fmt::Display for DocumentPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentPart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abstract" => Ok(DocumentPart::Abstract),
            "title" => Ok(DocumentPart::Title),
            "sentence" => Ok(DocumentPart::Sentence),
            "article" => Ok(DocumentPart::Article),
            other => Err(format!("unknown document part: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for part in DocumentPart::ALL {
            assert_eq!(part.as_str().parse::<DocumentPart>(), Ok(part));
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&DocumentPart::Abstract).unwrap();
        assert_eq!(json, "\"abstract\"");
        let parsed: DocumentPart = serde_json::from_str("\"sentence\"").unwrap();
        assert_eq!(parsed, DocumentPart::Sentence);
    }
}
