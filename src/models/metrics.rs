//! Association-strength statistics derived from occurrence counts.

use serde_json::json;

use crate::models::DocumentPart;
use crate::trapi::{Attribute, INFORES_COOCCURRENCE};

/// Probability offset guarding against ln(0) in the NPMI denominators.
const NPMI_OFFSET: f64 = 1e-9;

/// Largest number of supporting document ids carried per part.
const MAX_DOCUMENT_SAMPLE: usize = 100;

/// Derived co-occurrence statistics for one concept pair at one document part.
///
/// All scores are computed eagerly at construction with natural logarithms.
/// Undefined results (NaN, ±∞) are preserved, not suppressed - callers decide
/// whether the pair surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    single_count1: i64,
    single_count2: i64,
    pair_count: i64,
    concept_count: i64,
    document_count: i64,
    part: DocumentPart,

    normalized_google_distance: f64,
    pointwise_mutual_information: f64,
    normalized_pointwise_mutual_information: f64,
    normalized_pointwise_mutual_information_max: f64,
    mutual_dependence: f64,
    log_frequency_biased_mutual_dependence: f64,

    /// Bounded sample of supporting document ids.
    document_ids: Vec<String>,
}

impl Metrics {
    pub fn new(
        single_count1: i64,
        single_count2: i64,
        pair_count: i64,
        concept_count: i64,
        document_count: i64,
        part: DocumentPart,
    ) -> Self {
        let ngd = normalized_google_distance(single_count1, single_count2, pair_count, concept_count);
        let pmi = pointwise_mutual_information(single_count1, single_count2, pair_count, document_count);
        let pxy = pair_count as f64 / document_count as f64;
        let p1 = single_count1 as f64 / document_count as f64;
        let p2 = single_count2 as f64 / document_count as f64;
        let npmi = if pmi == f64::NEG_INFINITY {
            -1.0
        } else {
            pmi / -((pxy + NPMI_OFFSET).ln())
        };
        let npmi_max = pmi / -((p1.max(p2) + NPMI_OFFSET).ln());
        let md = (pxy.powi(2) / (p1 * p2)).ln();
        let lfbmd = md + pxy.ln();

        Self {
            single_count1,
            single_count2,
            pair_count,
            concept_count,
            document_count,
            part,
            normalized_google_distance: ngd,
            pointwise_mutual_information: pmi,
            normalized_pointwise_mutual_information: npmi,
            normalized_pointwise_mutual_information_max: npmi_max,
            mutual_dependence: md,
            log_frequency_biased_mutual_dependence: lfbmd,
            document_ids: Vec::new(),
        }
    }

    /// Attaches a bounded sample of supporting document ids.
    pub fn with_documents<I: IntoIterator<Item = String>>(mut self, documents: I) -> Self {
        self.document_ids = documents.into_iter().take(MAX_DOCUMENT_SAMPLE).collect();
        self
    }

    pub fn single_count1(&self) -> i64 {
        self.single_count1
    }

    pub fn single_count2(&self) -> i64 {
        self.single_count2
    }

    pub fn pair_count(&self) -> i64 {
        self.pair_count
    }

    pub fn part(&self) -> DocumentPart {
        self.part
    }

    pub fn normalized_google_distance(&self) -> f64 {
        self.normalized_google_distance
    }

    pub fn pointwise_mutual_information(&self) -> f64 {
        self.pointwise_mutual_information
    }

    pub fn normalized_pointwise_mutual_information(&self) -> f64 {
        self.normalized_pointwise_mutual_information
    }

    pub fn normalized_pointwise_mutual_information_max(&self) -> f64 {
        self.normalized_pointwise_mutual_information_max
    }

    pub fn mutual_dependence(&self) -> f64 {
        self.mutual_dependence
    }

    pub fn log_frequency_biased_mutual_dependence(&self) -> f64 {
        self.log_frequency_biased_mutual_dependence
    }

    pub fn document_ids(&self) -> &[String] {
        &self.document_ids
    }

    /// True if any derived score is finite.
    pub fn has_finite_score(&self) -> bool {
        [
            self.normalized_google_distance,
            self.pointwise_mutual_information,
            self.normalized_pointwise_mutual_information,
            self.normalized_pointwise_mutual_information_max,
            self.mutual_dependence,
            self.log_frequency_biased_mutual_dependence,
        ]
        .iter()
        .any(|score| score.is_finite())
    }

    /// TRAPI attribute list carrying the counts and scores for this part.
    pub fn to_attributes(&self) -> Vec<Attribute> {
        let part = self.part.as_str();
        let mut attributes = vec![
            Attribute::new("biolink:tmkp_concept1_count", json!(self.single_count1))
                .value_type_id("SIO:000794")
                .description(format!(
                    "The number of times concept #1 was observed to occur at the {part} level in the documents that were processed"
                ))
                .attribute_source(INFORES_COOCCURRENCE),
            Attribute::new("biolink:tmkp_concept2_count", json!(self.single_count2))
                .value_type_id("SIO:000794")
                .description(format!(
                    "The number of times concept #2 was observed to occur at the {part} level in the documents that were processed"
                ))
                .attribute_source(INFORES_COOCCURRENCE),
            Attribute::new("biolink:tmkp_concept_pair_count", json!(self.pair_count))
                .value_type_id("SIO:000794")
                .description(format!(
                    "The number of times the concepts of this assertion were observed to cooccur at the {part} level in the documents that were processed"
                ))
                .attribute_source(INFORES_COOCCURRENCE),
            Attribute::new(
                "biolink:tmkp_normalized_google_distance",
                json!(self.normalized_google_distance),
            )
            .value_type_id("SIO:000794")
            .description(
                "The normalized google distance score for the concepts in this assertion based on their cooccurrence in the documents that were processed",
            )
            .attribute_source(INFORES_COOCCURRENCE),
            Attribute::new(
                "biolink:tmkp_pointwise_mutual_information",
                json!(self.pointwise_mutual_information),
            )
            .value_type_id("SIO:000794")
            .description(
                "The pointwise mutual information score for the concepts in this assertion based on their cooccurrence in the documents that were processed",
            )
            .attribute_source(INFORES_COOCCURRENCE),
            Attribute::new(
                "biolink:tmkp_normalized_pointwise_mutual_information",
                json!(self.normalized_pointwise_mutual_information),
            )
            .value_type_id("SIO:000794")
            .description(
                "The normalized pointwise mutual information score for the concepts in this assertion based on their cooccurrence in the documents that were processed",
            )
            .attribute_source(INFORES_COOCCURRENCE),
            Attribute::new(
                "biolink:tmkp_normalized_pointwise_mutual_information_max_denominator",
                json!(self.normalized_pointwise_mutual_information_max),
            )
            .value_type_id("SIO:000794")
            .description(
                "The normalized pointwise mutual information score, normalized by the larger single-concept probability",
            )
            .attribute_source(INFORES_COOCCURRENCE),
            Attribute::new("biolink:tmkp_mutual_dependence", json!(self.mutual_dependence))
                .value_type_id("SIO:000794")
                .description(
                    "The mutual dependence (PMI^2) score for the concepts in this assertion based on their cooccurrence in the documents that were processed",
                )
                .attribute_source(INFORES_COOCCURRENCE),
            Attribute::new(
                "biolink:tmkp_log_frequency_biased_mutual_dependence",
                json!(self.log_frequency_biased_mutual_dependence),
            )
            .value_type_id("SIO:000794")
            .description(
                "The log-frequency-biased mutual dependence score for the concepts in this assertion based on their cooccurrence in the documents that were processed",
            )
            .attribute_source(INFORES_COOCCURRENCE),
        ];
        if !self.document_ids.is_empty() {
            attributes.push(
                Attribute::new("biolink:supporting_document", json!(self.document_ids))
                    .value_type_id("IAO:0000311")
                    .attribute_source(INFORES_COOCCURRENCE),
            );
        }
        attributes
    }
}

fn normalized_google_distance(
    single_count1: i64,
    single_count2: i64,
    pair_count: i64,
    concept_count: i64,
) -> f64 {
    // With both singles observed but no joint document, the distance is
    // maximal rather than a naive ln(0) artifact.
    if pair_count == 0 && single_count1 > 0 && single_count2 > 0 {
        return f64::INFINITY;
    }
    let log_f1 = (single_count1 as f64).ln();
    let log_f2 = (single_count2 as f64).ln();
    let log_fxy = (pair_count as f64).ln();
    let log_n = (concept_count as f64).ln();
    (log_f1.max(log_f2) - log_fxy) / (log_n - log_f1.min(log_f2))
}

fn pointwise_mutual_information(
    single_count1: i64,
    single_count2: i64,
    pair_count: i64,
    document_count: i64,
) -> f64 {
    let pxy = pair_count as f64 / document_count as f64;
    let px = single_count1 as f64 / document_count as f64;
    let py = single_count2 as f64 / document_count as f64;
    (pxy / (px * py)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_symmetric_in_single_counts() {
        let a = Metrics::new(12, 40, 7, 500, 1000, DocumentPart::Abstract);
        let b = Metrics::new(40, 12, 7, 500, 1000, DocumentPart::Abstract);
        assert_relative_eq!(
            a.normalized_google_distance(),
            b.normalized_google_distance()
        );
        assert_relative_eq!(
            a.pointwise_mutual_information(),
            b.pointwise_mutual_information()
        );
        assert_relative_eq!(a.mutual_dependence(), b.mutual_dependence());
        assert_relative_eq!(
            a.log_frequency_biased_mutual_dependence(),
            b.log_frequency_biased_mutual_dependence()
        );
    }

    #[test]
    fn test_zero_pair_count_boundary() {
        let metrics = Metrics::new(10, 10, 0, 500, 100, DocumentPart::Sentence);
        assert_eq!(metrics.normalized_google_distance(), f64::INFINITY);
        assert_eq!(metrics.pointwise_mutual_information(), f64::NEG_INFINITY);
        assert_eq!(metrics.normalized_pointwise_mutual_information(), -1.0);
    }

    #[test]
    fn test_known_values() {
        // f1=50, f2=20, fxy=10, N=1000 documents
        let metrics = Metrics::new(50, 20, 10, 2000, 1000, DocumentPart::Article);
        let pxy: f64 = 10.0 / 1000.0;
        let p1: f64 = 50.0 / 1000.0;
        let p2: f64 = 20.0 / 1000.0;
        assert_relative_eq!(
            metrics.pointwise_mutual_information(),
            (pxy / (p1 * p2)).ln()
        );
        assert_relative_eq!(metrics.mutual_dependence(), (pxy * pxy / (p1 * p2)).ln());
        assert_relative_eq!(
            metrics.log_frequency_biased_mutual_dependence(),
            metrics.mutual_dependence() + pxy.ln()
        );
        let expected_ngd = ((50f64.ln()).max(20f64.ln()) - 10f64.ln())
            / (2000f64.ln() - (50f64.ln()).min(20f64.ln()));
        assert_relative_eq!(metrics.normalized_google_distance(), expected_ngd);
    }

    #[test]
    fn test_document_sample_is_bounded() {
        let documents = (0..500).map(|i| format!("PMID:{i}"));
        let metrics =
            Metrics::new(5, 5, 5, 100, 100, DocumentPart::Title).with_documents(documents);
        assert_eq!(metrics.document_ids().len(), 100);
    }

    #[test]
    fn test_zero_single_count_is_nan_not_error() {
        let metrics = Metrics::new(0, 10, 0, 500, 100, DocumentPart::Abstract);
        assert!(metrics.normalized_google_distance().is_nan());
        assert!(!metrics.has_finite_score());
    }
}
