//! A subject/object concept pair with per-document-part metrics, plus the
//! attribute-constraint filter applied to it.

use std::collections::HashMap;

use regex::Regex;
use serde_json::{json, Value};

use crate::trapi::{Attribute, AttributeConstraint, INFORES_COOCCURRENCE};

use super::{DocumentPart, Metrics};

const DOCUMENT_PART_CONSTRAINT: &str = "biolink:tmkp_document_part";

#[derive(Debug, Clone, Default)]
pub struct ConceptPair {
    pub subject: String,
    pub object: String,
    /// Query graph keys this pair answers.
    pub subject_key: String,
    pub object_key: String,
    pub edge_key: String,
    pub metrics: HashMap<DocumentPart, Metrics>,
}

impl ConceptPair {
    pub fn new(subject: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            ..Default::default()
        }
    }

    pub fn with_keys(
        mut self,
        subject_key: impl Into<String>,
        object_key: impl Into<String>,
        edge_key: impl Into<String>,
    ) -> Self {
        self.subject_key = subject_key.into();
        self.object_key = object_key.into();
        self.edge_key = edge_key.into();
        self
    }

    /// Knowledge edge key for this pair.
    pub fn edge_id(&self) -> String {
        format!("{}_{}", self.subject, self.object)
    }

    /// A pair only reaches the knowledge graph if some part saw the two
    /// concepts together at least once.
    pub fn has_pair_evidence(&self) -> bool {
        self.metrics.values().any(|m| m.pair_count() > 0)
    }

    /// Apply one constraint, keeping only the document parts that satisfy
    /// it. Returns `None` when no part survives, which drops the pair.
    /// Chaining calls over a constraint list yields AND semantics.
    pub fn satisfy_constraint(&self, constraint: &AttributeConstraint) -> Option<ConceptPair> {
        let surviving: HashMap<DocumentPart, Metrics> = self
            .metrics
            .iter()
            .filter(|(_, metrics)| part_satisfies(metrics, constraint))
            .map(|(part, metrics)| (*part, metrics.clone()))
            .collect();
        if surviving.is_empty() {
            return None;
        }
        Some(ConceptPair {
            subject: self.subject.clone(),
            object: self.object.clone(),
            subject_key: self.subject_key.clone(),
            object_key: self.object_key.clone(),
            edge_key: self.edge_key.clone(),
            metrics: surviving,
        })
    }

    /// Edge attributes: one supporting-study-result attribute per document
    /// part with evidence, each nesting that part's counts and scores.
    pub fn to_attributes(&self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        for part in DocumentPart::ALL {
            let Some(metrics) = self.metrics.get(&part) else {
                continue;
            };
            if metrics.pair_count() == 0 {
                continue;
            }
            let mut nested = vec![Attribute::new(
                DOCUMENT_PART_CONSTRAINT,
                json!(part.as_str()),
            )
            .attribute_source(INFORES_COOCCURRENCE)];
            nested.extend(metrics.to_attributes());
            attributes.push(
                Attribute::new(
                    "biolink:has_supporting_study_result",
                    json!(format!(
                        "tmkp:{}_{}_{}",
                        self.subject,
                        self.object,
                        part.as_str()
                    )),
                )
                .attribute_source(INFORES_COOCCURRENCE)
                .attributes(nested),
            );
        }
        attributes
    }
}

/// Numeric value a constraint id selects from one part's metrics. `None`
/// for the string-valued document part constraint.
fn metric_value(metrics: &Metrics, id: &str) -> Option<f64> {
    match id {
        "biolink:concept_count_subject" => Some(metrics.single_count1() as f64),
        "biolink:concept_count_object" => Some(metrics.single_count2() as f64),
        "biolink:tmkp_concept_pair_count" => Some(metrics.pair_count() as f64),
        "biolink:tmkp_normalized_google_distance" => Some(metrics.normalized_google_distance()),
        "biolink:tmkp_pointwise_mutual_information" => {
            Some(metrics.pointwise_mutual_information())
        }
        "biolink:tmkp_normalized_pointwise_mutual_information" => {
            Some(metrics.normalized_pointwise_mutual_information())
        }
        "biolink:tmkp_normalized_pointwise_mutual_information_max_denominator" => {
            Some(metrics.normalized_pointwise_mutual_information_max())
        }
        "biolink:tmkp_mutual_dependence" => Some(metrics.mutual_dependence()),
        "biolink:tmkp_log_frequency_biased_mutual_dependence" => {
            Some(metrics.log_frequency_biased_mutual_dependence())
        }
        _ => None,
    }
}

fn part_satisfies(metrics: &Metrics, constraint: &AttributeConstraint) -> bool {
    let raw = if constraint.id == DOCUMENT_PART_CONSTRAINT {
        string_satisfies(metrics.part().as_str(), constraint)
    } else {
        match metric_value(metrics, &constraint.id) {
            Some(value) => numeric_satisfies(value, constraint),
            None => false,
        }
    };
    raw != constraint.not
}

fn numeric_satisfies(metric: f64, constraint: &AttributeConstraint) -> bool {
    // Strict equality compares the whole constraint value, so a list can
    // never strictly equal a scalar metric.
    if constraint.operator == "===" {
        return constraint.value.as_f64() == Some(metric);
    }
    match &constraint.value {
        // A list matches if any element does.
        Value::Array(elements) => elements
            .iter()
            .filter_map(Value::as_f64)
            .any(|v| compare_numbers(metric, &constraint.operator, v)),
        value => value
            .as_f64()
            .is_some_and(|v| compare_numbers(metric, &constraint.operator, v)),
    }
}

fn compare_numbers(metric: f64, operator: &str, value: f64) -> bool {
    match operator {
        "==" => metric == value,
        "<" => metric < value,
        ">" => metric > value,
        _ => false,
    }
}

fn string_satisfies(part: &str, constraint: &AttributeConstraint) -> bool {
    if constraint.operator == "===" {
        return constraint.value.as_str() == Some(part);
    }
    match &constraint.value {
        Value::Array(elements) => elements
            .iter()
            .filter_map(Value::as_str)
            .any(|v| compare_strings(part, &constraint.operator, v)),
        value => value
            .as_str()
            .is_some_and(|v| compare_strings(part, &constraint.operator, v)),
    }
}

fn compare_strings(part: &str, operator: &str, value: &str) -> bool {
    match operator {
        "==" => part == value,
        "matches" => Regex::new(value).map(|re| re.is_match(part)).unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair() -> ConceptPair {
        let mut pair =
            ConceptPair::new("CHEBI:6801", "MONDO:0005015").with_keys("n0", "n1", "e0");
        pair.metrics.insert(
            DocumentPart::Abstract,
            Metrics::new(40, 30, 12, 500, 1000, DocumentPart::Abstract),
        );
        pair.metrics.insert(
            DocumentPart::Sentence,
            Metrics::new(20, 15, 2, 500, 1000, DocumentPart::Sentence),
        );
        pair
    }

    fn constraint(id: &str, operator: &str, value: Value, not: bool) -> AttributeConstraint {
        AttributeConstraint {
            id: id.to_string(),
            name: id.to_string(),
            operator: operator.to_string(),
            value,
            not,
            unit_id: None,
            unit_name: None,
        }
    }

    #[test]
    fn test_constraint_narrows_parts() {
        let narrowed = pair()
            .satisfy_constraint(&constraint(
                "biolink:tmkp_concept_pair_count",
                ">",
                json!(5),
                false,
            ))
            .unwrap();
        assert_eq!(narrowed.metrics.len(), 1);
        assert!(narrowed.metrics.contains_key(&DocumentPart::Abstract));
    }

    #[test]
    fn test_chain_to_empty_drops_pair() {
        let first = pair()
            .satisfy_constraint(&constraint(
                "biolink:tmkp_concept_pair_count",
                "<",
                json!(5),
                false,
            ))
            .unwrap();
        assert!(first.metrics.contains_key(&DocumentPart::Sentence));
        let second = first.satisfy_constraint(&constraint(
            DOCUMENT_PART_CONSTRAINT,
            "==",
            json!("abstract"),
            false,
        ));
        assert!(second.is_none());
    }

    #[test]
    fn test_not_flag_inverts() {
        let narrowed = pair()
            .satisfy_constraint(&constraint(
                DOCUMENT_PART_CONSTRAINT,
                "==",
                json!("abstract"),
                true,
            ))
            .unwrap();
        assert_eq!(narrowed.metrics.len(), 1);
        assert!(narrowed.metrics.contains_key(&DocumentPart::Sentence));
    }

    #[test]
    fn test_list_value_is_or() {
        let narrowed = pair()
            .satisfy_constraint(&constraint(
                DOCUMENT_PART_CONSTRAINT,
                "==",
                json!(["title", "sentence"]),
                false,
            ))
            .unwrap();
        assert_eq!(narrowed.metrics.len(), 1);
        assert!(narrowed.metrics.contains_key(&DocumentPart::Sentence));
    }

    #[test]
    fn test_strict_equality_against_list_never_matches_scalar() {
        let result = pair().satisfy_constraint(&constraint(
            "biolink:tmkp_concept_pair_count",
            "===",
            json!([12, 2]),
            false,
        ));
        assert!(result.is_none());
    }

    #[test]
    fn test_regex_matches_part_name() {
        let narrowed = pair()
            .satisfy_constraint(&constraint(
                DOCUMENT_PART_CONSTRAINT,
                "matches",
                json!("^abs.*"),
                false,
            ))
            .unwrap();
        assert!(narrowed.metrics.contains_key(&DocumentPart::Abstract));
        assert_eq!(narrowed.metrics.len(), 1);
    }

    #[test]
    fn test_attributes_nest_per_part() {
        let attributes = pair().to_attributes();
        assert_eq!(attributes.len(), 2);
        for attribute in &attributes {
            assert_eq!(
                attribute.attribute_type_id,
                "biolink:has_supporting_study_result"
            );
            assert!(!attribute.attributes.is_empty());
        }
    }
}
