//! TRAPI attributes, attribute constraints and retrieval sources.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute constraint ids this service can evaluate.
pub const SUPPORTED_CONSTRAINTS: [&str; 10] = [
    "biolink:concept_count_subject",
    "biolink:concept_count_object",
    "biolink:tmkp_concept_pair_count",
    "biolink:tmkp_normalized_google_distance",
    "biolink:tmkp_pointwise_mutual_information",
    "biolink:tmkp_normalized_pointwise_mutual_information",
    "biolink:tmkp_mutual_dependence",
    "biolink:tmkp_normalized_pointwise_mutual_information_max_denominator",
    "biolink:tmkp_log_frequency_biased_mutual_dependence",
    "biolink:tmkp_document_part",
];

/// A TRAPI attribute. Always carries `attribute_type_id` and `value`;
/// everything this service emits also carries `attribute_source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub attribute_type_id: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_attribute_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

impl Attribute {
    pub fn new(attribute_type_id: impl Into<String>, value: Value) -> Self {
        Self {
            attribute_type_id: attribute_type_id.into(),
            value,
            original_attribute_name: None,
            value_type_id: None,
            attribute_source: None,
            value_url: None,
            description: None,
            attributes: Vec::new(),
        }
    }

    pub fn value_type_id(mut self, id: impl Into<String>) -> Self {
        self.value_type_id = Some(id.into());
        self
    }

    pub fn attribute_source(mut self, source: impl Into<String>) -> Self {
        self.attribute_source = Some(source.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// A constraint on a query edge's attributes.
///
/// Constraints are chained by the caller: each one narrows the set of
/// document parts that still satisfy every constraint seen so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeConstraint {
    pub id: String,
    pub name: String,
    pub operator: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub not: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
}

impl AttributeConstraint {
    /// Whether this service knows how to evaluate the constraint.
    /// Unsupported ids reject the whole request before execution.
    pub fn is_supported(&self) -> bool {
        SUPPORTED_CONSTRAINTS.contains(&self.id.as_str())
    }
}

/// Provenance of a knowledge edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSource {
    pub resource_id: String,
    pub resource_role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstream_resource_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_record_urls: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RetrievalSource {
    /// The primary knowledge source entry for this service.
    pub fn primary(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_role: "primary_knowledge_source".to_string(),
            upstream_resource_ids: Vec::new(),
            source_record_urls: Vec::new(),
            extra: Map::new(),
        }
    }
}
