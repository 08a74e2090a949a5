//! Query graph types.
//!
//! Callers vary between singular and plural key spellings for `ids`,
//! `categories` and `predicates`; both are accepted on input and the plural
//! form is emitted on output. Scalar values where a list is expected are
//! wrapped into one-element lists.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::AttributeConstraint;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryGraph {
    #[serde(default)]
    pub nodes: HashMap<String, QueryNode>,
    #[serde(default)]
    pub edges: HashMap<String, QueryEdge>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryNode {
    #[serde(
        default,
        alias = "id",
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ids: Vec<String>,
    #[serde(
        default,
        alias = "category",
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_set: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryEdge {
    pub subject: String,
    pub object: String,
    #[serde(
        default,
        alias = "predicate",
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub predicates: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_constraints: Vec<AttributeConstraint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QueryEdge {
    /// Whether the edge asks for something this service can answer. A blank
    /// predicate list participates.
    pub fn wants_cooccurrence(&self) -> bool {
        self.predicates.is_empty()
            || self
                .predicates
                .iter()
                .any(|p| super::SUPPORTED_PREDICATES.contains(&p.as_str()))
    }
}

fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}
