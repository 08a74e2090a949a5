//! SRI Node Normalizer client.
//!
//! The normalizer maps CURIEs across identifier namespaces. Responses are
//! JSON objects keyed by the requested CURIEs; unknown CURIEs map to null.
//! Failures never abort a request: a failed batch degrades to an empty map.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::config::Config;
use crate::context::{Context, HttpClient};
use crate::di::FromContext;

#[derive(FromContext, Clone)]
pub struct NodeNormalizer {
    http: HttpClient,
    config: Arc<Config>,
}

impl NodeNormalizer {
    /// Fetches normalized node records for the given CURIEs, batched at the
    /// configured batch size.
    pub async fn normalized_nodes(&self, curies: &[String]) -> Map<String, Value> {
        let mut merged = Map::new();
        if curies.is_empty() {
            return merged;
        }
        let batch_size = self.config.normalizer.batch_size.max(1);
        for chunk in curies.chunks(batch_size) {
            match self.fetch_batch(chunk).await {
                Ok(batch) => merged.extend(batch),
                Err(error) => {
                    tracing::warn!(%error, batch = chunk.len(), "normalizer request failed");
                }
            }
        }
        merged
    }

    async fn fetch_batch(&self, curies: &[String]) -> Result<Map<String, Value>, reqwest::Error> {
        let url = format!(
            "{}/get_normalized_nodes",
            self.config.normalizer.url.trim_end_matches('/')
        );
        let response = self
            .http
            .0
            .post(&url)
            .json(&json!({ "curies": curies, "conflate": true }))
            .send()
            .await?
            .error_for_status()?;
        let body: Value = response.json().await?;
        Ok(body.as_object().cloned().unwrap_or_default())
    }

    /// Label for a CURIE, falling back to the normalized identifier, then
    /// the CURIE itself.
    pub fn label(nodes: &Map<String, Value>, curie: &str) -> String {
        node_record(nodes, curie)
            .and_then(|record| record.get("id"))
            .and_then(|id| {
                id.get("label")
                    .and_then(Value::as_str)
                    .or_else(|| id.get("identifier").and_then(Value::as_str))
            })
            .unwrap_or(curie)
            .to_string()
    }

    /// Biolink categories for a CURIE. Unknown CURIEs get the most generic
    /// category.
    pub fn categories(nodes: &Map<String, Value>, curie: &str) -> Vec<String> {
        node_record(nodes, curie)
            .and_then(|record| record.get("type"))
            .and_then(Value::as_array)
            .map(|types| {
                types
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|| vec!["biolink:Entity".to_string()])
    }

    /// Equivalent identifiers for a CURIE.
    pub fn synonyms(nodes: &Map<String, Value>, curie: &str) -> Vec<String> {
        node_record(nodes, curie)
            .and_then(|record| record.get("equivalent_identifiers"))
            .and_then(Value::as_array)
            .map(|equivalents| {
                equivalents
                    .iter()
                    .filter_map(|e| e.get("identifier"))
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn node_record<'a>(nodes: &'a Map<String, Value>, curie: &str) -> Option<&'a Value> {
    nodes.get(curie).filter(|record| !record.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Map<String, Value> {
        json!({
            "CHEBI:6801": {
                "id": {"identifier": "CHEBI:6801", "label": "metformin"},
                "type": ["biolink:SmallMolecule", "biolink:ChemicalEntity"],
                "equivalent_identifiers": [
                    {"identifier": "CHEBI:6801", "label": "metformin"},
                    {"identifier": "DRUGBANK:DB00331"}
                ]
            },
            "MONDO:0005015": {
                "id": {"identifier": "MONDO:0005015"}
            },
            "FAKE:0": null
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_label_fallback_chain() {
        let nodes = sample();
        assert_eq!(NodeNormalizer::label(&nodes, "CHEBI:6801"), "metformin");
        assert_eq!(
            NodeNormalizer::label(&nodes, "MONDO:0005015"),
            "MONDO:0005015"
        );
        assert_eq!(NodeNormalizer::label(&nodes, "FAKE:0"), "FAKE:0");
    }

    #[test]
    fn test_categories_default_to_entity() {
        let nodes = sample();
        assert_eq!(
            NodeNormalizer::categories(&nodes, "CHEBI:6801"),
            vec!["biolink:SmallMolecule", "biolink:ChemicalEntity"]
        );
        assert_eq!(
            NodeNormalizer::categories(&nodes, "FAKE:0"),
            vec!["biolink:Entity"]
        );
    }

    #[test]
    fn test_synonyms_collects_identifiers() {
        let nodes = sample();
        assert_eq!(
            NodeNormalizer::synonyms(&nodes, "CHEBI:6801"),
            vec!["CHEBI:6801", "DRUGBANK:DB00331"]
        );
        assert!(NodeNormalizer::synonyms(&nodes, "FAKE:0").is_empty());
    }
}
