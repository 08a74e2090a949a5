//! Results, analyses and bindings.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Attribute;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Result {
    #[serde(default)]
    pub node_bindings: HashMap<String, Vec<NodeBinding>>,
    #[serde(default)]
    pub analyses: Vec<Analysis>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub resource_id: String,
    #[serde(default)]
    pub edge_bindings: HashMap<String, Vec<EdgeBinding>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBinding {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeBinding {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Vec::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeBinding {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EdgeBinding {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Result {
    /// Key identifying which results describe the same set of nodes. Two
    /// results with equal keys are merged into one, their edge bindings
    /// combined under a single analysis.
    fn binding_key(&self) -> BTreeMap<String, Vec<String>> {
        self.node_bindings
            .iter()
            .map(|(qnode, bindings)| {
                let mut ids: Vec<String> = bindings.iter().map(|b| b.id.clone()).collect();
                ids.sort();
                ids.dedup();
                (qnode.clone(), ids)
            })
            .collect()
    }
}

/// Collapse results that bind the same nodes. Edge bindings from merged
/// results accumulate under the first result's analyses, deduplicated per
/// query edge.
pub fn merge_results(results: Vec<Result>) -> Vec<Result> {
    let mut merged: Vec<Result> = Vec::new();
    let mut index: HashMap<BTreeMap<String, Vec<String>>, usize> = HashMap::new();

    for result in results {
        let key = result.binding_key();
        match index.get(&key) {
            None => {
                index.insert(key, merged.len());
                merged.push(result);
            }
            Some(&at) => {
                let target = &mut merged[at];
                if target.analyses.is_empty() {
                    target.analyses = result.analyses;
                    continue;
                }
                for analysis in result.analyses {
                    let into = &mut target.analyses[0];
                    for (qedge, bindings) in analysis.edge_bindings {
                        let slot = into.edge_bindings.entry(qedge).or_default();
                        for binding in bindings {
                            if !slot.iter().any(|b| b.id == binding.id) {
                                slot.push(binding);
                            }
                        }
                    }
                }
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(nodes: &[(&str, &str)], edges: &[(&str, &str)]) -> Result {
        Result {
            node_bindings: nodes
                .iter()
                .map(|(q, id)| (q.to_string(), vec![NodeBinding::new(*id)]))
                .collect(),
            analyses: vec![Analysis {
                resource_id: "infores:text-mining-provider-cooccurrence".to_string(),
                edge_bindings: edges
                    .iter()
                    .map(|(q, id)| (q.to_string(), vec![EdgeBinding::new(*id)]))
                    .collect(),
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }

    #[test]
    fn test_merge_combines_equal_node_sets() {
        let merged = merge_results(vec![
            result(
                &[("n0", "CHEBI:6801"), ("n1", "MONDO:0005015")],
                &[("e0", "CHEBI:6801_MONDO:0005015")],
            ),
            result(
                &[("n0", "CHEBI:6801"), ("n1", "MONDO:0005015")],
                &[("e1", "CHEBI:6801_MONDO:0005015")],
            ),
        ]);
        assert_eq!(merged.len(), 1);
        let bindings = &merged[0].analyses[0].edge_bindings;
        assert!(bindings.contains_key("e0"));
        assert!(bindings.contains_key("e1"));
    }

    #[test]
    fn test_merge_keeps_distinct_node_sets_apart() {
        let merged = merge_results(vec![
            result(&[("n0", "CHEBI:6801")], &[("e0", "a")]),
            result(&[("n0", "CHEBI:15365")], &[("e0", "b")]),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_deduplicates_edge_bindings() {
        let merged = merge_results(vec![
            result(&[("n0", "CHEBI:6801")], &[("e0", "same")]),
            result(&[("n0", "CHEBI:6801")], &[("e0", "same")]),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].analyses[0].edge_bindings["e0"].len(), 1);
    }
}
