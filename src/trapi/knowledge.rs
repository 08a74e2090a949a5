//! Knowledge graph types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Attribute, RetrievalSource};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub nodes: HashMap<String, KnowledgeNode>,
    #[serde(default)]
    pub edges: HashMap<String, KnowledgeEdge>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KnowledgeGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    /// Query node id this knowledge node answers, used when binding
    /// results. Last writer wins on node-id collision. Never serialized.
    #[serde(skip)]
    pub query_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEdge {
    pub subject: String,
    pub object: String,
    pub predicate: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<RetrievalSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Value>,
    /// Query edge id this knowledge edge answers. Never serialized.
    #[serde(skip)]
    pub query_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_key_never_serialized() {
        let node = KnowledgeNode {
            name: Some("metformin".to_string()),
            categories: vec!["biolink:SmallMolecule".to_string()],
            query_key: Some("n0".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&node).unwrap();
        assert!(value.get("query_key").is_none());
        assert_eq!(value["name"], "metformin");
    }

    #[test]
    fn test_unknown_edge_fields_preserved() {
        let json = json!({
            "subject": "CHEBI:6801",
            "object": "MONDO:0005015",
            "predicate": "biolink:occurs_together_in_literature_with",
            "knowledge_level": "statistical_association"
        });
        let edge: KnowledgeEdge = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(
            serde_json::to_value(&edge).unwrap()["knowledge_level"],
            "statistical_association"
        );
    }

    #[test]
    fn test_graph_survives_round_trip() {
        let mut graph = KnowledgeGraph::default();
        graph.nodes.insert(
            "CHEBI:6801".to_string(),
            KnowledgeNode {
                name: Some("metformin".to_string()),
                categories: vec!["biolink:SmallMolecule".to_string()],
                ..Default::default()
            },
        );
        graph.nodes.insert(
            "MONDO:0005015".to_string(),
            KnowledgeNode {
                name: Some("diabetes mellitus".to_string()),
                ..Default::default()
            },
        );
        graph.edges.insert(
            "e0".to_string(),
            KnowledgeEdge {
                subject: "CHEBI:6801".to_string(),
                object: "MONDO:0005015".to_string(),
                predicate: "biolink:occurs_together_in_literature_with".to_string(),
                ..Default::default()
            },
        );

        let encoded = serde_json::to_string(&graph).unwrap();
        let decoded: KnowledgeGraph = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.nodes.len(), 2);
        assert!(decoded.nodes.contains_key("CHEBI:6801"));
        assert!(decoded.nodes.contains_key("MONDO:0005015"));
        assert_eq!(decoded.nodes["CHEBI:6801"].name.as_deref(), Some("metformin"));
        let edge = &decoded.edges["e0"];
        assert_eq!(edge.subject, "CHEBI:6801");
        assert_eq!(edge.object, "MONDO:0005015");
        assert_eq!(edge.predicate, "biolink:occurs_together_in_literature_with");
    }
}
