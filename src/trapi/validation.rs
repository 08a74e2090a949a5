//! Structural validation of incoming graphs, reported as a list of
//! path/message pairs rather than failing on the first problem.

use serde::{Deserialize, Serialize};

use super::{KnowledgeGraph, QueryGraph};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A lookup query graph needs at least one edge, and every edge must point
/// at declared nodes. Each node must pin down something to search for.
pub fn validate_query_graph(graph: &QueryGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if graph.nodes.is_empty() {
        errors.push(ValidationError::new(
            "query_graph.nodes",
            "query graph has no nodes",
        ));
    }
    if graph.edges.is_empty() {
        errors.push(ValidationError::new(
            "query_graph.edges",
            "query graph has no edges",
        ));
    }

    for (key, node) in &graph.nodes {
        if node.ids.is_empty() && node.categories.is_empty() {
            errors.push(ValidationError::new(
                format!("query_graph.nodes.{key}"),
                "node has neither ids nor categories",
            ));
        }
    }

    for (key, edge) in &graph.edges {
        for (field, node_key) in [("subject", &edge.subject), ("object", &edge.object)] {
            if !graph.nodes.contains_key(node_key) {
                errors.push(ValidationError::new(
                    format!("query_graph.edges.{key}.{field}"),
                    format!("references undeclared node '{node_key}'"),
                ));
            }
        }
    }

    errors
}

/// An overlay knowledge graph must be internally consistent: every edge
/// endpoint has to appear among the graph's nodes.
pub fn validate_knowledge_graph(graph: &KnowledgeGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (key, edge) in &graph.edges {
        for (field, curie) in [("subject", &edge.subject), ("object", &edge.object)] {
            if !graph.nodes.contains_key(curie) {
                errors.push(ValidationError::new(
                    format!("knowledge_graph.edges.{key}.{field}"),
                    format!("references node '{curie}' missing from knowledge_graph.nodes"),
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_query_graph_passes() {
        let graph: QueryGraph = serde_json::from_value(json!({
            "nodes": {
                "n0": {"ids": ["CHEBI:6801"]},
                "n1": {"categories": ["biolink:Disease"]}
            },
            "edges": {"e0": {"subject": "n0", "object": "n1"}}
        }))
        .unwrap();
        assert!(validate_query_graph(&graph).is_empty());
    }

    #[test]
    fn test_dangling_edge_endpoint_reported() {
        let graph: QueryGraph = serde_json::from_value(json!({
            "nodes": {"n0": {"ids": ["CHEBI:6801"]}},
            "edges": {"e0": {"subject": "n0", "object": "n9"}}
        }))
        .unwrap();
        let errors = validate_query_graph(&graph);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "query_graph.edges.e0.object");
    }

    #[test]
    fn test_empty_node_reported() {
        let graph: QueryGraph = serde_json::from_value(json!({
            "nodes": {"n0": {}},
            "edges": {"e0": {"subject": "n0", "object": "n0"}}
        }))
        .unwrap();
        let errors = validate_query_graph(&graph);
        assert!(errors
            .iter()
            .any(|e| e.path == "query_graph.nodes.n0"));
    }

    #[test]
    fn test_knowledge_graph_edge_without_node() {
        let graph: KnowledgeGraph = serde_json::from_value(json!({
            "nodes": {"CHEBI:6801": {"name": "metformin"}},
            "edges": {
                "e0": {
                    "subject": "CHEBI:6801",
                    "object": "MONDO:0005015",
                    "predicate": "biolink:treats"
                }
            }
        }))
        .unwrap();
        let errors = validate_knowledge_graph(&graph);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("MONDO:0005015"));
    }
}
