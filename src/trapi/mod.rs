//! TRAPI wire types: query graphs, knowledge graphs, results and bindings.
//!
//! Graph `nodes`/`edges` are JSON maps keyed by caller- or service-chosen
//! strings, never arrays. Fields this service does not model are preserved
//! verbatim through parse/serialize via a flattened side-map on each type.

mod attribute;
mod knowledge;
mod query;
mod result;
mod validation;

pub use attribute::{Attribute, AttributeConstraint, RetrievalSource, SUPPORTED_CONSTRAINTS};
pub use knowledge::{KnowledgeEdge, KnowledgeGraph, KnowledgeNode};
pub use query::{QueryEdge, QueryGraph, QueryNode};
pub use result::{merge_results, Analysis, EdgeBinding, NodeBinding, Result};
pub use validation::{validate_knowledge_graph, validate_query_graph, ValidationError};

/// Source identifier attached to every attribute and retrieval source this
/// service produces.
pub const INFORES_COOCCURRENCE: &str = "infores:text-mining-provider-cooccurrence";

/// Predicate carried by every co-occurrence knowledge edge.
pub const COOCCURRENCE_PREDICATE: &str = "biolink:occurs_together_in_literature_with";

/// Predicates a query edge may use to request co-occurrence statistics.
/// Edges with other predicates are silently skipped; a blank predicate
/// participates.
pub const SUPPORTED_PREDICATES: [&str; 5] = [
    "biolink:related_to",
    "biolink:related_to_at_instance_level",
    "biolink:associated_with",
    "biolink:correlated_with",
    "biolink:occurs_together_in_literature_with",
];
