//! Request orchestration: the lookup pipeline, overlay enrichment, the meta
//! knowledge graph and universe refresh.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Value};

use crate::context::{Context, InvalidClasses, Universe};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{ConceptPair, DocumentPart, Metrics, UniverseCounts};
use crate::repositories::{LookupRepository, NodeRepository};
use crate::trapi::{
    self, Analysis, EdgeBinding, KnowledgeEdge, KnowledgeGraph, KnowledgeNode, NodeBinding,
    QueryGraph, RetrievalSource, COOCCURRENCE_PREDICATE, INFORES_COOCCURRENCE,
};

use super::{
    BiolinkClient, ConceptResolver, CooccurrenceAggregator, HierarchyExpander, NodeNormalizer,
};

#[derive(FromContext, Clone)]
pub struct CooccurrenceService {
    lookup: LookupRepository,
    nodes: NodeRepository,
    resolver: ConceptResolver,
    hierarchy: HierarchyExpander,
    aggregator: CooccurrenceAggregator,
    normalizer: NodeNormalizer,
    biolink: BiolinkClient,
    universe: Universe,
    invalid_classes: InvalidClasses,
}

impl CooccurrenceService {
    /// The lookup pipeline: resolve, expand, aggregate, score, constrain,
    /// build and bind. The query graph must already be validated.
    pub async fn lookup(
        &self,
        query_graph: &QueryGraph,
    ) -> Result<(KnowledgeGraph, Vec<trapi::Result>), AppError> {
        let pairs = self.concept_pairs(query_graph).await?;
        tracing::info!(pairs = pairs.len(), "initial concept pairs");

        let mut surviving: Vec<ConceptPair> = Vec::new();
        for pair in pairs {
            let Some(edge) = query_graph.edges.get(&pair.edge_key) else {
                continue;
            };
            let mut current = Some(pair);
            for constraint in &edge.attribute_constraints {
                current = match current {
                    Some(pair) => pair.satisfy_constraint(constraint),
                    None => None,
                };
                if current.is_none() {
                    break;
                }
            }
            if let Some(pair) = current {
                surviving.push(pair);
            }
        }

        let mut curies: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for pair in &surviving {
            for curie in [&pair.subject, &pair.object] {
                if seen.insert(curie.clone()) {
                    curies.push(curie.clone());
                }
            }
        }
        let normalized = self.normalizer.normalized_nodes(&curies).await;
        let labels = self.lookup.labels(&curies).await.unwrap_or_else(|error| {
            tracing::warn!(%error, "label lookup failed");
            HashMap::new()
        });
        let categories = self
            .lookup
            .categories(&curies)
            .await
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "category lookup failed");
                HashMap::new()
            });
        let invalid = self.invalid_classes.0.read().await.clone();

        let knowledge_graph =
            build_knowledge_graph(&surviving, &labels, &categories, &normalized, &invalid);
        let results = trapi::merge_results(bind_graphs(query_graph, &knowledge_graph));
        Ok((knowledge_graph, results))
    }

    /// One ConceptPair per (resolved subject, resolved object) combination
    /// per supported query edge, scored per document part.
    async fn concept_pairs(
        &self,
        query_graph: &QueryGraph,
    ) -> Result<Vec<ConceptPair>, AppError> {
        let universe = self.universe.0.read().await.clone();
        let mut pairs = Vec::new();
        for (edge_key, edge) in &query_graph.edges {
            if !edge.wants_cooccurrence() {
                tracing::debug!(edge = edge_key, "edge predicates not supported, skipping");
                continue;
            }
            let (Some(subject_node), Some(object_node)) = (
                query_graph.nodes.get(&edge.subject),
                query_graph.nodes.get(&edge.object),
            ) else {
                continue;
            };
            let subject_curies = self.resolver.resolve(subject_node).await;
            let object_curies = self.resolver.resolve(object_node).await;
            if subject_curies.is_empty() || object_curies.is_empty() {
                continue;
            }
            let mut edge_pairs = self
                .find_concept_pairs(&subject_curies, &object_curies, &universe)
                .await?;
            for pair in &mut edge_pairs {
                pair.subject_key = edge.subject.clone();
                pair.object_key = edge.object.clone();
                pair.edge_key = edge_key.clone();
            }
            pairs.extend(edge_pairs);
        }
        Ok(pairs)
    }

    async fn find_concept_pairs(
        &self,
        subject_curies: &[String],
        object_curies: &[String],
        universe: &UniverseCounts,
    ) -> Result<Vec<ConceptPair>, AppError> {
        let single_subject = self.lookup.single_counts(subject_curies).await?;
        let single_object = self.lookup.single_counts(object_curies).await?;
        let subject_group = self.hierarchy.expand(subject_curies).await?;
        let object_group = self.hierarchy.expand(object_curies).await?;
        let dictionary = self.aggregator.aggregate(&subject_group, &object_group).await;
        // Hierarchy-inclusive counts only exist for concepts with
        // descendants; everything else falls back to the plain count.
        let hierarchical_subject = self.lookup.hierarchical_counts(subject_curies).await?;
        let hierarchical_object = self.lookup.hierarchical_counts(object_curies).await?;

        let mut pairs = Vec::new();
        for subject in subject_curies {
            for object in object_curies {
                let mut pair = ConceptPair::new(subject.clone(), object.clone());
                for part in DocumentPart::ALL {
                    let Some(documents) =
                        dictionary.get(&(subject.clone(), object.clone(), part))
                    else {
                        continue;
                    };
                    if documents.is_empty() {
                        continue;
                    }
                    let subject_count =
                        effective_count(&hierarchical_subject, &single_subject, subject, part);
                    let object_count =
                        effective_count(&hierarchical_object, &single_object, object, part);
                    if subject_count == 0 || object_count == 0 {
                        continue;
                    }
                    let metrics = Metrics::new(
                        subject_count,
                        object_count,
                        documents.len() as i64,
                        universe.concept_count(part),
                        universe.document_count(part),
                        part,
                    )
                    .with_documents(documents.iter().map(|hash| document_id(hash)));
                    pair.metrics.insert(part, metrics);
                }
                if !pair.metrics.is_empty() {
                    pairs.push(pair);
                }
            }
        }
        Ok(pairs)
    }

    /// Enriches an externally supplied knowledge graph with co-occurrence
    /// edges for every distinct unordered pair of its node ids, attaching an
    /// analysis to each supplied result that binds both concepts.
    pub async fn overlay(
        &self,
        knowledge_graph: &mut KnowledgeGraph,
        results: &mut [trapi::Result],
    ) -> Result<(), AppError> {
        let universe = self.universe.0.read().await.clone();
        let curies: Vec<String> = knowledge_graph.nodes.keys().cloned().collect();
        for (subject, object) in all_concept_pairs(&curies) {
            let singles = self
                .lookup
                .single_counts(&[subject.clone(), object.clone()])
                .await?;
            let documents = self
                .lookup
                .pair_documents(
                    std::slice::from_ref(&subject),
                    std::slice::from_ref(&object),
                )
                .await?;
            let mut pair = ConceptPair::new(subject.clone(), object.clone());
            for part in DocumentPart::ALL {
                let docs: HashSet<&String> = documents
                    .get(&(subject.clone(), object.clone(), part))
                    .map(|d| d.iter().collect())
                    .unwrap_or_default();
                let single1 = part_count(&singles, &subject, part);
                let single2 = part_count(&singles, &object, part);
                let metrics = Metrics::new(
                    single1,
                    single2,
                    docs.len() as i64,
                    universe.total_concepts,
                    universe.document_count(part),
                    part,
                )
                .with_documents(docs.iter().map(|hash| document_id(hash)));
                // only parts with evidence and a defined distance overlay
                if metrics.pair_count() != 0 && !metrics.normalized_google_distance().is_nan() {
                    pair.metrics.insert(part, metrics);
                }
            }
            if pair.metrics.is_empty() {
                continue;
            }
            let edge_id = pair.edge_id();
            let edge = KnowledgeEdge {
                subject: pair.subject.clone(),
                object: pair.object.clone(),
                predicate: COOCCURRENCE_PREDICATE.to_string(),
                attributes: pair.to_attributes(),
                sources: vec![RetrievalSource::primary(INFORES_COOCCURRENCE)],
                qualifiers: Vec::new(),
                query_key: None,
                extra: Map::new(),
            };
            knowledge_graph.edges.insert(edge_id.clone(), edge);
            tracing::debug!(edge = %edge_id, "overlay edge added");
            for result in results.iter_mut() {
                if binds_curie(result, &subject) && binds_curie(result, &object) {
                    result.analyses.push(Analysis {
                        resource_id: INFORES_COOCCURRENCE.to_string(),
                        edge_bindings: HashMap::from([(
                            String::new(),
                            vec![EdgeBinding::new(edge_id.clone())],
                        )]),
                        extra: Map::new(),
                    });
                }
            }
        }
        Ok(())
    }

    /// The corpus's queryable shape: node categories with their CURIE
    /// prefixes and edge triples with the constraint-capable attributes.
    pub async fn meta_knowledge_graph(&self) -> Result<Value, AppError> {
        let node_metadata = self.nodes.node_metadata().await?;
        let edge_metadata = self.nodes.edge_metadata().await?;

        let mut category_prefixes: HashMap<String, Vec<String>> = HashMap::new();
        for metadata in node_metadata {
            category_prefixes
                .entry(metadata.category)
                .or_default()
                .push(metadata.id_prefix);
        }
        let nodes: Map<String, Value> = category_prefixes
            .into_iter()
            .map(|(category, prefixes)| {
                (
                    category,
                    json!({ "id_prefixes": prefixes, "attributes": null }),
                )
            })
            .collect();

        let attributes = meta_edge_attributes();
        let edges: Vec<Value> = edge_metadata
            .into_iter()
            .map(|metadata| {
                json!({
                    "subject": metadata.subject,
                    "object": metadata.object,
                    "predicate": metadata.predicate,
                    "knowledge_types": null,
                    "attributes": attributes,
                    "qualifiers": null,
                })
            })
            .collect();

        Ok(json!({ "nodes": nodes, "edges": edges }))
    }

    /// Recomputes the universe counters and the biolink invalid-class list.
    pub async fn refresh(&self) -> Result<Value, AppError> {
        let invalid = self.biolink.invalid_classes().await;
        let concept_counts = self.lookup.concept_counts_per_part().await?;
        let total_concepts = self.nodes.total_concept_count().await?;
        let mut document_counts = HashMap::new();
        for part in DocumentPart::ALL {
            document_counts.insert(part, self.nodes.document_count(part).await?);
        }
        tracing::info!(
            total_concepts,
            invalid_classes = invalid.len(),
            "universe counters refreshed"
        );
        {
            let mut universe = self.universe.0.write().await;
            *universe = UniverseCounts {
                total_concepts,
                concept_counts: concept_counts.clone(),
                document_counts: document_counts.clone(),
            };
        }
        {
            let mut classes = self.invalid_classes.0.write().await;
            *classes = invalid;
        }
        Ok(json!({ "concepts": concept_counts, "documents": document_counts }))
    }
}

fn effective_count(
    hierarchical: &HashMap<String, HashMap<DocumentPart, i64>>,
    single: &HashMap<String, HashMap<DocumentPart, i64>>,
    curie: &str,
    part: DocumentPart,
) -> i64 {
    let inclusive = part_count(hierarchical, curie, part);
    if inclusive > 0 {
        inclusive
    } else {
        part_count(single, curie, part)
    }
}

fn part_count(
    counts: &HashMap<String, HashMap<DocumentPart, i64>>,
    curie: &str,
    part: DocumentPart,
) -> i64 {
    counts
        .get(curie)
        .and_then(|parts| parts.get(&part))
        .copied()
        .unwrap_or(0)
}

/// Supporting document ids are stored as `pmid_hash`; the attribute carries
/// the id prefix only.
fn document_id(hash: &str) -> String {
    hash.split('_').next().unwrap_or(hash).to_string()
}

/// Every distinct unordered pair of concepts, each pair in sorted order.
fn all_concept_pairs(curies: &[String]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut seen = HashSet::new();
    for first in curies {
        for second in curies {
            if first == second {
                continue;
            }
            let pair = if first < second {
                (first.clone(), second.clone())
            } else {
                (second.clone(), first.clone())
            };
            if seen.insert(pair.clone()) {
                pairs.push(pair);
            }
        }
    }
    pairs
}

fn binds_curie(result: &trapi::Result, curie: &str) -> bool {
    result
        .node_bindings
        .values()
        .any(|bindings| bindings.iter().any(|binding| binding.id == curie))
}

/// Materializes the knowledge graph for the surviving pairs. Nodes carry
/// corpus label/categories with normalizer fallback; categories the biolink
/// model marks abstract/mixin/deprecated are dropped.
pub fn build_knowledge_graph(
    pairs: &[ConceptPair],
    labels: &HashMap<String, String>,
    categories: &HashMap<String, Vec<String>>,
    normalized: &Map<String, Value>,
    invalid_classes: &HashSet<String>,
) -> KnowledgeGraph {
    let mut knowledge_graph = KnowledgeGraph::default();
    for pair in pairs {
        if !pair.has_pair_evidence() {
            continue;
        }
        let edge = KnowledgeEdge {
            subject: pair.subject.clone(),
            object: pair.object.clone(),
            predicate: COOCCURRENCE_PREDICATE.to_string(),
            attributes: pair.to_attributes(),
            sources: vec![RetrievalSource::primary(INFORES_COOCCURRENCE)],
            qualifiers: Vec::new(),
            query_key: Some(pair.edge_key.clone()),
            extra: Map::new(),
        };
        knowledge_graph.edges.insert(pair.edge_id(), edge);
        insert_node(
            &mut knowledge_graph,
            &pair.subject,
            &pair.subject_key,
            labels,
            categories,
            normalized,
            invalid_classes,
        );
        insert_node(
            &mut knowledge_graph,
            &pair.object,
            &pair.object_key,
            labels,
            categories,
            normalized,
            invalid_classes,
        );
    }
    knowledge_graph
}

fn insert_node(
    knowledge_graph: &mut KnowledgeGraph,
    curie: &str,
    query_key: &str,
    labels: &HashMap<String, String>,
    categories: &HashMap<String, Vec<String>>,
    normalized: &Map<String, Value>,
    invalid_classes: &HashSet<String>,
) {
    let label = labels
        .get(curie)
        .cloned()
        .unwrap_or_else(|| NodeNormalizer::label(normalized, curie));
    let mut node_categories = categories.get(curie).cloned().unwrap_or_default();
    if node_categories.is_empty() {
        node_categories = NodeNormalizer::categories(normalized, curie);
    }
    node_categories.retain(|category| !invalid_classes.contains(&category.to_lowercase()));

    if let Some(existing) = knowledge_graph.nodes.get(curie) {
        if existing.query_key.as_deref() != Some(query_key) {
            tracing::warn!(curie, "knowledge node answers multiple query nodes; last writer wins");
        }
    }
    knowledge_graph.nodes.insert(
        curie.to_string(),
        KnowledgeNode {
            name: Some(label),
            categories: node_categories,
            attributes: Vec::new(),
            query_key: Some(query_key.to_string()),
            extra: Map::new(),
        },
    );
}

/// One Result per knowledge edge whose back-reference points at a query
/// edge, binding query node keys to the edge's subject/object.
pub fn bind_graphs(query_graph: &QueryGraph, knowledge_graph: &KnowledgeGraph) -> Vec<trapi::Result> {
    let mut results = Vec::new();
    for (edge_id, edge) in &knowledge_graph.edges {
        let mut result = trapi::Result::default();
        if let Some(query_key) = &edge.query_key {
            if query_graph.edges.contains_key(query_key) {
                result.analyses.push(Analysis {
                    resource_id: INFORES_COOCCURRENCE.to_string(),
                    edge_bindings: HashMap::from([(
                        query_key.clone(),
                        vec![EdgeBinding::new(edge_id.clone())],
                    )]),
                    extra: Map::new(),
                });
            }
        }
        for curie in [&edge.subject, &edge.object] {
            if let Some(node) = knowledge_graph.nodes.get(curie) {
                if let Some(query_key) = &node.query_key {
                    if query_graph.nodes.contains_key(query_key) {
                        result
                            .node_bindings
                            .entry(query_key.clone())
                            .or_default()
                            .push(NodeBinding::new(curie.clone()));
                    }
                }
            }
        }
        results.push(result);
    }
    results
}

fn meta_edge_attributes() -> Value {
    let descriptors = [
        "biolink:tmkp_document_part",
        "biolink:concept_count_subject",
        "biolink:concept_count_object",
        "biolink:tmkp_concept_pair_count",
        "biolink:tmkp_normalized_google_distance",
        "biolink:tmkp_normalized_pointwise_mutual_information_max_denominator",
        "biolink:tmkp_mutual_dependence",
        "biolink:tmkp_log_frequency_biased_mutual_dependence",
    ];
    Value::Array(
        descriptors
            .iter()
            .map(|id| {
                json!({
                    "attribute_type_id": id,
                    "attribute_source": INFORES_COOCCURRENCE,
                    "constraint_use": true,
                    "constraint_name": id,
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored_pair(subject: &str, object: &str, edge_key: &str) -> ConceptPair {
        let mut pair = ConceptPair::new(subject, object).with_keys("n0", "n1", edge_key);
        pair.metrics.insert(
            DocumentPart::Abstract,
            Metrics::new(10, 20, 4, 100, 1000, DocumentPart::Abstract),
        );
        pair
    }

    fn query_graph() -> QueryGraph {
        serde_json::from_value(json!({
            "nodes": {
                "n0": {"ids": ["CHEBI:6801"]},
                "n1": {"categories": ["biolink:Disease"]}
            },
            "edges": {"e0": {"subject": "n0", "object": "n1"}}
        }))
        .unwrap()
    }

    #[test]
    fn test_build_gates_on_pair_evidence() {
        let evidenced = scored_pair("CHEBI:6801", "MONDO:0005015", "e0");
        let mut empty = ConceptPair::new("CHEBI:1", "MONDO:1").with_keys("n0", "n1", "e0");
        empty.metrics.insert(
            DocumentPart::Abstract,
            Metrics::new(5, 5, 0, 100, 1000, DocumentPart::Abstract),
        );
        let kg = build_knowledge_graph(
            &[evidenced, empty],
            &HashMap::new(),
            &HashMap::new(),
            &Map::new(),
            &HashSet::new(),
        );
        assert_eq!(kg.edges.len(), 1);
        assert!(kg.edges.contains_key("CHEBI:6801_MONDO:0005015"));
    }

    #[test]
    fn test_build_filters_invalid_categories() {
        let pair = scored_pair("CHEBI:6801", "MONDO:0005015", "e0");
        let categories = HashMap::from([(
            "CHEBI:6801".to_string(),
            vec![
                "biolink:SmallMolecule".to_string(),
                "biolink:ChemicalOrDrugOrTreatment".to_string(),
            ],
        )]);
        let invalid = HashSet::from(["biolink:chemicalordrugortreatment".to_string()]);
        let kg = build_knowledge_graph(
            &[pair],
            &HashMap::new(),
            &categories,
            &Map::new(),
            &invalid,
        );
        assert_eq!(
            kg.nodes["CHEBI:6801"].categories,
            vec!["biolink:SmallMolecule"]
        );
    }

    #[test]
    fn test_build_falls_back_to_normalizer_metadata() {
        let pair = scored_pair("CHEBI:6801", "MONDO:0005015", "e0");
        let normalized = json!({
            "CHEBI:6801": {
                "id": {"identifier": "CHEBI:6801", "label": "metformin"},
                "type": ["biolink:SmallMolecule"]
            }
        })
        .as_object()
        .cloned()
        .unwrap();
        let kg = build_knowledge_graph(
            &[pair],
            &HashMap::new(),
            &HashMap::new(),
            &normalized,
            &HashSet::new(),
        );
        assert_eq!(kg.nodes["CHEBI:6801"].name.as_deref(), Some("metformin"));
        assert_eq!(
            kg.nodes["CHEBI:6801"].categories,
            vec!["biolink:SmallMolecule"]
        );
    }

    #[test]
    fn test_bind_and_merge_shared_node_sets() {
        let graph = query_graph();
        let pair_a = scored_pair("CHEBI:6801", "MONDO:0005015", "e0");
        let kg = build_knowledge_graph(
            &[pair_a],
            &HashMap::new(),
            &HashMap::new(),
            &Map::new(),
            &HashSet::new(),
        );
        let results = trapi::merge_results(bind_graphs(&graph, &kg));
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.node_bindings["n0"][0].id, "CHEBI:6801");
        assert_eq!(result.node_bindings["n1"][0].id, "MONDO:0005015");
        assert_eq!(
            result.analyses[0].edge_bindings["e0"][0].id,
            "CHEBI:6801_MONDO:0005015"
        );
        assert_eq!(result.analyses[0].resource_id, INFORES_COOCCURRENCE);
    }

    #[test]
    fn test_bind_skips_unreferenced_query_edges() {
        let graph = query_graph();
        let pair = scored_pair("CHEBI:6801", "MONDO:0005015", "e9");
        let kg = build_knowledge_graph(
            &[pair],
            &HashMap::new(),
            &HashMap::new(),
            &Map::new(),
            &HashSet::new(),
        );
        let results = bind_graphs(&graph, &kg);
        assert_eq!(results.len(), 1);
        assert!(results[0].analyses.is_empty());
    }

    #[test]
    fn test_all_concept_pairs_unordered_distinct() {
        let curies = vec![
            "B:1".to_string(),
            "A:1".to_string(),
            "C:1".to_string(),
        ];
        let pairs = all_concept_pairs(&curies);
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&("A:1".to_string(), "B:1".to_string())));
        assert!(pairs.contains(&("A:1".to_string(), "C:1".to_string())));
        assert!(pairs.contains(&("B:1".to_string(), "C:1".to_string())));
    }

    #[test]
    fn test_document_id_strips_hash_suffix() {
        assert_eq!(document_id("PMID123_abcdef"), "PMID123");
        assert_eq!(document_id("PMID123"), "PMID123");
    }
}
