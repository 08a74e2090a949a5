//! Concept/category resolution.
//!
//! Query nodes name concepts in whatever identifier namespace the caller
//! prefers; the corpus indexes text-mined CURIEs. The resolver translates
//! between the two, or expands a category into every corpus CURIE tagged
//! with it.

use crate::context::Context;
use crate::di::FromContext;
use crate::error::AppError;
use crate::repositories::LookupRepository;
use crate::trapi::QueryNode;

use super::NodeNormalizer;

#[derive(FromContext, Clone)]
pub struct ConceptResolver {
    lookup: LookupRepository,
    normalizer: NodeNormalizer,
}

impl ConceptResolver {
    /// Flat corpus identifier list for a query node. Identifiers take
    /// precedence over categories; only the first (most specific) category
    /// is used. Store or network failures degrade to an empty list.
    pub async fn resolve(&self, node: &QueryNode) -> Vec<String> {
        if !node.ids.is_empty() {
            return match self.text_mined_curies(&node.ids).await {
                Ok(curies) => curies,
                Err(error) => {
                    tracing::warn!(%error, "identifier resolution failed");
                    Vec::new()
                }
            };
        }
        if let Some(category) = node.categories.first() {
            return match self.lookup.curies_for_category(category).await {
                Ok(curies) => curies,
                Err(error) => {
                    tracing::warn!(%error, category, "category resolution failed");
                    Vec::new()
                }
            };
        }
        Vec::new()
    }

    /// Translates query CURIEs into corpus CURIEs: synonym table first, then
    /// the normalizer's equivalent identifiers probed against the corpus.
    /// Normalizer hits persist into the synonym table; a CURIE that matches
    /// nothing is kept verbatim.
    async fn text_mined_curies(&self, query_curies: &[String]) -> Result<Vec<String>, AppError> {
        let synonym_map = self.lookup.synonym_map(query_curies).await?;
        let mut resolved = Vec::new();
        let mut unmatched = Vec::new();
        for curie in query_curies {
            match synonym_map.get(curie) {
                Some(synonyms) => resolved.extend(synonyms.iter().cloned()),
                None => unmatched.push(curie.clone()),
            }
        }

        if !unmatched.is_empty() {
            let nodes = self.normalizer.normalized_nodes(&unmatched).await;
            for curie in &unmatched {
                let equivalents = NodeNormalizer::synonyms(&nodes, curie);
                let known = if equivalents.is_empty() {
                    Default::default()
                } else {
                    self.lookup.known_curies(&equivalents).await?
                };
                let hits: Vec<String> = equivalents
                    .into_iter()
                    .filter(|e| known.contains(e))
                    .collect();
                if hits.is_empty() {
                    resolved.push(curie.clone());
                } else {
                    let pairs: Vec<(String, String)> = hits
                        .iter()
                        .map(|hit| (hit.clone(), curie.clone()))
                        .collect();
                    if let Err(error) = self.lookup.record_synonyms(&pairs).await {
                        tracing::warn!(%error, curie, "failed to persist synonyms");
                    }
                    resolved.extend(hits);
                }
            }
        }

        let mut seen = std::collections::HashSet::new();
        resolved.retain(|curie| seen.insert(curie.clone()));
        Ok(resolved)
    }
}
