//! Service layer: identifier resolution, hierarchy expansion, co-occurrence
//! aggregation and the request orchestrator.

mod aggregator;
mod biolink;
mod hierarchy;
mod normalizer;
mod query;
mod resolver;

pub use aggregator::{rollup, CooccurrenceAggregator, DocumentDictionary};
pub use biolink::BiolinkClient;
pub use hierarchy::{ChildSource, HierarchyExpander};
pub use normalizer::NodeNormalizer;
pub use query::CooccurrenceService;
pub use resolver::ConceptResolver;
