//! Domain models for co-occurrence statistics.

mod metadata;
mod metrics;
mod pair;
mod part;

pub use metadata::{EdgeMetadata, NodeMetadata, UniverseCounts};
pub use metrics::Metrics;
pub use pair::ConceptPair;
pub use part::DocumentPart;
