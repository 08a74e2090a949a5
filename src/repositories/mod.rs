//! Store access layer: connection pooling and the SQL behind concept,
//! hierarchy and co-occurrence lookups.

mod lookup;
mod node;
mod store;

pub use lookup::LookupRepository;
pub use node::NodeRepository;
pub use store::{Store, MAX_LIST_SIZE};
