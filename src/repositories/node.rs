//! Corpus-level counts and meta-knowledge-graph metadata.

use crate::context::Context;
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{DocumentPart, EdgeMetadata, NodeMetadata};

use super::store::Store;

#[derive(FromContext, Clone)]
pub struct NodeRepository {
    store: Store,
}

impl NodeRepository {
    /// Total number of distinct concepts in the corpus.
    pub async fn total_concept_count(&self) -> Result<i64, AppError> {
        let client = self.store.client().await?;
        let row = client.query_one("SELECT COUNT(1) FROM nodes", &[]).await?;
        Ok(row.get(0))
    }

    /// Number of documents processed for the given part. Zero when the part
    /// has no recorded count.
    pub async fn document_count(&self, part: DocumentPart) -> Result<i64, AppError> {
        let client = self.store.client().await?;
        let row = client
            .query_opt(
                "SELECT record_count FROM document_counts WHERE part = $1",
                &[&part.as_str()],
            )
            .await?;
        Ok(row.map(|r| r.get::<_, i32>(0) as i64).unwrap_or(0))
    }

    /// Category/prefix pairs describing the nodes this corpus can produce.
    pub async fn node_metadata(&self) -> Result<Vec<NodeMetadata>, AppError> {
        let client = self.store.client().await?;
        let rows = client
            .query("SELECT id_prefix, category FROM node_metadata", &[])
            .await?;
        Ok(rows
            .iter()
            .map(|row| NodeMetadata {
                id_prefix: row.get(0),
                category: row.get(1),
            })
            .collect())
    }

    /// Subject/object/predicate triples this corpus can produce edges for.
    pub async fn edge_metadata(&self) -> Result<Vec<EdgeMetadata>, AppError> {
        let client = self.store.client().await?;
        let rows = client
            .query("SELECT subject, object, predicate FROM edge_metadata", &[])
            .await?;
        Ok(rows
            .iter()
            .map(|row| EdgeMetadata {
                subject: row.get(0),
                object: row.get(1),
                predicate: row.get(2),
            })
            .collect())
    }
}
