//! Concept, synonym, hierarchy and co-occurrence lookups.
//!
//! Identifier lists can be very large (category expansion especially), so
//! every list-valued query is chunked at [`MAX_LIST_SIZE`] and the results
//! concatenated. The expensive lookups read through the shared caches.

use std::collections::{HashMap, HashSet};

use crate::context::{Caches, Context, PairDocuments};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::DocumentPart;

use super::store::{Store, MAX_LIST_SIZE};

/// Repository for the co-occurrence corpus tables.
#[derive(FromContext, Clone)]
pub struct LookupRepository {
    store: Store,
    caches: Caches,
}

impl LookupRepository {
    /// Every corpus CURIE tagged with the given biolink category.
    pub async fn curies_for_category(&self, category: &str) -> Result<Vec<String>, AppError> {
        if let Some(curies) = self.caches.category_curies.get(&category.to_string()).await {
            return Ok(curies);
        }
        let client = self.store.client().await?;
        let rows = client
            .query(
                "SELECT n.curie \
                 FROM node_category nc INNER JOIN nodes n ON nc.node_id = n.id \
                 WHERE nc.category = $1",
                &[&category],
            )
            .await?;
        let curies: Vec<String> = rows.iter().map(|row| row.get(0)).collect();
        tracing::debug!(category, count = curies.len(), "category expansion");
        self.caches
            .category_curies
            .insert(category.to_string(), curies.clone())
            .await;
        Ok(curies)
    }

    /// Known text-mined synonyms for each query CURIE.
    pub async fn synonym_map(
        &self,
        curies: &[String],
    ) -> Result<HashMap<String, Vec<String>>, AppError> {
        let mut map = HashMap::new();
        let mut misses = Vec::new();
        for curie in curies {
            match self.caches.synonyms.get(curie).await {
                Some(synonyms) => {
                    map.insert(curie.clone(), synonyms);
                }
                None => misses.push(curie.clone()),
            }
        }
        if misses.is_empty() {
            return Ok(map);
        }
        let client = self.store.client().await?;
        for chunk in misses.chunks(MAX_LIST_SIZE) {
            let rows = client
                .query(
                    "SELECT tm_curie, query_curie FROM synonyms WHERE query_curie = ANY($1)",
                    &[&chunk],
                )
                .await?;
            for row in rows {
                let tm_curie: String = row.get(0);
                let query_curie: String = row.get(1);
                map.entry(query_curie).or_insert_with(Vec::new).push(tm_curie);
            }
        }
        for curie in &misses {
            if let Some(synonyms) = map.get(curie) {
                self.caches
                    .synonyms
                    .insert(curie.clone(), synonyms.clone())
                    .await;
            }
        }
        Ok(map)
    }

    /// Persists newly discovered `(text-mined CURIE, query CURIE)` synonym
    /// pairs for future requests.
    pub async fn record_synonyms(&self, pairs: &[(String, String)]) -> Result<(), AppError> {
        let client = self.store.client().await?;
        for (tm_curie, query_curie) in pairs {
            client
                .execute(
                    "INSERT INTO synonyms (tm_curie, query_curie) VALUES ($1, $2) \
                     ON CONFLICT DO NOTHING",
                    &[tm_curie, query_curie],
                )
                .await?;
            self.caches
                .synonyms
                .insert(query_curie.clone(), vec![tm_curie.clone()])
                .await;
        }
        Ok(())
    }

    /// Which of the given CURIEs exist in the corpus node table.
    pub async fn known_curies(&self, curies: &[String]) -> Result<HashSet<String>, AppError> {
        let client = self.store.client().await?;
        let mut known = HashSet::new();
        for chunk in curies.chunks(MAX_LIST_SIZE) {
            let rows = client
                .query("SELECT curie FROM nodes WHERE curie = ANY($1)", &[&chunk])
                .await?;
            known.extend(rows.iter().map(|row| row.get::<_, String>(0)));
        }
        Ok(known)
    }

    /// Corpus labels for the given CURIEs. CURIEs without a label are absent
    /// from the returned map.
    pub async fn labels(&self, curies: &[String]) -> Result<HashMap<String, String>, AppError> {
        let mut map = HashMap::new();
        let mut misses = Vec::new();
        for curie in curies {
            match self.caches.labels.get(curie).await {
                Some(label) => {
                    map.insert(curie.clone(), label);
                }
                None => misses.push(curie.clone()),
            }
        }
        if misses.is_empty() {
            return Ok(map);
        }
        let client = self.store.client().await?;
        for chunk in misses.chunks(MAX_LIST_SIZE) {
            let rows = client
                .query(
                    "SELECT curie, label FROM nodes WHERE curie = ANY($1)",
                    &[&chunk],
                )
                .await?;
            for row in rows {
                let curie: String = row.get(0);
                if let Some(label) = row.get::<_, Option<String>>(1) {
                    self.caches.labels.insert(curie.clone(), label.clone()).await;
                    map.insert(curie, label);
                }
            }
        }
        Ok(map)
    }

    /// Corpus categories for the given CURIEs.
    pub async fn categories(
        &self,
        curies: &[String],
    ) -> Result<HashMap<String, Vec<String>>, AppError> {
        let mut map = HashMap::new();
        let mut misses = Vec::new();
        for curie in curies {
            match self.caches.categories.get(curie).await {
                Some(categories) => {
                    map.insert(curie.clone(), categories);
                }
                None => misses.push(curie.clone()),
            }
        }
        if misses.is_empty() {
            return Ok(map);
        }
        let client = self.store.client().await?;
        for chunk in misses.chunks(MAX_LIST_SIZE) {
            let rows = client
                .query(
                    "SELECT n.curie, nc.category \
                     FROM node_category nc INNER JOIN nodes n ON nc.node_id = n.id \
                     WHERE n.curie = ANY($1)",
                    &[&chunk],
                )
                .await?;
            for row in rows {
                let curie: String = row.get(0);
                let category: String = row.get(1);
                map.entry(curie).or_insert_with(Vec::new).push(category);
            }
        }
        for curie in &misses {
            if let Some(categories) = map.get(curie) {
                self.caches
                    .categories
                    .insert(curie.clone(), categories.clone())
                    .await;
            }
        }
        Ok(map)
    }

    /// Single-concept occurrence counts per document part.
    pub async fn single_counts(
        &self,
        curies: &[String],
    ) -> Result<HashMap<String, HashMap<DocumentPart, i64>>, AppError> {
        self.counts_query("concept_counts", "single_count", curies)
            .await
    }

    /// Hierarchy-inclusive occurrence counts per document part: the number
    /// of documents mentioning the concept or any of its descendants.
    pub async fn hierarchical_counts(
        &self,
        curies: &[String],
    ) -> Result<HashMap<String, HashMap<DocumentPart, i64>>, AppError> {
        self.counts_query("hierarchical_concept_counts", "document_count", curies)
            .await
    }

    async fn counts_query(
        &self,
        table: &str,
        column: &str,
        curies: &[String],
    ) -> Result<HashMap<String, HashMap<DocumentPart, i64>>, AppError> {
        let client = self.store.client().await?;
        let sql = format!(
            "SELECT curie, document_part, {column} FROM {table} WHERE curie = ANY($1)"
        );
        let mut counts: HashMap<String, HashMap<DocumentPart, i64>> = HashMap::new();
        for chunk in curies.chunks(MAX_LIST_SIZE) {
            let rows = client.query(&sql, &[&chunk]).await?;
            for row in rows {
                let curie: String = row.get(0);
                let part: String = row.get(1);
                let count: i32 = row.get(2);
                let Ok(part) = part.parse::<DocumentPart>() else {
                    continue;
                };
                counts.entry(curie).or_default().insert(part, count as i64);
            }
        }
        Ok(counts)
    }

    /// Direct children of each of the given CURIEs in the concept hierarchy.
    pub async fn direct_children(
        &self,
        curies: &[String],
    ) -> Result<HashMap<String, Vec<String>>, AppError> {
        let client = self.store.client().await?;
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for chunk in curies.chunks(MAX_LIST_SIZE) {
            let rows = client
                .query(
                    "SELECT parent_curie, child_curie FROM concept_hierarchy \
                     WHERE parent_curie = ANY($1)",
                    &[&chunk],
                )
                .await?;
            for row in rows {
                let parent: String = row.get(0);
                let child: String = row.get(1);
                children.entry(parent).or_default().push(child);
            }
        }
        Ok(children)
    }

    /// Raw per-part co-occurrence document sets for every (subject, object)
    /// combination across the two identifier lists.
    ///
    /// The pair tables are not symmetric, so each sublist pair is queried in
    /// both orientations and reversed hits are recorded under the
    /// subject-first key.
    pub async fn pair_documents(
        &self,
        subjects: &[String],
        objects: &[String],
    ) -> Result<PairDocuments, AppError> {
        if subjects.is_empty() || objects.is_empty() {
            return Ok(HashMap::new());
        }
        let cache_key = (subjects.to_vec(), objects.to_vec());
        if let Some(documents) = self.caches.pair_documents.get(&cache_key).await {
            return Ok(documents);
        }

        let client = self.store.client().await?;
        let mut documents: PairDocuments = HashMap::new();
        for part in DocumentPart::ALL {
            let sql = format!(
                "SELECT concept1_curie, concept2_curie, document_hash \
                 FROM {} \
                 WHERE concept1_curie = ANY($1) AND concept2_curie = ANY($2) \
                 GROUP BY concept1_curie, concept2_curie, document_hash",
                part.pair_table()
            );
            for subject_chunk in subjects.chunks(MAX_LIST_SIZE) {
                for object_chunk in objects.chunks(MAX_LIST_SIZE) {
                    let rows = client
                        .query(&sql, &[&subject_chunk, &object_chunk])
                        .await?;
                    for row in rows {
                        let subject: String = row.get(0);
                        let object: String = row.get(1);
                        let document: String = row.get(2);
                        documents
                            .entry((subject, object, part))
                            .or_default()
                            .push(document);
                    }
                    let reversed = client
                        .query(&sql, &[&object_chunk, &subject_chunk])
                        .await?;
                    for row in reversed {
                        let object: String = row.get(0);
                        let subject: String = row.get(1);
                        let document: String = row.get(2);
                        documents
                            .entry((subject, object, part))
                            .or_default()
                            .push(document);
                    }
                }
            }
        }
        tracing::debug!(
            subjects = subjects.len(),
            objects = objects.len(),
            keys = documents.len(),
            "pair document lookup"
        );
        self.caches
            .pair_documents
            .insert(cache_key, documents.clone())
            .await;
        Ok(documents)
    }

    /// Distinct concepts observed per document part.
    pub async fn concept_counts_per_part(
        &self,
    ) -> Result<HashMap<DocumentPart, i64>, AppError> {
        let client = self.store.client().await?;
        let rows = client
            .query(
                "SELECT document_part, COUNT(DISTINCT curie) \
                 FROM concept_counts GROUP BY document_part",
                &[],
            )
            .await?;
        let mut counts = HashMap::new();
        for row in rows {
            let part: String = row.get(0);
            let count: i64 = row.get(1);
            if let Ok(part) = part.parse::<DocumentPart>() {
                counts.insert(part, count);
            }
        }
        Ok(counts)
    }
}
