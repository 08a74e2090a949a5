//! Co-occurrence aggregation: raw child-level document sets rolled up into
//! parent-pair buckets.

use std::collections::{HashMap, HashSet};

use crate::context::{Context, PairDocuments};
use crate::di::FromContext;
use crate::models::DocumentPart;
use crate::repositories::LookupRepository;

/// `(subject, object, part)` to the distinct documents supporting the pair.
/// Pair counts are set sizes.
pub type DocumentDictionary = HashMap<(String, String, DocumentPart), HashSet<String>>;

#[derive(FromContext, Clone)]
pub struct CooccurrenceAggregator {
    lookup: LookupRepository,
}

impl CooccurrenceAggregator {
    /// Fetches raw document sets for the full identifier universe of both
    /// rollup groups and rolls them up to the parent pairs. Store failures
    /// degrade to an empty dictionary.
    pub async fn aggregate(
        &self,
        subject_group: &HashMap<String, Vec<String>>,
        object_group: &HashMap<String, Vec<String>>,
    ) -> DocumentDictionary {
        let subjects = identifier_universe(subject_group);
        let objects = identifier_universe(object_group);
        let raw = match self.lookup.pair_documents(&subjects, &objects).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(%error, "pair document lookup failed");
                return HashMap::new();
            }
        };
        rollup(subject_group, object_group, &raw)
    }
}

/// Parents plus all descendants, de-duplicated.
fn identifier_universe(group: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut universe: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for (parent, descendants) in group {
        if seen.insert(parent.clone()) {
            universe.push(parent.clone());
        }
        for descendant in descendants {
            if seen.insert(descendant.clone()) {
                universe.push(descendant.clone());
            }
        }
    }
    universe
}

/// Pure rollup. For every (parentSubject, parentObject, part), unions the
/// document sets of the parent/parent, parent/child, child/parent and
/// child/child combinations. A combination key is consumed at most once per
/// parent pair, so aliased child pairs never inflate a bucket, while a child
/// shared by two parents still feeds both.
pub fn rollup(
    subject_group: &HashMap<String, Vec<String>>,
    object_group: &HashMap<String, Vec<String>>,
    raw: &PairDocuments,
) -> DocumentDictionary {
    let mut dictionary: DocumentDictionary = HashMap::new();

    for (parent_subject, subject_children) in subject_group {
        for (parent_object, object_children) in object_group {
            let mut completed: HashSet<(String, String, DocumentPart)> = HashSet::new();
            let mut combinations: Vec<(&String, &String)> =
                vec![(parent_subject, parent_object)];
            for child in object_children {
                combinations.push((parent_subject, child));
            }
            for child in subject_children {
                combinations.push((child, parent_object));
            }
            for subject_child in subject_children {
                for object_child in object_children {
                    combinations.push((subject_child, object_child));
                }
            }

            for part in DocumentPart::ALL {
                for (subject, object) in &combinations {
                    let key = ((*subject).clone(), (*object).clone(), part);
                    if !completed.insert(key.clone()) {
                        continue;
                    }
                    if let Some(documents) = raw.get(&key) {
                        dictionary
                            .entry((parent_subject.clone(), parent_object.clone(), part))
                            .or_default()
                            .extend(documents.iter().cloned());
                    }
                }
            }
        }
    }

    dictionary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(entries: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(parent, children)| {
                (
                    parent.to_string(),
                    children.iter().map(|c| c.to_string()).collect(),
                )
            })
            .collect()
    }

    fn raw(entries: &[(&str, &str, DocumentPart, &[&str])]) -> PairDocuments {
        entries
            .iter()
            .map(|(s, o, part, docs)| {
                (
                    (s.to_string(), o.to_string(), *part),
                    docs.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_child_documents_union_into_parent_bucket() {
        let subjects = group(&[("A", &["a1", "a2"])]);
        let objects = group(&[("B", &["b1"])]);
        let raw = raw(&[
            ("A", "B", DocumentPart::Abstract, &["d1"]),
            ("a1", "B", DocumentPart::Abstract, &["d2"]),
            ("A", "b1", DocumentPart::Abstract, &["d2", "d3"]),
            ("a2", "b1", DocumentPart::Abstract, &["d4"]),
        ]);
        let dictionary = rollup(&subjects, &objects, &raw);
        let bucket = &dictionary[&("A".to_string(), "B".to_string(), DocumentPart::Abstract)];
        assert_eq!(bucket.len(), 4);
        assert!(bucket.contains("d1"));
        assert!(bucket.contains("d4"));
    }

    #[test]
    fn test_shared_child_feeds_every_parent_pair() {
        // c descends from both parents; its documents count toward each
        // parent-pair bucket, once per bucket.
        let subjects = group(&[("A1", &["c"]), ("A2", &["c"])]);
        let objects = group(&[("B", &[])]);
        let raw = raw(&[("c", "B", DocumentPart::Sentence, &["d1", "d2"])]);
        let dictionary = rollup(&subjects, &objects, &raw);
        assert_eq!(dictionary.len(), 2);
        assert_eq!(
            dictionary[&("A1".to_string(), "B".to_string(), DocumentPart::Sentence)].len(),
            2
        );
        assert_eq!(
            dictionary[&("A2".to_string(), "B".to_string(), DocumentPart::Sentence)].len(),
            2
        );
    }

    #[test]
    fn test_aliased_combination_consumed_once_per_pair() {
        // the same child appears twice under one parent; its raw documents
        // must not be double-read into that parent's bucket
        let subjects = group(&[("A", &["c", "c"])]);
        let objects = group(&[("B", &[])]);
        let raw = raw(&[("c", "B", DocumentPart::Abstract, &["d1"])]);
        let dictionary = rollup(&subjects, &objects, &raw);
        assert_eq!(
            dictionary[&("A".to_string(), "B".to_string(), DocumentPart::Abstract)].len(),
            1
        );
    }

    #[test]
    fn test_duplicate_documents_deduplicated() {
        let subjects = group(&[("A", &["a1"])]);
        let objects = group(&[("B", &[])]);
        let raw = raw(&[
            ("A", "B", DocumentPart::Title, &["d1"]),
            ("a1", "B", DocumentPart::Title, &["d1"]),
        ]);
        let dictionary = rollup(&subjects, &objects, &raw);
        let bucket = &dictionary[&("A".to_string(), "B".to_string(), DocumentPart::Title)];
        assert_eq!(bucket.len(), 1);
    }

    #[test]
    fn test_parts_stay_separate() {
        let subjects = group(&[("A", &[])]);
        let objects = group(&[("B", &[])]);
        let raw = raw(&[
            ("A", "B", DocumentPart::Abstract, &["d1"]),
            ("A", "B", DocumentPart::Article, &["d2", "d3"]),
        ]);
        let dictionary = rollup(&subjects, &objects, &raw);
        assert_eq!(
            dictionary[&("A".to_string(), "B".to_string(), DocumentPart::Abstract)].len(),
            1
        );
        assert_eq!(
            dictionary[&("A".to_string(), "B".to_string(), DocumentPart::Article)].len(),
            2
        );
    }
}
