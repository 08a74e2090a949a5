//! Hierarchy expansion: seed identifiers to their transitive descendants.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::context::Context;
use crate::di::FromContext;
use crate::error::AppError;
use crate::repositories::LookupRepository;

/// Source of direct parent/child edges. The lookup repository implements
/// this against the store; tests drive the expansion from an in-memory map.
#[async_trait]
pub trait ChildSource {
    async fn direct_children(
        &self,
        curies: &[String],
    ) -> Result<HashMap<String, Vec<String>>, AppError>;
}

#[async_trait]
impl ChildSource for LookupRepository {
    async fn direct_children(
        &self,
        curies: &[String],
    ) -> Result<HashMap<String, Vec<String>>, AppError> {
        LookupRepository::direct_children(self, curies).await
    }
}

#[derive(FromContext, Clone)]
pub struct HierarchyExpander {
    lookup: LookupRepository,
}

impl HierarchyExpander {
    /// Maps each seed to its complete de-duplicated descendant set. Every
    /// seed appears in the output, childless ones with an empty list.
    pub async fn expand(
        &self,
        seeds: &[String],
    ) -> Result<HashMap<String, Vec<String>>, AppError> {
        expand_from(&self.lookup, seeds).await
    }
}

/// Two-phase expansion. The first phase fetches the direct children of each
/// frontier batch until no unseen identifier remains, building an in-memory
/// adjacency of everything reachable; the second walks that adjacency from
/// each seed, so a node fetched through one seed still contributes its whole
/// subtree to any other seed whose chain reaches it later. Visited sets
/// terminate both phases on cyclic hierarchies.
pub async fn expand_from<S: ChildSource + Sync>(
    source: &S,
    seeds: &[String],
) -> Result<HashMap<String, Vec<String>>, AppError> {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut fetched: HashSet<String> = seeds.iter().cloned().collect();
    let mut frontier: Vec<String> = fetched.iter().cloned().collect();

    while !frontier.is_empty() {
        let children_map = source.direct_children(&frontier).await?;
        let mut next = Vec::new();
        for (parent, children) in children_map {
            for child in &children {
                if fetched.insert(child.clone()) {
                    next.push(child.clone());
                }
            }
            adjacency.insert(parent, children);
        }
        frontier = next;
    }

    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for seed in seeds {
        let mut visited: HashSet<String> = HashSet::from([seed.clone()]);
        let mut stack: Vec<&String> = vec![seed];
        while let Some(node) = stack.pop() {
            let Some(children) = adjacency.get(node) else {
                continue;
            };
            for child in children {
                if visited.insert(child.clone()) {
                    stack.push(child);
                }
            }
        }
        visited.remove(seed);
        let mut descendants: Vec<String> = visited.into_iter().collect();
        descendants.sort();
        groups.insert(seed.clone(), descendants);
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapSource(HashMap<String, Vec<String>>);

    #[async_trait]
    impl ChildSource for MapSource {
        async fn direct_children(
            &self,
            curies: &[String],
        ) -> Result<HashMap<String, Vec<String>>, AppError> {
            Ok(curies
                .iter()
                .filter_map(|c| self.0.get(c).map(|v| (c.clone(), v.clone())))
                .collect())
        }
    }

    fn source(edges: &[(&str, &[&str])]) -> MapSource {
        MapSource(
            edges
                .iter()
                .map(|(parent, children)| {
                    (
                        parent.to_string(),
                        children.iter().map(|c| c.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    fn seeds(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_transitive_descendants_collected() {
        let source = source(&[("a", &["b", "c"]), ("b", &["d"]), ("d", &["e"])]);
        let groups = expand_from(&source, &seeds(&["a"])).await.unwrap();
        assert_eq!(groups["a"], vec!["b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_childless_seed_maps_to_empty() {
        let source = source(&[("a", &["b"])]);
        let groups = expand_from(&source, &seeds(&["a", "z"])).await.unwrap();
        assert_eq!(groups["a"], vec!["b"]);
        assert!(groups["z"].is_empty());
    }

    #[tokio::test]
    async fn test_diamond_deduplicates() {
        let source = source(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &["d"])]);
        let groups = expand_from(&source, &seeds(&["a"])).await.unwrap();
        assert_eq!(groups["a"], vec!["b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let source = source(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let groups = expand_from(&source, &seeds(&["a"])).await.unwrap();
        assert_eq!(groups["a"], vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_shared_descendant_reaches_both_seeds() {
        let source = source(&[("a", &["x"]), ("b", &["x"]), ("x", &["y"])]);
        let groups = expand_from(&source, &seeds(&["a", "b"])).await.unwrap();
        assert_eq!(groups["a"], vec!["x", "y"]);
        assert_eq!(groups["b"], vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_later_seed_descends_through_earlier_subtree() {
        // b reaches x only after x was already expanded under a; b must still
        // pick up x's own descendants.
        let source = source(&[("a", &["x"]), ("x", &["y"]), ("b", &["m"]), ("m", &["n"]), ("n", &["x"])]);
        let groups = expand_from(&source, &seeds(&["a", "b"])).await.unwrap();
        assert_eq!(groups["a"], vec!["x", "y"]);
        assert_eq!(groups["b"], vec!["m", "n", "x", "y"]);
    }

    #[tokio::test]
    async fn test_reexpanding_with_descendants_is_stable() {
        let source = source(&[("a", &["b", "c"]), ("b", &["d"]), ("d", &["e"])]);
        let first = expand_from(&source, &seeds(&["a"])).await.unwrap();
        let mut widened = seeds(&["a"]);
        widened.extend(first["a"].iter().cloned());
        let second = expand_from(&source, &widened).await.unwrap();
        assert_eq!(second["a"], first["a"]);
        assert_eq!(second["b"], vec!["d", "e"]);
    }
}
