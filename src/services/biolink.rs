//! Biolink model client.
//!
//! The model is fetched once per refresh to learn which classes are mixins,
//! abstract, or deprecated; those never appear as knowledge node categories.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::context::{Context, HttpClient};
use crate::di::FromContext;

#[derive(FromContext, Clone)]
pub struct BiolinkClient {
    http: HttpClient,
    config: Arc<Config>,
}

impl BiolinkClient {
    /// Lowercased CURIE forms of every class marked mixin, abstract or
    /// deprecated. A fetch failure degrades to an empty set.
    pub async fn invalid_classes(&self) -> HashSet<String> {
        match self.fetch_model().await {
            Ok(model) => Self::extract_invalid_classes(&model),
            Err(error) => {
                tracing::warn!(%error, url = %self.config.biolink.url, "biolink model fetch failed");
                HashSet::new()
            }
        }
    }

    async fn fetch_model(&self) -> Result<Value, reqwest::Error> {
        self.http
            .0
            .get(&self.config.biolink.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// The model never carries `mixin: false` and friends, so the presence
    /// of the key is the signal. Class names become `biolink:` CURIEs with
    /// spaces removed.
    pub fn extract_invalid_classes(model: &Value) -> HashSet<String> {
        let Some(classes) = model.get("classes").and_then(Value::as_object) else {
            return HashSet::new();
        };
        classes
            .iter()
            .filter(|(_, definition)| {
                ["mixin", "abstract", "deprecated"]
                    .iter()
                    .any(|key| definition.get(*key).is_some_and(|v| !v.is_null()))
            })
            .map(|(name, _)| format!("biolink:{}", name.replace(' ', "")).to_lowercase())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flagged_classes_become_lowercased_curies() {
        let model = json!({
            "classes": {
                "gene or gene product": {"mixin": true},
                "named thing": {"abstract": true},
                "disease": {"is_a": "disease or phenotypic feature"},
                "sequence variant": {"deprecated": "v3"}
            }
        });
        let invalid = BiolinkClient::extract_invalid_classes(&model);
        assert!(invalid.contains("biolink:geneorgeneproduct"));
        assert!(invalid.contains("biolink:namedthing"));
        assert!(invalid.contains("biolink:sequencevariant"));
        assert!(!invalid.contains("biolink:disease"));
    }

    #[test]
    fn test_missing_classes_section_yields_empty_set() {
        assert!(BiolinkClient::extract_invalid_classes(&json!({})).is_empty());
    }
}
