use std::collections::BTreeMap;

use crate::foundation::error::{ColorizerError, ColorizerResult};

/// Top-level dataset description. All paths are relative to the dataset base URL.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetManifest {
    pub frames: Vec<String>,
    pub features: BTreeMap<String, String>, // display name -> data file
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub feature_metadata: BTreeMap<String, FeatureMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outliers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroids: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FeatureMetadata {
    #[serde(default)]
    pub units: String,
}

impl DatasetManifest {
    /// Parse and validate manifest JSON.
    pub fn parse(bytes: &[u8]) -> ColorizerResult<Self> {
        let manifest: Self = serde_json::from_slice(bytes)
            .map_err(|e| ColorizerError::manifest(format!("invalid manifest JSON: {e}")))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> ColorizerResult<()> {
        if let Some(i) = self.frames.iter().position(|f| f.trim().is_empty()) {
            return Err(ColorizerError::manifest(format!("frame {i} has an empty path")));
        }
        for (name, path) in &self.features {
            if path.trim().is_empty() {
                return Err(ColorizerError::manifest(format!(
                    "feature '{name}' has an empty path"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/manifest.rs"]
mod tests;
