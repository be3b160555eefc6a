use crate::{
    config::DatasetOpts,
    data::dataset::Dataset,
    foundation::error::{ColorizerError, ColorizerResult},
    io::fetch::{FetchClient, format_path, is_json, is_url, parent_url, resolve_url},
};

pub const DEFAULT_COLLECTION_FILENAME: &str = "collection.json";

/// One named dataset. `path` is resolved to a full dataset URL once loaded.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CollectionEntry {
    pub name: String,
    pub path: String,
}

/// Named datasets listed by a `collection.json` file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collection {
    url: Option<String>,
    entries: Vec<CollectionEntry>,
}

impl Collection {
    /// Parse collection JSON fetched from `url`. Relative dataset paths resolve against the
    /// collection's directory.
    pub fn parse(bytes: &[u8], url: &str) -> ColorizerResult<Self> {
        let raw: Vec<CollectionEntry> = serde_json::from_slice(bytes)
            .map_err(|e| ColorizerError::decode(format!("invalid collection '{url}': {e}")))?;
        let dir = parent_url(url);
        let entries = raw
            .into_iter()
            .map(|entry| {
                let path = if is_url(&entry.path) {
                    format_path(&entry.path)
                } else {
                    resolve_url(&dir, &entry.path)
                };
                CollectionEntry {
                    name: entry.name,
                    path,
                }
            })
            .collect();
        Ok(Self {
            url: Some(format_path(url)),
            entries,
        })
    }

    pub async fn load(url: &str, client: &FetchClient) -> ColorizerResult<Self> {
        let bytes = client.get(url).await?;
        let collection = Self::parse(&bytes, url)?;
        tracing::debug!(url, datasets = collection.len(), "loaded collection");
        Ok(collection)
    }

    /// A `.json` URL is loaded as a collection; anything else is a single dataset named after
    /// its URL.
    pub async fn from_url(url: &str, client: &FetchClient) -> ColorizerResult<Self> {
        if is_json(url) {
            Self::load(url, client).await
        } else {
            Ok(Self::single(url))
        }
    }

    pub fn single(dataset_url: &str) -> Self {
        let path = format_path(dataset_url);
        Self {
            url: None,
            entries: vec![CollectionEntry {
                name: path.clone(),
                path,
            }],
        }
    }

    /// URL of the collection file, if this came from one.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dataset URL for `name`; the first entry wins when names repeat.
    pub fn dataset_url(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.path.as_str())
    }

    /// Unopened dataset for `name`.
    pub fn dataset(&self, name: &str, opts: DatasetOpts) -> ColorizerResult<Dataset> {
        let url = self
            .dataset_url(name)
            .ok_or_else(|| ColorizerError::validation(format!("no dataset named '{name}'")))?;
        Ok(Dataset::with_opts(url, opts))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/collection.rs"]
mod tests;
