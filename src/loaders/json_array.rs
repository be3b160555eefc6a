use futures_util::{FutureExt as _, future::BoxFuture};
use serde::Deserialize;

use crate::{
    foundation::{
        core::{FeatureArray, FeatureDataType, finite_extrema},
        error::{ColorizerError, ColorizerResult},
    },
    io::fetch::FetchClient,
    loaders::{ArrayLoader, ArraySource},
};

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonScalar {
    Number(f64),
    Bool(bool),
}

impl JsonScalar {
    fn as_f64(&self) -> f64 {
        match *self {
            Self::Number(v) => v,
            Self::Bool(b) => f64::from(u8::from(b)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonArrayFile {
    Bare(Vec<Option<JsonScalar>>),
    Wrapped {
        data: Vec<Option<JsonScalar>>,
        #[serde(default)]
        min: Option<JsonScalar>,
        #[serde(default)]
        max: Option<JsonScalar>,
    },
}

/// Array decoded from JSON. `null` entries are kept as NaN ("no data").
#[derive(Clone, Debug, PartialEq)]
pub struct JsonArraySource {
    values: Vec<f64>,
    min: f32,
    max: f32,
}

impl JsonArraySource {
    /// Parse either a bare array or `{ "data": [...], "min": .., "max": .. }`.
    ///
    /// Extrema given by the file are used as-is; missing ones are computed over finite values.
    pub fn parse(bytes: &[u8]) -> ColorizerResult<Self> {
        let file: JsonArrayFile = serde_json::from_slice(bytes)
            .map_err(|e| ColorizerError::decode(format!("invalid JSON array file: {e}")))?;
        let (data, min, max) = match file {
            JsonArrayFile::Wrapped { data, min, max } => (data, min, max),
            JsonArrayFile::Bare(data) => (data, None, None),
        };

        let values: Vec<f64> = data
            .iter()
            .map(|v| v.as_ref().map_or(f64::NAN, JsonScalar::as_f64))
            .collect();
        let computed = finite_extrema(values.iter().copied()).unwrap_or((0.0, 0.0));

        Ok(Self {
            min: min.map_or(computed.0, |m| m.as_f64()) as f32,
            max: max.map_or(computed.1, |m| m.as_f64()) as f32,
            values,
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl ArraySource for JsonArraySource {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn buffer(&self, ty: FeatureDataType) -> FeatureArray {
        FeatureArray::from_f64_values(ty, &self.values)
    }

    fn min(&self) -> f32 {
        self.min
    }

    fn max(&self) -> f32 {
        self.max
    }
}

/// Loads JSON-encoded numeric arrays.
#[derive(Clone, Debug)]
pub struct JsonArrayLoader {
    client: FetchClient,
}

impl JsonArrayLoader {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

impl ArrayLoader for JsonArrayLoader {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ColorizerResult<Box<dyn ArraySource>>> {
        async move {
            let bytes = self.client.get(url).await?;
            let source = JsonArraySource::parse(&bytes)?;
            tracing::debug!(url, len = source.len(), "loaded json array");
            Ok(Box::new(source) as Box<dyn ArraySource>)
        }
        .boxed()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/loaders/json_array.rs"]
mod tests;
