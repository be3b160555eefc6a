/// Raw per-object columns as loaded, before validation.
#[derive(Clone, Debug, Default)]
pub struct ObjectColumns {
    pub track_ids: Option<Vec<u32>>,
    pub times: Option<Vec<u32>>,
    pub centroids: Option<Vec<u16>>, // x, y per object
    pub bounds: Option<Vec<u16>>,    // xmin, ymin, xmax, ymax per object
    pub outliers: Option<Vec<u8>>,
}

/// Parallel per-object arrays, indexed by object id.
///
/// Every column present has at least `count * stride` elements. Longer columns are kept as-is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectTable {
    count: usize,
    track_ids: Option<Vec<u32>>,
    times: Option<Vec<u32>>,
    centroids: Option<Vec<u16>>,
    bounds: Option<Vec<u16>>,
    outliers: Option<Vec<u8>>,
}

impl ObjectTable {
    /// Validate `columns` against the object count.
    ///
    /// The count comes from the track-id column, else the time column, else `fallback_count`.
    /// Columns too short for the count are dropped with a warning.
    pub fn from_columns(columns: ObjectColumns, fallback_count: Option<usize>) -> Self {
        let count = columns
            .track_ids
            .as_ref()
            .map(Vec::len)
            .or_else(|| columns.times.as_ref().map(Vec::len))
            .or(fallback_count)
            .unwrap_or(0);

        Self {
            count,
            track_ids: checked("tracks", columns.track_ids, 1, count),
            times: checked("times", columns.times, 1, count),
            centroids: checked("centroids", columns.centroids, 2, count),
            bounds: checked("bounds", columns.bounds, 4, count),
            outliers: checked("outliers", columns.outliers, 1, count),
        }
    }

    /// Number of objects in the dataset.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn track_id(&self, id: u32) -> Option<u32> {
        self.track_ids.as_ref()?.get(id as usize).copied()
    }

    pub fn time(&self, id: u32) -> Option<u32> {
        self.times.as_ref()?.get(id as usize).copied()
    }

    pub fn centroid(&self, id: u32) -> Option<[u16; 2]> {
        let i = id as usize * 2;
        let c = self.centroids.as_ref()?.get(i..i + 2)?;
        Some([c[0], c[1]])
    }

    pub fn bounds(&self, id: u32) -> Option<[u16; 4]> {
        let i = id as usize * 4;
        let b = self.bounds.as_ref()?.get(i..i + 4)?;
        Some([b[0], b[1], b[2], b[3]])
    }

    pub fn is_outlier(&self, id: u32) -> Option<bool> {
        self.outliers.as_ref()?.get(id as usize).map(|&v| v != 0)
    }

    pub fn track_ids(&self) -> Option<&[u32]> {
        self.track_ids.as_deref()
    }

    pub fn times(&self) -> Option<&[u32]> {
        self.times.as_deref()
    }

    pub fn centroids(&self) -> Option<&[u16]> {
        self.centroids.as_deref()
    }

    pub fn bounds_array(&self) -> Option<&[u16]> {
        self.bounds.as_deref()
    }

    pub fn outliers(&self) -> Option<&[u8]> {
        self.outliers.as_deref()
    }

    /// Object ids whose track id is `track_id`, in id order. Empty without a track column.
    pub fn ids_in_track(&self, track_id: u32) -> Vec<u32> {
        let Some(track_ids) = &self.track_ids else {
            return Vec::new();
        };
        track_ids
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t == track_id)
            .map(|(id, _)| id as u32)
            .collect()
    }
}

fn checked<T>(name: &str, column: Option<Vec<T>>, stride: usize, count: usize) -> Option<Vec<T>> {
    let column = column?;
    let needed = count.saturating_mul(stride);
    if column.len() < needed {
        tracing::warn!(
            column = name,
            len = column.len(),
            needed,
            "per-object array too short; ignoring it"
        );
        return None;
    }
    Some(column)
}

#[cfg(test)]
#[path = "../../tests/unit/data/object_table.rs"]
mod tests;
