use crate::foundation::error::{ColorizerError, ColorizerResult};

/// One object of a track, before sorting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackPoint {
    pub id: u32,
    pub time: u32,
    pub centroid: Option<[f32; 2]>,
    pub bounds: Option<[u16; 4]>,
}

/// Time-sorted objects belonging to one track id.
///
/// `ids` and `times` have equal length; `centroids` and `bounds` are either empty (no data) or
/// the same length as `ids`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Track {
    track_id: u32,
    ids: Vec<u32>,
    times: Vec<u32>,
    centroids: Vec<[f32; 2]>,
    bounds: Vec<[u16; 4]>,
}

impl Track {
    /// Build from parallel slices, sorting by time. Ties keep their input order.
    pub fn new(
        track_id: u32,
        ids: Vec<u32>,
        times: Vec<u32>,
        centroids: Vec<[f32; 2]>,
        bounds: Vec<[u16; 4]>,
    ) -> ColorizerResult<Self> {
        let n = ids.len();
        if times.len() != n {
            return Err(ColorizerError::validation(format!(
                "track {track_id}: {n} ids but {} times",
                times.len()
            )));
        }
        for (name, len) in [("centroids", centroids.len()), ("bounds", bounds.len())] {
            if len != 0 && len != n {
                return Err(ColorizerError::validation(format!(
                    "track {track_id}: {n} ids but {len} {name}"
                )));
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| times[i]);

        Ok(Self {
            track_id,
            ids: permute(&ids, &order),
            times: permute(&times, &order),
            centroids: permute(&centroids, &order),
            bounds: permute(&bounds, &order),
        })
    }

    /// Build from points gathered in id order. Centroids and bounds are kept only when every
    /// point has them.
    pub fn from_points(track_id: u32, mut points: Vec<TrackPoint>) -> Self {
        points.sort_by_key(|p| p.time);
        let centroids = points.iter().map(|p| p.centroid).collect::<Option<Vec<_>>>();
        let bounds = points.iter().map(|p| p.bounds).collect::<Option<Vec<_>>>();
        Self {
            track_id,
            ids: points.iter().map(|p| p.id).collect(),
            times: points.iter().map(|p| p.time).collect(),
            centroids: centroids.unwrap_or_default(),
            bounds: bounds.unwrap_or_default(),
        }
    }

    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn times(&self) -> &[u32] {
        &self.times
    }

    pub fn centroids(&self) -> &[[f32; 2]] {
        &self.centroids
    }

    pub fn bounds(&self) -> &[[u16; 4]] {
        &self.bounds
    }

    /// Number of timepoints.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn start_time(&self) -> Option<u32> {
        self.times.first().copied()
    }

    pub fn end_time(&self) -> Option<u32> {
        self.times.last().copied()
    }

    /// Id of the first object whose time is strictly after `t`.
    ///
    /// This is the *next* object after `t`, not the one at `t`; `None` once `t` reaches the
    /// last time.
    pub fn id_at_time(&self, t: i64) -> Option<u32> {
        let i = self.times.partition_point(|&time| i64::from(time) <= t);
        self.ids.get(i).copied()
    }
}

/// `v` reordered by `order`; empty stays empty.
fn permute<T: Copy>(v: &[T], order: &[usize]) -> Vec<T> {
    if v.is_empty() {
        return Vec::new();
    }
    order.iter().map(|&i| v[i]).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/data/track.rs"]
mod tests;
