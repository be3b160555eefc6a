use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use futures_util::{
    FutureExt as _,
    future::{BoxFuture, Shared, join_all},
};
use parking_lot::Mutex;

use crate::{
    config::DatasetOpts,
    data::{
        frame_cache::FrameCache,
        manifest::DatasetManifest,
        object_table::{ObjectColumns, ObjectTable},
        track::{Track, TrackPoint},
    },
    foundation::{
        core::{FeatureDataType, Resolution},
        error::{ColorizerError, ColorizerResult},
        texture::{Texture, TextureLedger},
    },
    io::fetch::{FetchClient, format_path, is_url, resolve_url},
    loaders::{
        ArrayLoader, ArraySource, FrameLoader, frame::Frame, frame::ImageFrameLoader,
        json_array::JsonArrayLoader,
    },
};

/// One loaded feature: values per object id, their texture, and extrema for color-ramp
/// normalization.
#[derive(Debug)]
pub struct FeatureData {
    pub data: Vec<f32>,
    pub texture: Texture,
    pub min: f32,
    pub max: f32,
}

/// Track times paired with one feature's values, for a plotting widget.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct TrackPlot {
    pub domain: Vec<u32>,
    pub range: Vec<f32>,
}

type FrameLoad = Shared<BoxFuture<'static, Result<Arc<Frame>, Arc<ColorizerError>>>>;

struct FrameState {
    cache: FrameCache,
    in_flight: HashMap<usize, FrameLoad>,
    resolution: Resolution,
}

/// A remote (or local) segmented time-lapse dataset.
///
/// Construct with a base URL, [`Dataset::open`] once, then read frames, features and tracks.
pub struct Dataset {
    base_url: String,
    opts: DatasetOpts,
    client: FetchClient,
    frame_loader: Arc<dyn FrameLoader>,
    array_loader: Arc<dyn ArrayLoader>,
    ledger: Arc<TextureLedger>,

    opened: bool,
    disposed: bool,
    manifest: Option<DatasetManifest>,
    frame_urls: Vec<String>,
    features: BTreeMap<String, FeatureData>,
    objects: ObjectTable,
    outliers_texture: Option<Texture>,
    frames: Mutex<FrameState>,
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("base_url", &self.base_url)
            .field("opened", &self.opened)
            .field("disposed", &self.disposed)
            .field("frames", &self.frame_urls.len())
            .field("features", &self.features.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Dataset {
    /// Dataset with default options. Web URLs are fetched over HTTP, anything else from disk.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_opts(base_url, DatasetOpts::default())
    }

    pub fn with_opts(base_url: impl Into<String>, opts: DatasetOpts) -> Self {
        let base_url = format_path(&base_url.into());
        let client = FetchClient::for_url(&base_url, opts.fetch_timeout());
        Self::with_client(base_url, opts, client)
    }

    /// Dataset whose manifest and default loaders all go through `client`.
    pub fn with_client(
        base_url: impl Into<String>,
        opts: DatasetOpts,
        client: FetchClient,
    ) -> Self {
        let frame_loader = Arc::new(ImageFrameLoader::new(client.clone()));
        let array_loader = Arc::new(JsonArrayLoader::new(client.clone()));
        Self::build(base_url.into(), opts, client, frame_loader, array_loader)
    }

    /// Dataset with caller-provided frame and array loaders. The manifest is fetched with the
    /// default client for `base_url`.
    pub fn with_loaders(
        base_url: impl Into<String>,
        opts: DatasetOpts,
        frame_loader: Arc<dyn FrameLoader>,
        array_loader: Arc<dyn ArrayLoader>,
    ) -> Self {
        let base_url = format_path(&base_url.into());
        let client = FetchClient::for_url(&base_url, opts.fetch_timeout());
        Self::build(base_url, opts, client, frame_loader, array_loader)
    }

    fn build(
        base_url: String,
        opts: DatasetOpts,
        client: FetchClient,
        frame_loader: Arc<dyn FrameLoader>,
        array_loader: Arc<dyn ArrayLoader>,
    ) -> Self {
        let capacity = opts.max_cached_frames;
        Self {
            base_url: format_path(&base_url),
            opts,
            client,
            frame_loader,
            array_loader,
            ledger: TextureLedger::new(),
            opened: false,
            disposed: false,
            manifest: None,
            frame_urls: Vec::new(),
            features: BTreeMap::new(),
            objects: ObjectTable::default(),
            outliers_texture: None,
            frames: Mutex::new(FrameState {
                cache: FrameCache::new(0, capacity),
                in_flight: HashMap::new(),
                resolution: Resolution::default(),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn opts(&self) -> &DatasetOpts {
        &self.opts
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn manifest(&self) -> Option<&DatasetManifest> {
        self.manifest.as_ref()
    }

    /// Ledger counting every texture this dataset has made resident.
    pub fn texture_ledger(&self) -> &Arc<TextureLedger> {
        &self.ledger
    }

    /// Fetch the manifest, then every feature and per-object array.
    ///
    /// A manifest failure is returned and leaves the dataset unopened, so `open` may be called
    /// again. Any other load that fails only leaves its field unset. All loads have settled when
    /// this returns. Calling `open` on an opened dataset does nothing.
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn open(&mut self) -> ColorizerResult<()> {
        if self.disposed {
            return Err(ColorizerError::Disposed);
        }
        if self.opened {
            return Ok(());
        }

        let manifest_url = resolve_url(&self.base_url, &self.opts.manifest_filename);
        let bytes = self.client.get(&manifest_url).await?;
        let manifest = DatasetManifest::parse(&bytes)?;

        let this = &*self;
        let feature_loads = join_all(manifest.features.iter().map(|(name, path)| async move {
            (name.clone(), this.load_array(name, Some(path.as_str())).await)
        }));
        let (features, outliers, tracks, times, centroids, bounds) = futures_util::join!(
            feature_loads,
            this.load_array("outliers", manifest.outliers.as_deref()),
            this.load_array("tracks", manifest.tracks.as_deref()),
            this.load_array("times", manifest.times.as_deref()),
            this.load_array("centroids", manifest.centroids.as_deref()),
            this.load_array("bounds", manifest.bounds.as_deref()),
        );

        for (name, result) in features {
            let Some(source) = settle(&name, result) else {
                continue;
            };
            let mut texture = source.texture(FeatureDataType::F32);
            texture.attach(&self.ledger);
            let data = source
                .buffer(FeatureDataType::F32)
                .into_f32()
                .unwrap_or_default();
            let feature = FeatureData {
                data,
                texture,
                min: source.min(),
                max: source.max(),
            };
            self.features.insert(name, feature);
        }

        let outliers = settle("outliers", outliers);
        if let Some(source) = &outliers {
            let mut texture = source.texture(FeatureDataType::U8);
            texture.attach(&self.ledger);
            self.outliers_texture = Some(texture);
        }
        let columns = ObjectColumns {
            track_ids: settle("tracks", tracks)
                .and_then(|s| s.buffer(FeatureDataType::U32).into_u32()),
            times: settle("times", times).and_then(|s| s.buffer(FeatureDataType::U32).into_u32()),
            centroids: settle("centroids", centroids)
                .and_then(|s| s.buffer(FeatureDataType::U16).into_u16()),
            bounds: settle("bounds", bounds)
                .and_then(|s| s.buffer(FeatureDataType::U16).into_u16()),
            outliers: outliers.and_then(|s| s.buffer(FeatureDataType::U8).into_u8()),
        };
        let fallback_count = self.features.values().next().map(|f| f.data.len());
        self.objects = ObjectTable::from_columns(columns, fallback_count);

        self.frame_urls = manifest.frames.iter().map(|f| self.resolve(f)).collect();
        *self.frames.get_mut() = FrameState {
            cache: FrameCache::new(self.frame_urls.len(), self.opts.max_cached_frames),
            in_flight: HashMap::new(),
            resolution: Resolution::default(),
        };

        tracing::info!(
            frames = self.frame_urls.len(),
            features = self.features.len(),
            objects = self.objects.count(),
            "dataset opened"
        );
        self.manifest = Some(manifest);
        self.opened = true;
        Ok(())
    }

    /// Load one array file named by the manifest.
    ///
    /// Fails with [`ColorizerError::MissingUrl`] when the manifest has no file for `field`.
    async fn load_array(
        &self,
        field: &str,
        path: Option<&str>,
    ) -> ColorizerResult<Box<dyn ArraySource>> {
        let Some(path) = path else {
            return Err(ColorizerError::missing_url(field));
        };
        self.array_loader.load(&self.resolve(path)).await
    }

    fn resolve(&self, path: &str) -> String {
        if is_url(path) {
            path.to_string()
        } else {
            resolve_url(&self.base_url, path)
        }
    }

    /// Frame `index`, from the cache or freshly loaded.
    ///
    /// Out-of-range indices (and any index before [`Dataset::open`]) give `Ok(None)` without
    /// touching the network. Concurrent calls for the same index share one load.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load_frame(&self, index: i64) -> ColorizerResult<Option<Arc<Frame>>> {
        let Some(index) = usize::try_from(index)
            .ok()
            .filter(|&i| i < self.frame_urls.len())
        else {
            return Ok(None);
        };

        let pending = {
            let mut state = self.frames.lock();
            if state.cache.is_disposed() {
                return Err(ColorizerError::Disposed);
            }
            if let Some(frame) = state.cache.get(index) {
                tracing::debug!("frame cache hit");
                return Ok(Some(frame));
            }
            state
                .in_flight
                .entry(index)
                .or_insert_with(|| self.start_frame_load(index))
                .clone()
        };

        let result = pending.clone().await;

        let mut state = self.frames.lock();
        let owner = state
            .in_flight
            .get(&index)
            .is_some_and(|load| load.ptr_eq(&pending));
        if owner {
            state.in_flight.remove(&index);
        }
        let frame = result.map_err(ColorizerError::Shared)?;
        if owner {
            state.resolution = frame.resolution();
            state.cache.insert(index, Arc::clone(&frame))?;
        }
        Ok(Some(frame))
    }

    fn start_frame_load(&self, index: usize) -> FrameLoad {
        let loader = Arc::clone(&self.frame_loader);
        let ledger = Arc::clone(&self.ledger);
        let url = self.frame_urls[index].clone();
        async move {
            let mut frame = loader.load(&url).await.map_err(Arc::new)?;
            frame.attach(&ledger);
            Ok::<_, Arc<ColorizerError>>(Arc::new(frame))
        }
        .boxed()
        .shared()
    }

    /// Resolution of the most recently loaded frame; 1x1 before any load.
    pub fn frame_resolution(&self) -> Resolution {
        self.frames.lock().resolution
    }

    pub fn number_of_frames(&self) -> usize {
        self.frame_urls.len()
    }

    /// Frames currently held by the cache.
    pub fn cached_frames(&self) -> usize {
        self.frames.lock().cache.resident()
    }

    /// Feature names declared by the manifest, including features whose data failed to load.
    pub fn feature_names(&self) -> Vec<&str> {
        self.manifest
            .as_ref()
            .map(|m| m.features.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.manifest
            .as_ref()
            .is_some_and(|m| m.features.contains_key(name))
    }

    /// Loaded data for `name`; `None` when undeclared or when its file failed to load.
    pub fn get_feature_data(&self, name: &str) -> Option<&FeatureData> {
        self.features.get(name)
    }

    /// Units declared for `name` in the manifest's feature metadata.
    pub fn feature_units(&self, name: &str) -> Option<&str> {
        self.manifest
            .as_ref()?
            .feature_metadata
            .get(name)
            .map(|m| m.units.as_str())
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    /// Time of object `id`, or 0 when unknown. 0 is also a valid time; see [`Dataset::time_of`].
    pub fn get_time(&self, id: u32) -> u32 {
        self.time_of(id).unwrap_or(0)
    }

    /// Track of object `id`, or 0 when unknown. See [`Dataset::track_id_of`].
    pub fn get_track_id(&self, id: u32) -> u32 {
        self.track_id_of(id).unwrap_or(0)
    }

    pub fn time_of(&self, id: u32) -> Option<u32> {
        self.objects.time(id)
    }

    pub fn track_id_of(&self, id: u32) -> Option<u32> {
        self.objects.track_id(id)
    }

    pub fn is_outlier(&self, id: u32) -> Option<bool> {
        self.objects.is_outlier(id)
    }

    pub fn outliers_texture(&self) -> Option<&Texture> {
        self.outliers_texture.as_ref()
    }

    pub fn times(&self) -> Option<&[u32]> {
        self.objects.times()
    }

    pub fn track_ids(&self) -> Option<&[u32]> {
        self.objects.track_ids()
    }

    /// Raw centroid array, two values per object, unscaled.
    pub fn centroids(&self) -> Option<&[u16]> {
        self.objects.centroids()
    }

    /// Raw bounds array, four values per object.
    pub fn bounds(&self) -> Option<&[u16]> {
        self.objects.bounds_array()
    }

    /// Every object of `track_id`, sorted by time. Centroids are scaled by the configured
    /// centroid scale factor.
    pub fn build_track(&self, track_id: u32) -> Track {
        let scale = self.opts.centroid_scale_factor;
        let points = self
            .objects
            .ids_in_track(track_id)
            .into_iter()
            .map(|id| TrackPoint {
                id,
                time: self.objects.time(id).unwrap_or(0),
                centroid: self
                    .objects
                    .centroid(id)
                    .map(|[x, y]| [f32::from(x) * scale, f32::from(y) * scale]),
                bounds: self.objects.bounds(id),
            })
            .collect();
        Track::from_points(track_id, points)
    }

    /// Pair each timepoint of `track` with `feature` at that object. `None` without the feature.
    pub fn build_track_feature_plot(&self, track: &Track, feature: &str) -> Option<TrackPlot> {
        let data = &self.features.get(feature)?.data;
        let mut plot = TrackPlot::default();
        for (&id, &time) in track.ids().iter().zip(track.times()) {
            if let Some(&value) = data.get(id as usize) {
                plot.domain.push(time);
                plot.range.push(value);
            }
        }
        Some(plot)
    }

    /// Object under pixel `(x, y)` of `frame`.
    pub fn pick_object(&self, frame: &Frame, x: u32, y: u32) -> Option<u32> {
        frame.object_id_at(x, y)
    }

    /// Track of the object under pixel `(x, y)` of `frame`.
    pub fn pick_track(&self, frame: &Frame, x: u32, y: u32) -> Option<Track> {
        let id = self.pick_object(frame, x, y)?;
        let track_id = self.track_id_of(id)?;
        Some(self.build_track(track_id))
    }

    /// Release every texture held by the dataset. Safe to call repeatedly and before `open`.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for feature in self.features.values() {
            feature.texture.release();
        }
        if let Some(texture) = &self.outliers_texture {
            texture.release();
        }
        let state = self.frames.get_mut();
        state.cache.dispose();
        state.in_flight.clear();
        self.disposed = true;
        tracing::debug!(base_url = %self.base_url, "dataset disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Keep a successful optional load; log and drop a failed one.
fn settle<T>(field: &str, result: ColorizerResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(ColorizerError::MissingUrl(_)) => {
            tracing::debug!(field, "no file configured");
            None
        }
        Err(err) => {
            tracing::warn!(field, error = %err, "optional load failed; leaving it unset");
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/dataset.rs"]
mod tests;
