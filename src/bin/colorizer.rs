use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use colorizer::{
    ArrayLoader, Collection, Dataset, DatasetOpts, FetchClient, ImageFrameLoader,
    JsonArrayLoader, PackedImageArrayLoader,
};

#[derive(Parser, Debug)]
#[command(name = "colorizer", version)]
struct Cli {
    /// Dataset options as JSON; flags below override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Abort budget per request, in milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Frame cache capacity.
    #[arg(long, global = true)]
    max_cached_frames: Option<usize>,

    /// Encoding of feature and per-object array files.
    #[arg(long, global = true, value_enum, default_value_t = ArrayFormat::Json)]
    arrays: ArrayFormat,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a dataset and summarize it.
    Inspect(DatasetArgs),
    /// Print one track (and optionally a feature plot) as JSON.
    Track(TrackArgs),
    /// Decode one frame and report its resolution and objects.
    Frame(FrameArgs),
    /// List the datasets of a collection.
    Collection(CollectionArgs),
}

#[derive(Parser, Debug)]
struct DatasetArgs {
    /// Dataset base URL or directory.
    #[arg(long)]
    dataset: String,
}

#[derive(Parser, Debug)]
struct TrackArgs {
    #[arg(long)]
    dataset: String,

    /// Track id.
    #[arg(long)]
    track: u32,

    /// Feature to pair with the track times.
    #[arg(long)]
    feature: Option<String>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[arg(long)]
    dataset: String,

    /// Frame index (0-based).
    #[arg(long)]
    index: i64,
}

#[derive(Parser, Debug)]
struct CollectionArgs {
    /// `collection.json` URL, or a single dataset URL.
    #[arg(long)]
    url: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ArrayFormat {
    Json,
    Packed,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = load_opts(&cli)?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start runtime")?;

    let arrays = cli.arrays;
    rt.block_on(async move {
        match cli.cmd {
            Command::Inspect(args) => cmd_inspect(args, opts, arrays).await,
            Command::Track(args) => cmd_track(args, opts, arrays).await,
            Command::Frame(args) => cmd_frame(args, opts, arrays).await,
            Command::Collection(args) => cmd_collection(args, opts).await,
        }
    })
}

fn load_opts(cli: &Cli) -> anyhow::Result<DatasetOpts> {
    let mut opts = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parse config '{}'", path.display()))?
        }
        None => DatasetOpts::default(),
    };
    if let Some(ms) = cli.timeout_ms {
        opts.fetch_timeout_ms = ms;
    }
    if let Some(n) = cli.max_cached_frames {
        opts.max_cached_frames = n;
    }
    Ok(opts)
}

async fn open_dataset(
    url: &str,
    opts: DatasetOpts,
    arrays: ArrayFormat,
) -> anyhow::Result<Dataset> {
    let client = FetchClient::for_url(url, opts.fetch_timeout());
    let array_loader: Arc<dyn ArrayLoader> = match arrays {
        ArrayFormat::Json => Arc::new(JsonArrayLoader::new(client.clone())),
        ArrayFormat::Packed => Arc::new(PackedImageArrayLoader::new(client.clone())),
    };
    let frame_loader = Arc::new(ImageFrameLoader::new(client));
    let mut dataset = Dataset::with_loaders(url, opts, frame_loader, array_loader);
    dataset
        .open()
        .await
        .with_context(|| format!("open dataset '{url}'"))?;
    Ok(dataset)
}

async fn cmd_inspect(
    args: DatasetArgs,
    opts: DatasetOpts,
    arrays: ArrayFormat,
) -> anyhow::Result<()> {
    let dataset = open_dataset(&args.dataset, opts, arrays).await?;

    let features: Vec<_> = dataset
        .feature_names()
        .into_iter()
        .map(|name| match dataset.get_feature_data(name) {
            Some(f) => serde_json::json!({
                "name": name,
                "units": dataset.feature_units(name),
                "loaded": true,
                "len": f.data.len(),
                "min": f.min,
                "max": f.max,
            }),
            None => serde_json::json!({
                "name": name,
                "units": dataset.feature_units(name),
                "loaded": false,
            }),
        })
        .collect();
    let objects = dataset.objects();
    let summary = serde_json::json!({
        "base_url": dataset.base_url(),
        "frames": dataset.number_of_frames(),
        "objects": objects.count(),
        "features": features,
        "tracks": objects.track_ids().is_some(),
        "times": objects.times().is_some(),
        "centroids": objects.centroids().is_some(),
        "bounds": objects.bounds_array().is_some(),
        "outliers": objects.outliers().is_some(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn cmd_track(args: TrackArgs, opts: DatasetOpts, arrays: ArrayFormat) -> anyhow::Result<()> {
    let dataset = open_dataset(&args.dataset, opts, arrays).await?;
    let track = dataset.build_track(args.track);
    if track.is_empty() {
        eprintln!("track {} has no objects", args.track);
    }

    let plot = match &args.feature {
        Some(name) => Some(
            dataset
                .build_track_feature_plot(&track, name)
                .with_context(|| format!("unknown feature '{name}'"))?,
        ),
        None => None,
    };
    let out = serde_json::json!({ "track": track, "plot": plot });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn cmd_frame(args: FrameArgs, opts: DatasetOpts, arrays: ArrayFormat) -> anyhow::Result<()> {
    let mut dataset = open_dataset(&args.dataset, opts, arrays).await?;
    let frame = dataset
        .load_frame(args.index)
        .await?
        .with_context(|| {
            format!(
                "frame {} out of range (dataset has {} frames)",
                args.index,
                dataset.number_of_frames()
            )
        })?;

    let resolution = frame.resolution();
    let objects = frame.object_ids();
    println!(
        "frame {}: {}x{}, {} objects",
        args.index,
        resolution.width,
        resolution.height,
        objects.len()
    );
    drop(frame);
    dataset.dispose();
    Ok(())
}

async fn cmd_collection(args: CollectionArgs, opts: DatasetOpts) -> anyhow::Result<()> {
    let client = FetchClient::for_url(&args.url, opts.fetch_timeout());
    let collection = Collection::from_url(&args.url, &client)
        .await
        .with_context(|| format!("load collection '{}'", args.url))?;
    for entry in collection.entries() {
        println!("{}\t{}", entry.name, entry.path);
    }
    Ok(())
}
