use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "voidgrind", version)]
struct Cli {
    /// JSON config file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grind source images into stroke records.
    Grind(GrindArgs),
    /// Rescan source images for pareidolia ghosts.
    Scan(DataArgs),
    /// Rebuild the manifest.
    Index(IndexArgs),
    /// Build the similarity graph.
    Graph(GraphArgs),
    /// Upgrade legacy records and manifest in place.
    Migrate(MigrateArgs),
    /// Project one record into a render-ready point cloud.
    Project(ProjectArgs),
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Record directory.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Source image directory.
    #[arg(long)]
    raw: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GrindArgs {
    /// Source image or directory (defaults to the configured raw directory).
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Record output directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// This worker's shard index (0-based).
    #[arg(long, default_value_t = 0)]
    shard: u32,

    /// Total number of workers.
    #[arg(long, default_value_t = 1)]
    total: u32,

    #[arg(long, value_enum)]
    strategy: Option<StrategyChoice>,

    /// Reject sources narrower or shorter than this.
    #[arg(long)]
    min_resolution: Option<u32>,

    /// Keep rejected sources on disk.
    #[arg(long)]
    keep_rejected: bool,

    /// Attach embeddings and face flags to every stroke.
    #[arg(long)]
    annotate: bool,

    /// Skip the pareidolia scan.
    #[arg(long)]
    no_ghosts: bool,
}

#[derive(Args, Debug)]
struct IndexArgs {
    #[arg(long)]
    data: Option<PathBuf>,

    /// Manifest output path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Navigation neighbours per node.
    #[arg(long)]
    neighbors: Option<usize>,
}

#[derive(Args, Debug)]
struct GraphArgs {
    #[arg(long)]
    data: Option<PathBuf>,

    /// Graph output path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Cosine similarity an edge must exceed.
    #[arg(long)]
    threshold: Option<f64>,
}

#[derive(Args, Debug)]
struct MigrateArgs {
    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long)]
    manifest: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ProjectArgs {
    /// Artifact record to project.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Cloud output path.
    #[arg(long)]
    out: PathBuf,

    /// Vertical field of view in degrees.
    #[arg(long)]
    fov: Option<f64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyChoice {
    RoundRobin,
    Hash,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut cfg = match &cli.config {
        Some(path) => voidgrind::VoidConfig::from_path(path)?,
        None => voidgrind::VoidConfig::default(),
    };
    match cli.cmd {
        Command::Grind(args) => cmd_grind(&mut cfg, args),
        Command::Scan(args) => cmd_scan(&mut cfg, args),
        Command::Index(args) => cmd_index(&mut cfg, args),
        Command::Graph(args) => cmd_graph(&mut cfg, args),
        Command::Migrate(args) => cmd_migrate(&mut cfg, args),
        Command::Project(args) => cmd_project(&mut cfg, args),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr).with_current_span(true))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init();
    }
}

fn cmd_grind(cfg: &mut voidgrind::VoidConfig, args: GrindArgs) -> anyhow::Result<()> {
    if let Some(out) = args.out {
        cfg.paths.data_dir = out;
    }
    if let Some(min) = args.min_resolution {
        cfg.grind.min_resolution = min;
    }
    if let Some(s) = args.strategy {
        cfg.grind.shard_strategy = match s {
            StrategyChoice::RoundRobin => voidgrind::ShardStrategy::RoundRobin,
            StrategyChoice::Hash => voidgrind::ShardStrategy::Hash,
        };
    }
    cfg.grind.delete_rejected &= !args.keep_rejected;
    cfg.grind.annotate_strokes |= args.annotate;
    cfg.grind.scan_ghosts &= !args.no_ghosts;
    cfg.validate()?;

    let shard = voidgrind::ShardSpec::new(args.shard, args.total, cfg.grind.shard_strategy)?;
    let input = args.in_path.unwrap_or_else(|| cfg.paths.raw_dir.clone());
    let oracles = voidgrind::OracleSet::from_config(&cfg.oracles)?;
    tracing::info!(?oracles, "oracles loaded");

    let grinder = voidgrind::Grinder::new(cfg.clone(), oracles)?;
    let report = grinder.run_batch(&input, shard)?;

    eprintln!(
        "processed {}, already done {}, rejected {}, unreadable {}, failed {} (flat depth {}, grid masks {})",
        report.processed,
        report.already_done,
        report.rejected,
        report.unreadable,
        report.failed.len(),
        report.flat_depth_fallbacks,
        report.grid_mask_fallbacks,
    );
    for (id, failure) in &report.failed {
        eprintln!("  {id}: {failure}");
    }
    Ok(())
}

fn apply_data_args(cfg: &mut voidgrind::VoidConfig, args: DataArgs) {
    if let Some(data) = args.data {
        cfg.paths.data_dir = data;
    }
    if let Some(raw) = args.raw {
        cfg.paths.raw_dir = raw;
    }
}

fn cmd_scan(cfg: &mut voidgrind::VoidConfig, args: DataArgs) -> anyhow::Result<()> {
    apply_data_args(cfg, args);
    cfg.validate()?;
    let detector = voidgrind::ContrastFaceDetector::new(cfg.oracles.face_contrast);
    let report = voidgrind::scan_records(cfg, &detector)?;
    eprintln!(
        "scanned {}, skipped {}, ghosts {}",
        report.scanned, report.skipped, report.ghosts
    );
    Ok(())
}

fn cmd_index(cfg: &mut voidgrind::VoidConfig, args: IndexArgs) -> anyhow::Result<()> {
    if let Some(data) = args.data {
        cfg.paths.data_dir = data;
    }
    if let Some(out) = args.out {
        cfg.paths.manifest_path = out;
    }
    if let Some(k) = args.neighbors {
        cfg.graph.neighbors = k;
    }
    cfg.validate()?;

    let (manifest, report) = voidgrind::build_manifest(&cfg.paths.data_dir, cfg.graph.neighbors)?;
    voidgrind::write_json_atomic(&cfg.paths.manifest_path, &manifest)?;
    eprintln!(
        "wrote {} ({} nodes, {} skipped)",
        cfg.paths.manifest_path.display(),
        report.indexed,
        report.skipped
    );
    Ok(())
}

fn cmd_graph(cfg: &mut voidgrind::VoidConfig, args: GraphArgs) -> anyhow::Result<()> {
    if let Some(data) = args.data {
        cfg.paths.data_dir = data;
    }
    if let Some(out) = args.out {
        cfg.paths.graph_path = out;
    }
    if let Some(t) = args.threshold {
        cfg.graph.threshold = t;
    }
    cfg.validate()?;

    let graph = voidgrind::build_graph(&cfg.paths.data_dir, &cfg.graph)?;
    voidgrind::write_json_atomic(&cfg.paths.graph_path, &graph)?;
    eprintln!(
        "wrote {} ({} nodes, {} edges)",
        cfg.paths.graph_path.display(),
        graph.nodes.len(),
        graph.edges.len()
    );
    Ok(())
}

fn cmd_migrate(cfg: &mut voidgrind::VoidConfig, args: MigrateArgs) -> anyhow::Result<()> {
    if let Some(data) = args.data {
        cfg.paths.data_dir = data;
    }
    if let Some(m) = args.manifest {
        cfg.paths.manifest_path = m;
    }
    let report = voidgrind::migrate_all(&cfg.paths.data_dir, &cfg.paths.manifest_path)?;
    eprintln!(
        "migrated {}, current {}, failed {}, manifest {}",
        report.migrated,
        report.current,
        report.failed,
        if report.manifest { "rewritten" } else { "unchanged" }
    );
    Ok(())
}

fn cmd_project(cfg: &mut voidgrind::VoidConfig, args: ProjectArgs) -> anyhow::Result<()> {
    if let Some(fov) = args.fov {
        cfg.camera.fov_deg = fov;
    }
    cfg.validate()?;

    let cloud = voidgrind::export_cloud(&args.in_path, &cfg.camera)
        .with_context(|| format!("project '{}'", args.in_path.display()))?;
    voidgrind::write_json_atomic(&args.out, &cloud)?;
    eprintln!("wrote {} ({} strokes)", args.out.display(), cloud.strokes.len());
    Ok(())
}
