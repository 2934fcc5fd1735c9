use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use reelmix::{
    DissolveMode, Engine, FfmpegDecoderFactory, FfmpegEncoder, FfmpegEncoderOpts, Fps,
    RecordingSink, RunConfig, SourceFile, TracingObserver,
};

#[derive(Parser, Debug)]
#[command(name = "reelmix", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the randomized clip plan as JSON without rendering.
    Plan(PlanArgs),
    /// Render a montage (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Source video files.
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Run config JSON. Flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target output duration in seconds.
    #[arg(long)]
    duration: Option<f64>,

    /// Minimum clip length, percent of source duration.
    #[arg(long)]
    min_pct: Option<f64>,

    /// Maximum clip length, percent of source duration.
    #[arg(long)]
    max_pct: Option<f64>,

    /// Chance (percent) that a clip is zoomed.
    #[arg(long)]
    zoom_probability: Option<f64>,

    /// Smallest zoom, in percent (100 = no magnification).
    #[arg(long)]
    min_zoom: Option<f64>,

    /// Largest zoom, in percent.
    #[arg(long)]
    max_zoom: Option<f64>,

    /// Chance (percent) that a clip is mirrored.
    #[arg(long)]
    flip_probability: Option<f64>,

    /// Seed for planning and effects.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Output path. Defaults to the name suggested by the negotiated container.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write the last rendered frame as a PNG.
    #[arg(long)]
    poster: Option<PathBuf>,

    /// How the previous clip shows through during the overlap window.
    #[arg(long, value_enum)]
    dissolve: Option<DissolveChoice>,

    /// Output frame rate, `30` or `30000/1001`.
    #[arg(long, value_parser = parse_fps)]
    fps: Option<Fps>,

    /// Output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DissolveChoice {
    Overlay,
    Blend,
}

impl From<DissolveChoice> for DissolveMode {
    fn from(c: DissolveChoice) -> Self {
        match c {
            DissolveChoice::Overlay => Self::Overlay,
            DissolveChoice::Blend => Self::Blend,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn load_config(args: &RunArgs) -> anyhow::Result<RunConfig> {
    let mut cfg = match &args.config {
        Some(path) => RunConfig::from_path(path)?,
        None => RunConfig::default(),
    };
    if let Some(v) = args.duration {
        cfg.target_duration_sec = v;
    }
    if let Some(v) = args.min_pct {
        cfg.clip.min_pct = v;
    }
    if let Some(v) = args.max_pct {
        cfg.clip.max_pct = v;
    }
    if let Some(v) = args.zoom_probability {
        cfg.effects.zoom_probability = v;
    }
    if let Some(v) = args.min_zoom {
        cfg.effects.min_zoom = v;
    }
    if let Some(v) = args.max_zoom {
        cfg.effects.max_zoom = v;
    }
    if let Some(v) = args.flip_probability {
        cfg.effects.flip_probability = v;
    }
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }
    Ok(cfg)
}

fn parse_fps(s: &str) -> Result<Fps, String> {
    let (num, den) = match s.split_once('/') {
        Some((n, d)) => (n.trim(), d.trim()),
        None => (s.trim(), "1"),
    };
    let num: u32 = num.parse().map_err(|_| format!("invalid fps numerator '{num}'"))?;
    let den: u32 = den.parse().map_err(|_| format!("invalid fps denominator '{den}'"))?;
    Fps::new(num, den).map_err(|e| e.to_string())
}

fn probe_sources(paths: &[PathBuf]) -> anyhow::Result<Vec<Arc<SourceFile>>> {
    paths
        .iter()
        .map(|p| {
            SourceFile::probe(p)
                .map(Arc::new)
                .with_context(|| format!("probe source '{}'", p.display()))
        })
        .collect()
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.run)?;
    let sources = probe_sources(&args.run.sources)?;
    let mut engine = Engine::new(cfg, Arc::new(TracingObserver))?;
    let plan = engine.plan(&sources)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.run)?;
    if let Some(d) = args.dissolve {
        cfg.dissolve = d.into();
    }
    if let Some(fps) = args.fps {
        cfg.output.fps = fps;
    }
    if let Some(w) = args.width {
        cfg.output.width = w;
    }
    if let Some(h) = args.height {
        cfg.output.height = h;
    }

    let sources = probe_sources(&args.run.sources)?;
    let observer = Arc::new(TracingObserver);
    let decoders = FfmpegDecoderFactory::new(cfg.output.fps);
    let encoder = FfmpegEncoder::new(FfmpegEncoderOpts {
        bg_rgba: cfg.output.background.unwrap_or([0, 0, 0, 255]),
    });
    let mut sink = RecordingSink::new(encoder, observer.clone());

    let mut engine = Engine::new(cfg, observer)?;
    let outcome = engine.run(&sources, &decoders, &mut sink)?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(outcome.artifact.suggested_file_name()));
    outcome.artifact.write_to(&out)?;
    eprintln!(
        "wrote {} ({} bytes, {} frames, {} clips)",
        out.display(),
        outcome.artifact.len(),
        outcome.stats.frames_total,
        outcome.stats.clips_rendered
    );

    if let (Some(path), Some(frame)) = (args.poster.as_deref(), outcome.last_frame.as_ref()) {
        write_png(path, frame)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn write_png(path: &Path, frame: &reelmix::FrameRGBA) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
