use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cadence::{
    AdaptiveEncoder, BackgroundMode, BackgroundSource, BlockGlyphRasterizer, FeatureTimeline,
    FrameIndex, HardwareCapabilityProbe, ImageSequenceSource, LyricLine, LyricSheet, PixelFormat,
    RenderConfig, RenderSession, SolidColorSource, StillImageSource, SystemCapabilities,
};

#[derive(Parser, Debug)]
#[command(name = "cadence", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Print the encoder this machine would use.
    Probe,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Render job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Render job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Audio track muxed into the output. Without it the video is silent.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Skip the hardware encoder even if one is available.
    #[arg(long)]
    software_only: bool,
}

/// Everything a render needs besides the audio file: configuration, aligned lyrics and the
/// pre-analyzed feature track.
#[derive(serde::Deserialize, Debug)]
struct RenderJob {
    #[serde(default)]
    config: RenderConfig,
    lyrics: Vec<LyricLine>,
    features: FeatureTimeline,
    #[serde(default)]
    background: BackgroundJob,
}

#[derive(serde::Deserialize, Debug, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum BackgroundJob {
    #[default]
    None,
    Solid {
        rgb: [u8; 3],
    },
    Image {
        path: PathBuf,
    },
    Sequence {
        dir: PathBuf,
        fps: f64,
    },
    /// Clips rotated on the feature track's beats.
    BeatClips {
        clips: Vec<BackgroundJob>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Probe => cmd_probe(),
    }
}

fn read_job_json(path: &Path) -> anyhow::Result<RenderJob> {
    let f = File::open(path).with_context(|| format!("open render job '{}'", path.display()))?;
    let r = BufReader::new(f);
    let job: RenderJob = serde_json::from_reader(r).with_context(|| "parse render job JSON")?;
    job.features.validate()?;
    Ok(job)
}

fn open_source(job: &BackgroundJob, root: &Path, cfg: &RenderConfig) -> anyhow::Result<Option<Box<dyn BackgroundSource>>> {
    let source: Box<dyn BackgroundSource> = match job {
        BackgroundJob::None => return Ok(None),
        BackgroundJob::Solid { rgb } => Box::new(SolidColorSource::new(
            cfg.resolution.width,
            cfg.resolution.height,
            *rgb,
        )),
        BackgroundJob::Image { path } => Box::new(StillImageSource::open(&root.join(path))?),
        BackgroundJob::Sequence { dir, fps } => {
            Box::new(ImageSequenceSource::from_dir(&root.join(dir), *fps)?)
        }
        BackgroundJob::BeatClips { .. } => {
            anyhow::bail!("beat-switched clips cannot be nested")
        }
    };
    Ok(Some(source))
}

fn build_session(job: RenderJob, root: &Path) -> anyhow::Result<RenderSession> {
    let builder = RenderSession::builder()
        .config(job.config.clone())
        .lyrics(LyricSheet::new(job.lyrics))
        .rasterizer(BlockGlyphRasterizer);

    let builder = match &job.background {
        BackgroundJob::BeatClips { clips } => {
            let mut sources = Vec::with_capacity(clips.len());
            for clip in clips {
                if let Some(source) = open_source(clip, root, &job.config)? {
                    sources.push(source);
                }
            }
            builder.beat_switched_clips(sources)
        }
        other => match open_source(other, root, &job.config)? {
            Some(source) => builder.background(BackgroundMode::Single(source)),
            None => builder.background(BackgroundMode::None),
        },
    };

    Ok(builder.audio(job.features).build()?)
}

fn job_root(in_path: &Path) -> PathBuf {
    in_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let job = read_job_json(&args.in_path)?;
    let mut session = build_session(job, &job_root(&args.in_path))?;
    let frame = session.render_frame(FrameIndex(args.frame))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let color = match frame.format {
        PixelFormat::Rgb8 => image::ColorType::Rgb8,
        PixelFormat::Rgba8 => image::ColorType::Rgba8,
        PixelFormat::Gray8 => image::ColorType::L8,
    };
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        color,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let job = read_job_json(&args.in_path)?;
    let mut encode = job.config.encode.clone();
    if args.software_only {
        encode.allow_hardware = false;
    }
    let rec = HardwareCapabilityProbe::new(SystemCapabilities).recommend(encode.crf, &encode.preset);

    let mut session = build_session(job, &job_root(&args.in_path))?;
    let mut encoder = AdaptiveEncoder::ffmpeg(encode);
    let mut frames = session.frames();
    let report = encoder.encode(&mut frames, &rec, args.audio.as_deref(), &args.out)?;

    if let Some(reason) = &report.fallback_reason {
        eprintln!("hardware encoder failed, used {}: {reason}", report.encoder);
    }
    eprintln!(
        "wrote {} ({} frames, {})",
        report.output.display(),
        report.frames_written,
        report.encoder
    );
    Ok(())
}

fn cmd_probe() -> anyhow::Result<()> {
    let defaults = cadence::EncodeConfig::default();
    let rec = HardwareCapabilityProbe::new(SystemCapabilities).recommend(defaults.crf, &defaults.preset);
    println!("{}", serde_json::to_string_pretty(&rec)?);
    Ok(())
}
