//! Intromix - main entry point
//!
//! Thin wrapper around the mix engine: discovers MP3 files on disk, builds
//! the configuration from CLI flags (and an optional TOML file), assembles
//! the mix, and exports it as WAV. Everything with algorithmic content lives
//! in the library; this file only does discovery, wiring and export.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use intromix::audio::{decode_file, AudioBuffer};
use intromix::export::write_wav;
use intromix::human_time::{format_clock, parse_clock};
use intromix::{MixConfig, MixSources, TimelineAssembler};

/// Command-line arguments for intromix
#[derive(Parser, Debug)]
#[command(name = "intromix")]
#[command(about = "Build an intromix of crossfaded MP3 clips with DJ-style transitions")]
#[command(version)]
struct Args {
    /// Root folder containing source MP3 files (searched recursively)
    #[arg(short, long, default_value = "tracks", env = "INTROMIX_ROOT")]
    root: PathBuf,

    /// Output WAV file
    #[arg(short, long, default_value = "intromix.wav")]
    dest: PathBuf,

    /// Target mix length as M:SS, e.g. 5:30
    #[arg(short, long, default_value = "10:00")]
    time: String,

    /// Folder of transition stingers overlaid at crossfade points
    #[arg(long, default_value = "stingers", env = "INTROMIX_STINGERS")]
    stingers: PathBuf,

    /// Folder of intros; one is picked at random and prepended
    #[arg(long, default_value = "intros", env = "INTROMIX_INTROS")]
    intros: PathBuf,

    /// Seed for reproducible mixes (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Optional TOML file with mix parameters
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intromix=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MixConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MixConfig::default(),
    };
    config.target_ms = parse_clock(&args.time).context("Invalid --time value")?;
    config.validate().context("Invalid mix configuration")?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let tracks = find_mp3_files(&args.root);
    if tracks.is_empty() {
        bail!("No MP3 files found under {}", args.root.display());
    }
    info!(
        "Found {} tracks under {}; target {}",
        tracks.len(),
        args.root.display(),
        format_clock(config.target_ms)
    );

    let stingers = load_stingers(&args.stingers);
    let intro = load_intro(&args.intros, &mut rng);

    let mut sources = MixSources::from_paths(tracks).with_stingers(stingers);
    if let Some(intro) = intro {
        sources = sources.with_intro(intro);
    }

    let assembler = TimelineAssembler::new(config)?;
    let mix = assembler
        .assemble(&mut sources, &mut rng)
        .context("Mix construction failed")?;

    write_wav(&mix.timeline, &args.dest)
        .with_context(|| format!("Failed to export {}", args.dest.display()))?;

    info!(
        "Exported {} ({} clips, {} of audio)",
        args.dest.display(),
        mix.clip_count,
        format_clock(mix.timeline.duration_ms())
    );
    Ok(())
}

/// Recursively collect MP3 paths under a folder (empty when it is missing)
fn find_mp3_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| e.eq_ignore_ascii_case("mp3"))
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Decode every stinger in the folder; unreadable files are skipped
fn load_stingers(dir: &Path) -> Vec<AudioBuffer> {
    if !dir.exists() {
        warn!("Stinger folder {} not found", dir.display());
        return Vec::new();
    }

    let paths = find_mp3_files(dir);
    if paths.is_empty() {
        warn!("No stingers found under {}", dir.display());
        return Vec::new();
    }

    let mut stingers = Vec::with_capacity(paths.len());
    for path in paths {
        match decode_file(&path) {
            Ok(buffer) => stingers.push(buffer),
            Err(e) => warn!("Skipping stinger {}: {}", path.display(), e),
        }
    }
    stingers
}

/// Pick one intro at random and decode it
fn load_intro(dir: &Path, rng: &mut StdRng) -> Option<AudioBuffer> {
    if !dir.exists() {
        warn!("Intro folder {} not found", dir.display());
        return None;
    }

    let paths = find_mp3_files(dir);
    let path = paths.choose(rng)?;
    match decode_file(path) {
        Ok(buffer) => {
            info!("Selected intro {}", path.display());
            Some(buffer)
        }
        Err(e) => {
            warn!("Skipping intro {}: {}", path.display(), e);
            None
        }
    }
}
