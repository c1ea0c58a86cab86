use anyhow::Result;
use clap::Parser;
use tracing::info;

mod audio;
mod color;
mod config;
mod display;
mod error;
mod render;
mod spectrum;
mod timing;

use audio::AudioEnvironment;
use config::Config;

#[derive(Parser, Debug)]
#[command(name = "specglow")]
#[command(author, version, about = "Glowing spectrum visualizer for audio files")]
struct Args {
    /// Audio file to visualize (WAV)
    file: Option<std::path::PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Write a commented default config to the XDG path and exit
    #[arg(long)]
    init_config: bool,

    /// Target frame rate
    #[arg(long)]
    target_fps: Option<u32>,

    /// Show a smoothed FPS estimate in the status line
    #[arg(long)]
    fps: bool,

    /// Bar width in pixels
    #[arg(long)]
    bar_width: Option<f32>,

    /// Gap between bars in pixels
    #[arg(long)]
    bar_gap: Option<f32>,

    /// Scale factor for bar heights
    #[arg(short, long)]
    multiplier: Option<f32>,

    /// Draw bars downward from the centre line
    #[arg(long)]
    flip_bars: bool,

    /// Drift particles downward instead of upward
    #[arg(long)]
    flip_particles: bool,

    /// Disable the mirrored secondary glow
    #[arg(long)]
    no_secondary_glow: bool,

    /// Particles spawned per frame (0 disables them)
    #[arg(short, long)]
    particles: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("specglow=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.init_config {
        let path = Config::init_default_config()?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let Some(file) = args.file.clone() else {
        anyhow::bail!("no audio file given; see --help");
    };

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_from_default_path().unwrap_or_default(),
    };
    config.merge_args(&args);

    let env = AudioEnvironment::detect()?;
    let encoded = std::fs::read(&file)?;
    info!("visualizing {} ({} bytes)", file.display(), encoded.len());

    display::terminal::run(config, &env, encoded).await
}
