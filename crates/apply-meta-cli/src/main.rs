use std::path::{Path, PathBuf};

use anyhow::Context;
use apply_meta_core::{CancellationToken, ProcessControl, ProcessOptions};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "apply-meta",
    version,
    about = "Apply ordered JSON-array metadata entries to ordered media files using ffmpeg (supports per-item artwork via 'image')"
)]
struct Cli {
    /// JSON file containing an array of metadata objects
    metadata: PathBuf,

    /// Directory containing media files to process (sorted by filename)
    #[arg(long, conflicts_with = "files")]
    dir: Option<PathBuf>,

    /// Explicit list of input files (keeps given order)
    #[arg(long, num_args = 1..)]
    files: Option<Vec<PathBuf>>,

    /// Output directory (created if missing)
    #[arg(long, default_value = apply_meta_core::DEFAULT_OUTPUT_DIR)]
    outdir: PathBuf,

    /// Suffix inserted before the extension, e.g. '_tagged'
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    suffix: String,

    /// Default cover image for entries without an 'image'
    #[arg(long)]
    cover: Option<PathBuf>,

    /// Print ffmpeg commands but do not run them
    #[arg(long)]
    dry_run: bool,

    /// Overwrite outputs if they exist
    #[arg(short = 'y', long)]
    yes: bool,

    /// ffmpeg executable to invoke
    #[arg(long, env = "APPLY_META_FFMPEG", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Verbose logging (also shows each ffmpeg command)
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let t_total = std::time::Instant::now();

    // fall back to the conventional songs/ folder when no source was given
    let dir = if cli.dir.is_none()
        && cli.files.is_none()
        && Path::new(apply_meta_core::DEFAULT_INPUT_DIR).is_dir()
    {
        Some(PathBuf::from(apply_meta_core::DEFAULT_INPUT_DIR))
    } else {
        cli.dir
    };

    let options = ProcessOptions {
        metadata: cli.metadata,
        dir,
        files: cli.files,
        outdir: cli.outdir,
        suffix: cli.suffix,
        cover: cli.cover,
        dry_run: cli.dry_run,
        overwrite: cli.yes,
        ffmpeg: cli.ffmpeg,
    };

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("failed to install interrupt handler")?;
    let control = ProcessControl::new().with_cancel_token(token);

    let report = apply_meta_core::process_with_control(
        &options,
        &control,
        &|_stage: &str, current: u64, total: u64, message: &str| {
            eprintln!("[{}/{}] {}", current + 1, total, message);
        },
    )?;

    for command in report.planned_commands() {
        println!("{}", command);
    }

    let failed = report.failed().count();
    eprintln!(
        "Done! {} succeeded, {} failed, {} warnings ({:.2}s)",
        report.succeeded().count(),
        failed,
        report.warnings.len(),
        t_total.elapsed().as_secs_f64()
    );

    if failed > 0 {
        for outcome in report.failed() {
            if let Err(e) = &outcome.result {
                eprintln!("  failed: {}: {}", outcome.input.display(), e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
