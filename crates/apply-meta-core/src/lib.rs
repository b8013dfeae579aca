pub mod artwork;
pub mod cancel;
pub mod command;
pub mod error;
pub mod executor;
pub mod files;
pub mod metadata;
pub mod pairing;
pub mod report;

#[cfg(all(test, unix))]
mod test_support;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use cancel::CancellationToken;
pub use error::{Error, PairingError};
pub use report::{BatchReport, PairingOutcome, Status, Warning};

/// Conventional input directory used when no source is given.
pub const DEFAULT_INPUT_DIR: &str = "songs";
/// Conventional output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

fn default_tool() -> PathBuf {
    PathBuf::from(command::DEFAULT_TOOL)
}

fn default_outdir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// JSON file holding the metadata array.
    pub metadata: PathBuf,
    /// Directory scanned for media files, sorted by name.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Explicit input files, used in the given order.
    #[serde(default)]
    pub files: Option<Vec<PathBuf>>,
    /// Where tagged copies are written.
    #[serde(default = "default_outdir")]
    pub outdir: PathBuf,
    /// Inserted between the input stem and its extension.
    #[serde(default)]
    pub suffix: String,
    /// Fallback artwork for entries without an `image`.
    #[serde(default)]
    pub cover: Option<PathBuf>,
    #[serde(default)]
    pub dry_run: bool,
    /// Replace outputs that already exist.
    #[serde(default)]
    pub overwrite: bool,
    /// Tagging tool to invoke.
    #[serde(default = "default_tool")]
    pub ffmpeg: PathBuf,
}

/// Control options for process execution (cancellation).
#[derive(Debug, Clone, Default)]
pub struct ProcessControl {
    pub cancel_token: Option<CancellationToken>,
}

impl ProcessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }
}

/// Type alias for progress callback: (stage, current, total, message)
pub type ProgressCallback = dyn Fn(&str, u64, u64, &str) + Send + Sync;

/// Run the full pipeline with progress reporting.
pub fn process(options: &ProcessOptions, progress_callback: &ProgressCallback) -> Result<BatchReport, Error> {
    process_with_control(options, &ProcessControl::default(), progress_callback)
}

/// Load, pair and tag. Setup problems are returned as `Err`; per-file failures
/// end up in the report.
pub fn process_with_control(
    options: &ProcessOptions,
    control: &ProcessControl,
    progress_callback: &ProgressCallback,
) -> Result<BatchReport, Error> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| Error::Io { path, source }
    };

    let metadata_path = std::path::absolute(&options.metadata).map_err(io_err(options.metadata.as_path()))?;
    let metadata_dir = metadata_path.parent().unwrap_or(Path::new("/")).to_path_buf();

    let global_cover = match &options.cover {
        Some(cover) => {
            let cover = std::path::absolute(cover).map_err(io_err(cover.as_path()))?;
            if !cover.exists() {
                return Err(Error::CoverNotFound(cover));
            }
            Some(cover)
        }
        None => None,
    };

    let records = metadata::load_metadata(&metadata_path)?;
    tracing::info!("Loaded {} metadata entries from {}", records.len(), metadata_path.display());

    let mut warnings = Vec::new();
    let source = files::InputSource::from_options(options.dir.clone(), options.files.clone())?;
    let inputs = files::resolve_files(&source, &mut warnings)?;
    tracing::info!("Found {} input files", inputs.len());

    if !options.dry_run {
        fs::create_dir_all(&options.outdir).map_err(|source| Error::CreateOutdir {
            path: options.outdir.clone(),
            source,
        })?;
    }

    let pairings = pairing::pair(&records, &inputs, &mut warnings);
    let total = pairings.len() as u64;

    let ctx = PairingContext {
        options,
        metadata_dir: &metadata_dir,
        global_cover: global_cover.as_deref(),
        cancel: control.cancel_token.as_ref(),
    };
    let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
    let mut outcomes = Vec::with_capacity(pairings.len());

    for p in &pairings {
        let output = command::output_path(p.file, &options.outdir, &options.suffix);
        let mut outcome = PairingOutcome {
            index: p.index,
            input: p.file.to_path_buf(),
            output: output.clone(),
            artwork: None,
            result: Ok(Status::Written),
        };

        let first_claim = claimed.get(&output).copied();
        outcome.result = match first_claim {
            Some(first) => Err(PairingError::DuplicateOutput {
                path: output.clone(),
                index: first,
            }),
            None => {
                claimed.insert(output.clone(), p.index);
                run_pairing(&ctx, p, &output, &mut outcome.artwork, &|message: &str| {
                    progress_callback("tag", p.index as u64, total, message)
                })
            }
        };

        if let Err(e) = &outcome.result {
            log_failure(&outcome, e);
        }
        outcomes.push(outcome);
    }

    Ok(BatchReport { warnings, outcomes })
}

struct PairingContext<'a> {
    options: &'a ProcessOptions,
    metadata_dir: &'a Path,
    global_cover: Option<&'a Path>,
    cancel: Option<&'a CancellationToken>,
}

fn run_pairing(
    ctx: &PairingContext,
    p: &pairing::Pairing,
    output: &Path,
    artwork_slot: &mut Option<artwork::Artwork>,
    report: &dyn Fn(&str),
) -> Result<Status, PairingError> {
    if ctx.cancel.map_or(false, |t| t.is_cancelled()) {
        return Err(PairingError::Interrupted);
    }

    let mut art = artwork::resolve_artwork(p.record, ctx.metadata_dir, ctx.global_cover)?;

    // held until the pairing is done; dropping it deletes the staged picture
    let staged = match art {
        None => artwork::extract_embedded(p.file),
        Some(_) => None,
    };
    if let Some(tmp) = &staged {
        art = Some(artwork::Artwork {
            source: artwork::ArtworkSource::Embedded,
            path: tmp.path().to_path_buf(),
        });
    }

    let invocation = command::build_command(
        &ctx.options.ffmpeg,
        p.file,
        p.record,
        art.as_ref().map(|a| a.path.as_path()),
        output,
        ctx.options.overwrite,
    );

    let art_label = art
        .as_ref()
        .map(|a| format!(" (art: {})", a.label()))
        .unwrap_or_default();
    report(&format!(
        "{} -> {}{}",
        display_name(p.file),
        display_name(output),
        art_label
    ));
    *artwork_slot = art;

    let command = invocation.to_shell_line();
    tracing::debug!("{}", command);

    if ctx.options.dry_run {
        return Ok(Status::Planned { command });
    }

    executor::execute(&invocation, output, ctx.options.overwrite, ctx.cancel)?;
    Ok(Status::Written)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn log_failure(outcome: &PairingOutcome, error: &PairingError) {
    let name = display_name(&outcome.input);
    match error {
        PairingError::ExternalToolFailure { stderr, .. } if !stderr.trim().is_empty() => {
            tracing::error!("{}: {}\n{}", name, error, stderr.trim_end());
        }
        _ => tracing::error!("{}: {}", name, error),
    }
}
