use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Setup errors that abort the whole run before any pairing is processed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create output directory {}", .path.display())]
    CreateOutdir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid metadata format: {0}")]
    InvalidMetadataFormat(String),

    #[error("no input files found")]
    NoFilesFound,

    #[error("an input directory and an explicit file list are mutually exclusive")]
    ConflictingInputs,

    #[error("no input source: provide either an input directory or an explicit file list")]
    NoInputSource,

    #[error("global cover not found: {}", .0.display())]
    CoverNotFound(PathBuf),
}

/// Failure of a single pairing. The batch records it and moves on.
#[derive(Debug, Error)]
pub enum PairingError {
    #[error("artwork image not found: {}", .0.display())]
    ArtworkNotFound(PathBuf),

    #[error("output already exists and overwriting is disabled: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("output {} is already produced by pairing #{}", .path.display(), .index + 1)]
    DuplicateOutput { path: PathBuf, index: usize },

    #[error("failed to start {}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("external tool failed ({status})")]
    ExternalToolFailure { status: ExitStatus, stderr: String },

    #[error("external tool succeeded but {} was not created", .0.display())]
    OutputMissing(PathBuf),

    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] io::Error),
}
