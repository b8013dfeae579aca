use std::fmt;
use std::path::PathBuf;

use crate::artwork::Artwork;
use crate::error::PairingError;

/// Non-fatal conditions collected during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Record and file counts differ; only the first `min` pairs are processed.
    CountMismatch { records: usize, files: usize },
    /// An explicitly listed input does not exist or is not a regular file.
    MissingInput(PathBuf),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::CountMismatch { records, files } => write!(
                f,
                "files={} metadata_entries={}; applying first {} pairs in order",
                files,
                records,
                records.min(files)
            ),
            Warning::MissingInput(path) => {
                write!(f, "input not found, skipping: {}", path.display())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The external tool ran and produced the output file.
    Written,
    /// Dry run: the command that would have been executed.
    Planned { command: String },
}

#[derive(Debug)]
pub struct PairingOutcome {
    pub index: usize,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Artwork attached to the output. Embedded artwork points at a temporary file that
    /// no longer exists once the pairing is finished.
    pub artwork: Option<Artwork>,
    pub result: Result<Status, PairingError>,
}

impl PairingOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a run produced, in pairing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub warnings: Vec<Warning>,
    pub outcomes: Vec<PairingOutcome>,
}

impl BatchReport {
    pub fn failed(&self) -> impl Iterator<Item = &PairingOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &PairingOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    /// True when every pairing succeeded. Warnings do not count as failures.
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn planned_commands(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(Status::Planned { command }) => Some(command.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, result: Result<Status, PairingError>) -> PairingOutcome {
        PairingOutcome {
            index,
            input: PathBuf::from(format!("{index}.mp3")),
            output: PathBuf::from(format!("out/{index}.mp3")),
            artwork: None,
            result,
        }
    }

    #[test]
    fn test_report_counts() {
        let report = BatchReport {
            warnings: vec![Warning::CountMismatch { records: 3, files: 2 }],
            outcomes: vec![
                outcome(0, Ok(Status::Written)),
                outcome(1, Err(PairingError::Interrupted)),
            ],
        };
        assert_eq!(report.succeeded().count(), 1);
        assert_eq!(report.failed().count(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn test_warnings_alone_are_success() {
        let report = BatchReport {
            warnings: vec![Warning::CountMismatch { records: 3, files: 2 }],
            outcomes: vec![outcome(0, Ok(Status::Written))],
        };
        assert!(report.is_success());
    }

    #[test]
    fn test_count_mismatch_message() {
        let w = Warning::CountMismatch { records: 3, files: 2 };
        assert_eq!(
            w.to_string(),
            "files=2 metadata_entries=3; applying first 2 pairs in order"
        );
    }
}
