use std::path::{Path, PathBuf};

use crate::metadata::MetadataRecord;
use crate::report::Warning;

/// The i-th metadata record matched with the i-th input file.
#[derive(Debug, Clone, Copy)]
pub struct Pairing<'a> {
    pub index: usize,
    pub record: &'a MetadataRecord,
    pub file: &'a Path,
}

/// Zip records and files by position, truncating to the shorter list.
///
/// A length mismatch pushes a single `CountMismatch` onto `warnings`.
pub fn pair<'a>(
    records: &'a [MetadataRecord],
    files: &'a [PathBuf],
    warnings: &mut Vec<Warning>,
) -> Vec<Pairing<'a>> {
    if records.len() != files.len() {
        let warning = Warning::CountMismatch {
            records: records.len(),
            files: files.len(),
        };
        tracing::warn!("{}", warning);
        warnings.push(warning);
    }

    records
        .iter()
        .zip(files)
        .enumerate()
        .map(|(index, (record, file))| Pairing {
            index,
            record,
            file: file.as_path(),
        })
        .collect()
}
