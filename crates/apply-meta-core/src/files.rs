use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::Error;
use crate::report::Warning;

/// Extensions always treated as media, regardless of what mime_guess says.
const MEDIA_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "mp4", "mov", "mkv", "flac", "wav", "ogg", "opus", "aac", "webm",
];

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// Where the ordered input files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Scan a directory and sort its media files by name.
    Directory(PathBuf),
    /// Use these files in the given order.
    Files(Vec<PathBuf>),
}

impl InputSource {
    pub fn from_options(dir: Option<PathBuf>, files: Option<Vec<PathBuf>>) -> Result<Self, Error> {
        match (dir, files) {
            (Some(_), Some(_)) => Err(Error::ConflictingInputs),
            (Some(dir), None) => Ok(InputSource::Directory(dir)),
            (None, Some(files)) => Ok(InputSource::Files(files)),
            (None, None) => Err(Error::NoInputSource),
        }
    }
}

/// Check whether a path looks like an audio/video file.
pub fn is_media_file(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    if MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
        return true;
    }
    mime_guess::from_path(path).first().map_or(false, |mime| {
        mime.type_() == mime_guess::mime::AUDIO || mime.type_() == mime_guess::mime::VIDEO
    })
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    Text(String),
    /// Digits without leading zeros; ordering by length first gives numeric order.
    Number { len: usize, digits: String },
}

/// Case-insensitive natural sort key: digit runs compare numerically.
fn natural_key(name: &str) -> Vec<Chunk> {
    let normalized: String = name.nfc().collect::<String>().to_lowercase();
    let mut key = Vec::new();
    let mut last = 0;
    for m in DIGITS_RE.find_iter(&normalized) {
        key.push(Chunk::Text(normalized[last..m.start()].to_string()));
        let digits = m.as_str().trim_start_matches('0');
        key.push(Chunk::Number {
            len: digits.len(),
            digits: digits.to_string(),
        });
        last = m.end();
    }
    key.push(Chunk::Text(normalized[last..].to_string()));
    key
}

pub fn compare_names(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b)).then_with(|| a.cmp(b))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// List the media files directly inside `dir`, sorted by name.
pub fn scan_dir(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let io_err = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_media_file(&path) {
            files.push(path);
        }
    }

    files.sort_by_cached_key(|p| {
        let name = file_name(p);
        (natural_key(&name), name)
    });
    Ok(files)
}

/// Produce the ordered input files. Missing explicit inputs are dropped with a warning.
pub fn resolve_files(source: &InputSource, warnings: &mut Vec<Warning>) -> Result<Vec<PathBuf>, Error> {
    let files = match source {
        InputSource::Directory(dir) => scan_dir(dir)?,
        InputSource::Files(list) => list
            .iter()
            .filter(|p| {
                let ok = p.is_file();
                if !ok {
                    tracing::warn!("Input not found, skipping: {}", p.display());
                    warnings.push(Warning::MissingInput(p.to_path_buf()));
                }
                ok
            })
            .cloned()
            .collect(),
    };

    if files.is_empty() {
        return Err(Error::NoFilesFound);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        File::create(&p).unwrap();
        p
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| file_name(p)).collect()
    }

    #[test]
    fn test_media_detection() {
        assert!(is_media_file(Path::new("a.mp3")));
        assert!(is_media_file(Path::new("A.FLAC")));
        assert!(is_media_file(Path::new("clip.webm")));
        assert!(is_media_file(Path::new("track.aiff")));
        assert!(!is_media_file(Path::new("cover.jpg")));
        assert!(!is_media_file(Path::new("notes.txt")));
        assert!(!is_media_file(Path::new("README")));
    }

    #[test]
    fn test_natural_order() {
        let mut v = vec!["Track 10.mp3", "track 2.mp3", "Track 1.mp3", "track 02b.mp3"];
        v.sort_by(|a, b| compare_names(a, b));
        assert_eq!(v, vec!["Track 1.mp3", "track 2.mp3", "track 02b.mp3", "Track 10.mp3"]);
    }

    #[test]
    fn test_case_insensitive_order() {
        let mut v = vec!["b.mp3", "A.mp3", "c.mp3", "B.mp4"];
        v.sort_by(|a, b| compare_names(a, b));
        assert_eq!(v, vec!["A.mp3", "b.mp3", "B.mp4", "c.mp3"]);
    }

    #[test]
    fn test_scan_dir_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "02.mp3");
        touch(dir.path(), "01.mp3");
        touch(dir.path(), "cover.jpg");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("sub.mp3")).unwrap();

        let files = scan_dir(dir.path()).unwrap();
        assert_eq!(names(&files), vec!["01.mp3", "02.mp3"]);
    }

    #[test]
    fn test_explicit_list_keeps_order_and_drops_missing() {
        let dir = tempfile::tempdir().unwrap();
        let b = touch(dir.path(), "b.mp3");
        let a = touch(dir.path(), "a.mp3");
        let missing = dir.path().join("missing.mp3");

        let mut warnings = Vec::new();
        let source = InputSource::Files(vec![b.clone(), missing.clone(), a.clone()]);
        let files = resolve_files(&source, &mut warnings).unwrap();

        assert_eq!(files, vec![b, a]);
        assert_eq!(warnings, vec![Warning::MissingInput(missing)]);
    }

    #[test]
    fn test_empty_inputs_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.txt");
        let mut warnings = Vec::new();

        let err = resolve_files(&InputSource::Directory(dir.path().to_path_buf()), &mut warnings);
        assert!(matches!(err, Err(Error::NoFilesFound)));

        let err = resolve_files(&InputSource::Files(vec![dir.path().join("x.mp3")]), &mut warnings);
        assert!(matches!(err, Err(Error::NoFilesFound)));
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut warnings = Vec::new();
        let err = resolve_files(&InputSource::Directory(dir.path().join("songs")), &mut warnings);
        assert!(matches!(err, Err(Error::Io { .. })));
    }

    #[test]
    fn test_source_selection() {
        let dir = Some(PathBuf::from("songs"));
        let files = Some(vec![PathBuf::from("a.mp3")]);
        assert!(matches!(
            InputSource::from_options(dir.clone(), files.clone()),
            Err(Error::ConflictingInputs)
        ));
        assert!(matches!(InputSource::from_options(None, None), Err(Error::NoInputSource)));
        assert_eq!(
            InputSource::from_options(dir, None).unwrap(),
            InputSource::Directory(PathBuf::from("songs"))
        );
    }
}
