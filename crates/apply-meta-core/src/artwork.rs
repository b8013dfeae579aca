use std::io::Write;
use std::path::{Path, PathBuf};

use id3::frame::Content;
use id3::Tag;
use tempfile::NamedTempFile;

use crate::error::PairingError;
use crate::metadata::MetadataRecord;

const PNG_MAGIC: &[u8] = b"\x89PNG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkSource {
    /// The entry's own `image`.
    Record,
    /// The global fallback cover.
    Cover,
    /// Picture carried over from the source file's ID3 tag.
    Embedded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub source: ArtworkSource,
    pub path: PathBuf,
}

impl Artwork {
    pub fn label(&self) -> String {
        match self.source {
            ArtworkSource::Embedded => "existing".to_string(),
            _ => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string()),
        }
    }
}

/// Pick the artwork for one entry: its own `image` (relative to `metadata_dir`),
/// else the global cover, else none.
pub fn resolve_artwork(
    record: &MetadataRecord,
    metadata_dir: &Path,
    global_cover: Option<&Path>,
) -> Result<Option<Artwork>, PairingError> {
    let artwork = match record.image() {
        Some(image) => Artwork {
            source: ArtworkSource::Record,
            path: metadata_dir.join(image),
        },
        None => match global_cover {
            Some(cover) => Artwork {
                source: ArtworkSource::Cover,
                path: cover.to_path_buf(),
            },
            None => return Ok(None),
        },
    };

    if !artwork.path.exists() {
        return Err(PairingError::ArtworkNotFound(artwork.path));
    }
    Ok(Some(artwork))
}

/// Returns the bytes of the first attached picture (APIC, or PIC in ID3v2.2).
fn read_embedded_picture(path: &Path) -> Option<Vec<u8>> {
    let tag = match Tag::read_from_path(path) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!("No usable ID3 tag in {}: {}", path.display(), e);
            return None;
        }
    };

    let picture = tag
        .frames()
        .filter(|f| f.id() == "APIC" || f.id() == "PIC")
        .find_map(|f| match f.content() {
            Content::Picture(p) if !p.data.is_empty() => Some(p.data.clone()),
            _ => None,
        });
    picture
}

/// Extension from magic bytes; the tag's mime type is often wrong.
fn picture_extension(data: &[u8]) -> &'static str {
    if data.starts_with(PNG_MAGIC) {
        "png"
    } else {
        "jpg"
    }
}

/// Copy an MP3's embedded cover to a temporary file so it survives the audio-only
/// stream mapping. The file is deleted when the returned handle is dropped.
pub fn extract_embedded(input: &Path) -> Option<NamedTempFile> {
    let is_mp3 = input
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("mp3"));
    if !is_mp3 {
        return None;
    }

    let data = read_embedded_picture(input)?;

    let staged = tempfile::Builder::new()
        .prefix("apply-meta-cover-")
        .suffix(&format!(".{}", picture_extension(&data)))
        .tempfile()
        .and_then(|mut tmp| {
            tmp.write_all(&data)?;
            tmp.flush()?;
            Ok(tmp)
        });

    match staged {
        Ok(tmp) => Some(tmp),
        Err(e) => {
            tracing::warn!("Could not stage embedded artwork of {}: {}", input.display(), e);
            None
        }
    }
}
