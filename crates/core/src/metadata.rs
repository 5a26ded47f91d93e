//! Embedded image metadata
//!
//! Images stamped upstream carry two PNG text fields:
//! - `Annotation` - free text shown as the item's note
//! - `Tags` - a comma-joined tag list
//!
//! Both are read back out when a file is uploaded. Anything that is not a PNG
//! (or a PNG without those fields) simply has no annotation and no tags.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// PNG text keyword holding the annotation
pub const ANNOTATION_KEY: &str = "Annotation";

/// PNG text keyword holding the comma-joined tags
pub const TAGS_KEY: &str = "Tags";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Metadata recovered from an image file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedMetadata {
    pub annotation: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("failed to read image: {0}")]
    Io(#[from] io::Error),
    #[error("malformed PNG: {0}")]
    Png(#[from] png::DecodingError),
}

impl MetadataError {
    /// Underlying I/O failure, if the file itself could not be read
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            MetadataError::Io(e) => Some(e),
            MetadataError::Png(png::DecodingError::IoError(e)) => Some(e),
            MetadataError::Png(_) => None,
        }
    }
}

/// Split a comma-joined tag string, trimming and dropping empties
///
/// Order is preserved; duplicates are kept as written.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read annotation and tags from the image at `path`
///
/// Only text chunks preceding the image data are inspected.
pub fn read_embedded_metadata(path: &Path) -> Result<EmbeddedMetadata, MetadataError> {
    let mut file = File::open(path)?;

    let mut signature = [0u8; 8];
    match file.read_exact(&mut signature) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Ok(EmbeddedMetadata::default());
        }
        Err(e) => return Err(e.into()),
    }
    if signature != PNG_SIGNATURE {
        return Ok(EmbeddedMetadata::default());
    }
    file.seek(SeekFrom::Start(0))?;

    let decoder = png::Decoder::new(BufReader::new(file));
    let reader = decoder.read_info()?;
    let info = reader.info();

    let mut fields: Vec<(String, String)> = Vec::new();
    for chunk in &info.uncompressed_latin1_text {
        fields.push((chunk.keyword.clone(), chunk.text.clone()));
    }
    for chunk in &info.compressed_latin1_text {
        fields.push((chunk.keyword.clone(), chunk.get_text()?));
    }
    for chunk in &info.utf8_text {
        fields.push((chunk.keyword.clone(), chunk.get_text()?));
    }

    let mut meta = EmbeddedMetadata::default();
    for (keyword, text) in fields {
        match keyword.as_str() {
            ANNOTATION_KEY if meta.annotation.is_none() && !text.is_empty() => {
                meta.annotation = Some(text);
            }
            TAGS_KEY if meta.tags.is_empty() => {
                meta.tags = split_tags(&text);
            }
            _ => {}
        }
    }

    tracing::trace!(
        path = %path.display(),
        has_annotation = meta.annotation.is_some(),
        tags = meta.tags.len(),
        "read embedded metadata"
    );
    Ok(meta)
}
