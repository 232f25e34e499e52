//! PNG codec — provenance fields as ancillary text chunks.
//!
//! Each [`CommitInfo`] field becomes one text chunk: `tEXt` when the value
//! is plain ASCII, uncompressed `iTXt` otherwise (diff text is routinely
//! UTF-8). Extraction returns every text entry in the file verbatim, not
//! just the provenance keys.

use anyhow::{Context, Result, anyhow};
use img_parts::Bytes;
use img_parts::png::{Png, PngChunk};
use std::path::Path;

use super::InfoMap;
use crate::git::{self, CommitInfo};

const CHUNK_TEXT: [u8; 4] = *b"tEXt";
const CHUNK_ITXT: [u8; 4] = *b"iTXt";
const CHUNK_IEND: [u8; 4] = *b"IEND";

/// Attach `info` to an already-saved PNG, rewriting the file in place.
///
/// Any provenance chunks left over from an earlier save are replaced, so
/// repeated embeds of the same info leave the file's metadata unchanged.
pub fn embed(path: &Path, info: &CommitInfo) -> Result<()> {
    let file_bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut png = Png::from_bytes(Bytes::from(file_bytes))
        .map_err(|e| anyhow!("{} is not a valid PNG: {e}", path.display()))?;

    png.chunks_mut().retain(|chunk| {
        parse_text_chunk(chunk).is_none_or(|(key, _)| !is_provenance_key(&key))
    });

    let mut insert_at = png
        .chunks()
        .iter()
        .position(|chunk| chunk.kind() == CHUNK_IEND)
        .unwrap_or(png.chunks().len());
    for (key, value) in info.fields() {
        png.chunks_mut()
            .insert(insert_at, make_text_chunk(key, value));
        insert_at += 1;
    }

    let output = png.encoder().bytes();
    std::fs::write(path, &output)
        .with_context(|| format!("failed to rewrite {}", path.display()))?;
    Ok(())
}

/// Read all textual metadata entries out of a PNG.
///
/// Returns `Ok(None)` when the file is not parseable as PNG or carries no
/// text chunks. Values come back verbatim; no decoding beyond UTF-8.
pub fn extract(path: &Path) -> Result<Option<InfoMap>> {
    let file_bytes = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let png = match Png::from_bytes(Bytes::from(file_bytes)) {
        Ok(png) => png,
        Err(e) => {
            log::debug!("{} did not parse as PNG: {e}", path.display());
            return Ok(None);
        }
    };

    let mut map = InfoMap::new();
    for chunk in png.chunks() {
        if let Some((key, value)) = parse_text_chunk(chunk) {
            map.insert(key, value);
        }
    }

    Ok(if map.is_empty() { None } else { Some(map) })
}

fn is_provenance_key(key: &str) -> bool {
    matches!(
        key,
        git::KEY_HASH | git::KEY_DATE | git::KEY_AUTHOR | git::KEY_DIFF
    )
}

/// Build a text chunk for one key/value pair.
fn make_text_chunk(key: &str, value: &str) -> PngChunk {
    let mut contents = Vec::with_capacity(key.len() + value.len() + 6);
    contents.extend_from_slice(key.as_bytes());
    contents.push(0);
    if value.is_ascii() {
        contents.extend_from_slice(value.as_bytes());
        PngChunk::new(CHUNK_TEXT, Bytes::from(contents))
    } else {
        // iTXt: compression flag + method, empty language tag and
        // translated keyword, then the UTF-8 text.
        contents.extend_from_slice(&[0, 0, 0, 0]);
        contents.extend_from_slice(value.as_bytes());
        PngChunk::new(CHUNK_ITXT, Bytes::from(contents))
    }
}

/// Decode a `tEXt` or uncompressed `iTXt` chunk into a key/value pair.
fn parse_text_chunk(chunk: &PngChunk) -> Option<(String, String)> {
    let contents = chunk.contents();
    match chunk.kind() {
        CHUNK_TEXT => {
            let split = contents.iter().position(|&b| b == 0)?;
            let key = String::from_utf8_lossy(&contents[..split]).into_owned();
            let value = String::from_utf8_lossy(&contents[split + 1..]).into_owned();
            Some((key, value))
        }
        CHUNK_ITXT => {
            let split = contents.iter().position(|&b| b == 0)?;
            let key = String::from_utf8_lossy(&contents[..split]).into_owned();
            let rest = &contents[split + 1..];
            // compression flag + compression method
            if rest.len() < 2 || rest[0] != 0 {
                return None;
            }
            let rest = &rest[2..];
            let lang_end = rest.iter().position(|&b| b == 0)?;
            let rest = &rest[lang_end + 1..];
            let translated_end = rest.iter().position(|&b| b == 0)?;
            let value = String::from_utf8_lossy(&rest[translated_end + 1..]).into_owned();
            Some((key, value))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{KEY_AUTHOR, KEY_DATE, KEY_DIFF, KEY_HASH};
    use crate::testutil::write_blank_png;
    use tempfile::TempDir;

    fn sample_info() -> CommitInfo {
        CommitInfo {
            hash: "abc123".into(),
            date: "2024-01-01T00:00:00".into(),
            author: "A. Researcher".into(),
            diff: None,
        }
    }

    #[test]
    fn embed_then_extract_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = write_blank_png(dir.path(), "plot.png");

        embed(&path, &sample_info()).unwrap();

        let map = extract(&path).unwrap().expect("metadata present");
        assert_eq!(map.get(KEY_HASH).map(String::as_str), Some("abc123"));
        assert_eq!(
            map.get(KEY_DATE).map(String::as_str),
            Some("2024-01-01T00:00:00")
        );
        assert_eq!(
            map.get(KEY_AUTHOR).map(String::as_str),
            Some("A. Researcher")
        );
        assert!(!map.contains_key(KEY_DIFF));
    }

    #[test]
    fn embed_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_blank_png(dir.path(), "plot.png");
        let info = sample_info();

        embed(&path, &info).unwrap();
        let first = extract(&path).unwrap().unwrap();
        embed(&path, &info).unwrap();
        let second = extract(&path).unwrap().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn embed_replaces_stale_provenance() {
        let dir = TempDir::new().unwrap();
        let path = write_blank_png(dir.path(), "plot.png");

        embed(&path, &sample_info()).unwrap();
        let mut newer = sample_info();
        newer.hash = "def456".into();
        embed(&path, &newer).unwrap();

        let map = extract(&path).unwrap().unwrap();
        assert_eq!(map.get(KEY_HASH).map(String::as_str), Some("def456"));
    }

    #[test]
    fn non_ascii_diff_survives_the_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = write_blank_png(dir.path(), "plot.png");
        let mut info = sample_info();
        info.diff = Some("diff --git a/ü.txt b/ü.txt\n+naïve change\n".into());

        embed(&path, &info).unwrap();

        let map = extract(&path).unwrap().unwrap();
        assert_eq!(map.get(KEY_DIFF), info.diff.as_ref());
    }

    #[test]
    fn embedded_file_is_still_a_valid_png() {
        let dir = TempDir::new().unwrap();
        let path = write_blank_png(dir.path(), "plot.png");

        embed(&path, &sample_info()).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 4);
    }

    #[test]
    fn extract_without_metadata_is_absent() {
        let dir = TempDir::new().unwrap();
        let path = write_blank_png(dir.path(), "plain.png");

        assert!(extract(&path).unwrap().is_none());
    }

    #[test]
    fn extract_non_png_is_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bogus.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        assert!(extract(&path).unwrap().is_none());
    }

    #[test]
    fn extract_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(extract(&dir.path().join("absent.png")).is_err());
    }
}
