//! PDF codec — provenance as a JSON blob in the document-info `Keywords`.
//!
//! The whole [`CommitInfo`] is serialized to a single JSON object (keys
//! sorted, courtesy of `serde_json`'s BTreeMap-backed object type) and
//! stored under one document-info key, so PDF viewers show it as ordinary
//! document keywords.

use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, StringFormat};
use std::path::Path;

use super::InfoMap;
use crate::git::CommitInfo;

/// Attach `info` to an already-saved PDF, rewriting the file in place.
///
/// Creates the document-info dictionary when the writer did not emit one.
pub fn embed(path: &Path, info: &CommitInfo) -> Result<()> {
    let mut doc = Document::load(path)
        .with_context(|| format!("failed to open {} as PDF", path.display()))?;

    let json = serde_json::to_value(info)
        .context("failed to serialize commit info")?
        .to_string();
    let keywords = Object::String(json.into_bytes(), StringFormat::Literal);

    match doc.trailer.get(b"Info").ok().cloned() {
        Some(Object::Reference(id)) => {
            let dict = doc
                .get_object_mut(id)
                .and_then(Object::as_dict_mut)
                .context("document-info reference does not point at a dictionary")?;
            dict.set("Keywords", keywords);
        }
        Some(Object::Dictionary(mut dict)) => {
            dict.set("Keywords", keywords);
            doc.trailer.set("Info", Object::Dictionary(dict));
        }
        _ => {
            let mut dict = Dictionary::new();
            dict.set("Keywords", keywords);
            let id = doc.add_object(Object::Dictionary(dict));
            doc.trailer.set("Info", Object::Reference(id));
        }
    }

    doc.save(path)
        .with_context(|| format!("failed to rewrite {}", path.display()))?;
    Ok(())
}

/// Read the provenance mapping out of a PDF's document-info `Keywords`.
///
/// Returns `Ok(None)` when the file is not parseable as PDF, has no
/// `Keywords` entry, or the entry is not a JSON object. Malformed embedded
/// content is treated as "no metadata", never as an error.
pub fn extract(path: &Path) -> Result<Option<InfoMap>> {
    if !path.exists() {
        anyhow::bail!("failed to read {}: no such file", path.display());
    }
    let doc = match Document::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            log::debug!("{} did not parse as PDF: {e}", path.display());
            return Ok(None);
        }
    };

    let Some(dict) = info_dict(&doc) else {
        return Ok(None);
    };
    let Ok(Object::String(raw, _)) = dict.get(b"Keywords") else {
        return Ok(None);
    };

    let text = String::from_utf8_lossy(raw);
    let Ok(serde_json::Value::Object(fields)) = serde_json::from_str(&text) else {
        log::debug!("{} Keywords entry is not a JSON object", path.display());
        return Ok(None);
    };

    let mut map = InfoMap::new();
    for (key, value) in fields {
        let value = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        map.insert(key, value);
    }

    Ok(if map.is_empty() { None } else { Some(map) })
}

/// Resolve the trailer's Info entry to a dictionary, if any.
fn info_dict(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}
