//! Embedded provenance metadata — per-format codecs and the read path.
//!
//! Each supported container format gets its own codec module with the same
//! two operations:
//!
//! - `embed(path, &CommitInfo)` — attach provenance to an already-saved file
//! - `extract(path)` — read the embedded mapping back out
//!
//! [`read_info`] is the extension-dispatched read entry point used by the
//! CLI. Formats are compiled in behind cargo features (`png`, `pdf`); asking
//! the read path about a format that was compiled out yields the
//! distinguished [`UnsupportedBuild`] error so callers can tell "no
//! metadata" apart from "can't even look".

#[cfg(feature = "pdf")]
pub mod pdf;
#[cfg(feature = "png")]
pub mod png;

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// The extracted metadata mapping: embedded key → raw string value.
pub type InfoMap = BTreeMap<String, String>;

/// A figure container format this crate knows how to augment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Png,
    Pdf,
}

impl Format {
    /// Parse a format name (case-insensitive, no leading dot).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_name(path.extension()?.to_str()?)
    }

    /// Canonical lower-case name (also the file extension).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }

    /// Whether this build carries the codec for the format.
    pub fn supported(&self) -> bool {
        match self {
            Self::Png => cfg!(feature = "png"),
            Self::Pdf => cfg!(feature = "pdf"),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for a recognized format whose codec was compiled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedBuild {
    pub format: Format,
}

impl std::fmt::Display for UnsupportedBuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "this build of figprov was compiled without {} support (enable the `{}` feature)",
            self.format, self.format
        )
    }
}

impl std::error::Error for UnsupportedBuild {}

/// Read the provenance metadata embedded in `path`.
///
/// Dispatches to the matching codec by lower-cased file extension. Unknown
/// extensions and files without embedded metadata yield `Ok(None)`; a
/// recognized format compiled out of this build yields [`UnsupportedBuild`].
pub fn read_info(path: &Path) -> Result<Option<InfoMap>> {
    let Some(format) = Format::from_path(path) else {
        return Ok(None);
    };
    if !format.supported() {
        return Err(UnsupportedBuild { format }.into());
    }

    match format {
        #[cfg(feature = "png")]
        Format::Png => png::extract(path),
        #[cfg(feature = "pdf")]
        Format::Pdf => pdf::extract(path),
        #[allow(unreachable_patterns)]
        _ => unreachable!("unsupported formats are rejected above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_name_is_case_insensitive() {
        assert_eq!(Format::from_name("png"), Some(Format::Png));
        assert_eq!(Format::from_name("PNG"), Some(Format::Png));
        assert_eq!(Format::from_name("Pdf"), Some(Format::Pdf));
        assert_eq!(Format::from_name("svg"), None);
        assert_eq!(Format::from_name(""), None);
    }

    #[test]
    fn format_from_path() {
        assert_eq!(Format::from_path(Path::new("plot.png")), Some(Format::Png));
        assert_eq!(Format::from_path(Path::new("PLOT.PDF")), Some(Format::Pdf));
        assert_eq!(Format::from_path(Path::new("plot.svg")), None);
        assert_eq!(Format::from_path(Path::new("plot")), None);
    }

    #[test]
    fn read_info_unknown_extension_is_absent() {
        let map = read_info(Path::new("report.txt")).unwrap();
        assert!(map.is_none());
    }

    #[cfg(not(feature = "png"))]
    #[test]
    fn read_info_png_compiled_out_is_a_distinguished_error() {
        let err = read_info(Path::new("plot.png")).unwrap_err();
        let unsupported = err
            .downcast_ref::<UnsupportedBuild>()
            .expect("distinguished error");
        assert_eq!(unsupported.format, Format::Png);
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn read_info_pdf_compiled_out_is_a_distinguished_error() {
        let err = read_info(Path::new("plot.pdf")).unwrap_err();
        let unsupported = err
            .downcast_ref::<UnsupportedBuild>()
            .expect("distinguished error");
        assert_eq!(unsupported.format, Format::Pdf);
    }

    #[test]
    fn unsupported_build_error_names_the_feature() {
        let err = UnsupportedBuild { format: Format::Pdf };
        let msg = err.to_string();
        assert!(msg.contains("pdf"));
        assert!(msg.contains("feature"));
    }
}
