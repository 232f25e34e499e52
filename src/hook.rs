//! The save hook — wraps a plotting backend's save entry point and embeds
//! repository provenance into the files it produces.
//!
//! The plotting backend stays an external collaborator behind the
//! [`SaveBackend`] trait; this module decides the output format, lets the
//! backend do the actual rendering, then augments the written file through
//! the matching codec. Embedding is strictly best-effort: nothing on this
//! path is allowed to fail the underlying save.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::git;
use crate::meta::Format;

/// Where a figure is being saved to.
///
/// Provenance embedding only applies to filesystem destinations; writer
/// destinations are passed straight through to the backend.
pub enum SaveTarget<'a> {
    Path(&'a Path),
    Writer(&'a mut dyn Write),
}

/// The plotting library's native figure-save routine.
///
/// Implementations render the current figure to `target`. The hook forwards
/// `target` and `format` unchanged, except for the documented extension and
/// format normalization.
pub trait SaveBackend: Send + Sync {
    /// Render the figure to the destination, honoring `format` when given.
    fn save(&self, target: SaveTarget<'_>, format: Option<&str>) -> Result<()>;

    /// The backend's process-wide default output format.
    fn default_format(&self) -> &str {
        "png"
    }
}

/// A save entry point that embeds git provenance into its output files.
///
/// Construct one around the backend's native save routine, then either call
/// [`ProvenanceHook::save`] directly or register it process-wide with
/// [`install`]. The wrapped backend remains reachable through
/// [`ProvenanceHook::backend`] for delegation and restoration.
#[derive(Clone)]
pub struct ProvenanceHook {
    backend: Arc<dyn SaveBackend>,
    quiet: bool,
    repo_dir: Option<PathBuf>,
}

impl ProvenanceHook {
    pub fn new(backend: Arc<dyn SaveBackend>) -> Self {
        Self {
            backend,
            quiet: false,
            repo_dir: None,
        }
    }

    /// Suppress the dirty-working-tree warning.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Pin the repository queried for provenance. Defaults to the process
    /// working directory, like the VCS command line itself.
    pub fn repo_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.repo_dir = Some(dir.into());
        self
    }

    /// The wrapped native save routine.
    pub fn backend(&self) -> &Arc<dyn SaveBackend> {
        &self.backend
    }

    /// Save a figure, embedding provenance when the format supports it.
    ///
    /// Format resolution: explicit `format` argument, else the filename
    /// extension, else [`SaveBackend::default_format`]; comparison is
    /// case-insensitive. Unrecognized formats and non-path targets fall
    /// back to the unmodified backend save with a diagnostic.
    pub fn save(&self, target: SaveTarget<'_>, format: Option<&str>) -> Result<()> {
        let path = match target {
            SaveTarget::Path(path) => path,
            SaveTarget::Writer(writer) => {
                log::warn!("provenance embedding only supports filename destinations");
                return self.backend.save(SaveTarget::Writer(writer), format);
            }
        };

        let resolved = resolve_format(path, format, self.backend.default_format());
        match Format::from_name(&resolved) {
            Some(Format::Png) => self.save_png(path, format),
            Some(Format::Pdf) => self.save_pdf(path, format),
            None => {
                log::warn!("unsupported save format: {resolved:?}");
                self.backend.save(SaveTarget::Path(path), format)
            }
        }
    }

    /// Convenience wrapper for path destinations.
    pub fn save_path(&self, path: impl AsRef<Path>, format: Option<&str>) -> Result<()> {
        self.save(SaveTarget::Path(path.as_ref()), format)
    }

    /// PNG: save first, then re-open the file and attach the metadata.
    fn save_png(&self, path: &Path, format: Option<&str>) -> Result<()> {
        let path = path.with_extension("png");
        self.backend
            .save(SaveTarget::Path(&path), format)
            .with_context(|| format!("backend failed to save {}", path.display()))?;

        #[cfg(feature = "png")]
        if let Some(info) = git::query_in(self.repo_dir.as_deref(), self.quiet) {
            if let Err(e) = crate::meta::png::embed(&path, &info) {
                log::warn!("could not embed provenance in {}: {e:#}", path.display());
            }
        }
        #[cfg(not(feature = "png"))]
        log::warn!(
            "png support is compiled out; {} saved without provenance",
            path.display()
        );

        Ok(())
    }

    /// PDF: query the repository first — with nothing to attach, this is a
    /// plain save with the caller's original destination.
    fn save_pdf(&self, path: &Path, format: Option<&str>) -> Result<()> {
        #[cfg(feature = "pdf")]
        {
            let Some(info) = git::query_in(self.repo_dir.as_deref(), self.quiet) else {
                return self.backend.save(SaveTarget::Path(path), format);
            };

            let path = path.with_extension("pdf");
            self.backend
                .save(SaveTarget::Path(&path), Some("pdf"))
                .with_context(|| format!("backend failed to save {}", path.display()))?;

            if let Err(e) = crate::meta::pdf::embed(&path, &info) {
                log::warn!("could not embed provenance in {}: {e:#}", path.display());
            }
            Ok(())
        }
        #[cfg(not(feature = "pdf"))]
        {
            log::warn!(
                "pdf support is compiled out; {} saved without provenance",
                path.display()
            );
            self.backend.save(SaveTarget::Path(path), format)
        }
    }
}

/// Resolve the output format: explicit argument, else extension, else the
/// backend default. Always lower-cased.
fn resolve_format(path: &Path, format: Option<&str>, default: &str) -> String {
    format
        .map(str::to_owned)
        .or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| default.to_owned())
        .to_ascii_lowercase()
}

// Process-wide registration. One hook per process, mirroring the single
// save entry point of the plotting session it wraps.
static INSTALLED: RwLock<Option<ProvenanceHook>> = RwLock::new(None);

/// Register `hook` as the process-wide save entry point.
///
/// Idempotent-safe: installing again simply rebinds, returning the
/// previously installed hook (whose backend is the original save routine).
pub fn install(hook: ProvenanceHook) -> Option<ProvenanceHook> {
    INSTALLED
        .write()
        .unwrap_or_else(|poison| poison.into_inner())
        .replace(hook)
}

/// The currently installed hook, if any.
pub fn installed() -> Option<ProvenanceHook> {
    INSTALLED
        .read()
        .unwrap_or_else(|poison| poison.into_inner())
        .clone()
}

/// Remove the installed hook, handing it back for restoration.
pub fn uninstall() -> Option<ProvenanceHook> {
    INSTALLED
        .write()
        .unwrap_or_else(|poison| poison.into_inner())
        .take()
}

/// Save through the process-wide hook installed with [`install`].
pub fn save(target: SaveTarget<'_>, format: Option<&str>) -> Result<()> {
    let hook = installed().context("no provenance hook installed")?;
    hook.save(target, format)
}
