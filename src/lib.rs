//! # figprov
//!
//! Embed git commit provenance in saved figures — and read it back out.
//!
//! Figures that end up in papers and notebooks rarely say which code
//! produced them. This crate wraps a plotting backend's save routine so
//! that every PNG and PDF it writes carries the current commit hash, date,
//! author, and (when the working tree is dirty) the uncommitted diff.
//! PNG files get one ancillary text chunk per field; PDF files get a
//! single JSON object in the document-info `Keywords` entry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use figprov::hook::{ProvenanceHook, SaveBackend, SaveTarget};
//! use std::sync::Arc;
//!
//! # struct MyBackend;
//! # impl SaveBackend for MyBackend {
//! #     fn save(&self, _: SaveTarget<'_>, _: Option<&str>) -> anyhow::Result<()> { Ok(()) }
//! # }
//! fn main() -> anyhow::Result<()> {
//!     // Wrap the plotting library's native save routine once at startup.
//!     let hook = ProvenanceHook::new(Arc::new(MyBackend)).quiet(false);
//!     figprov::hook::install(hook);
//!
//!     // Every save now embeds the repository state at save time.
//!     figprov::hook::save(SaveTarget::Path("plot.png".as_ref()), None)?;
//!
//!     // The read path is independent of the hook.
//!     if let Some(info) = figprov::meta::read_info("plot.png".as_ref())? {
//!         println!("made by commit {}", info["git-hash"]);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Embedded keys
//!
//! | Key | Value |
//! |-----|-------|
//! | `git-hash` | full commit hash of `HEAD` |
//! | `git-date` | commit date, ISO-8601 |
//! | `git-author` | commit author name |
//! | `git-diff` | raw `git diff HEAD`, only when the tree is dirty |
//!
//! ## Modules
//!
//! - [`git`] — queries the surrounding repository ([`git::CommitInfo`])
//! - [`hook`] — the save interceptor and its process-wide registration
//! - [`meta`] — per-format codecs and the [`meta::read_info`] read path
//!
//! Format support is feature-gated (`png`, `pdf`, both on by default);
//! a build without a format still saves figures, it just can't annotate
//! them.

pub mod git;
pub mod hook;
pub mod meta;

#[cfg(test)]
pub(crate) mod testutil;
