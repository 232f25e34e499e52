//! Shared fixtures for the unit tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Create a throwaway repository with one commit. Returns `None` when git
/// is not available in the test environment.
pub(crate) fn scratch_repo() -> Option<TempDir> {
    let dir = TempDir::new().unwrap();
    for args in [
        vec!["init", "-q"],
        vec!["config", "user.email", "tests@figprov.invalid"],
        vec!["config", "user.name", "Test Author"],
    ] {
        if !run_git(dir.path(), &args) {
            return None;
        }
    }
    std::fs::write(dir.path().join("notes.txt"), "first\n").unwrap();
    let committed =
        run_git(dir.path(), &["add", "."]) && run_git(dir.path(), &["commit", "-q", "-m", "initial"]);
    if committed { Some(dir) } else { None }
}

/// HEAD hash of a scratch repo, for asserting against embedded values.
pub(crate) fn head_hash(dir: &Path) -> String {
    let out = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output()
        .unwrap();
    String::from_utf8(out.stdout).unwrap().trim().to_string()
}

fn run_git(dir: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Write a blank 4x4 PNG and return its path.
#[cfg(feature = "png")]
pub(crate) fn write_blank_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    image::RgbaImage::new(4, 4)
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}

/// Write a minimal single-page PDF (no document-info dictionary).
#[cfg(feature = "pdf")]
pub(crate) fn write_blank_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    write_pdf_to(&path);
    path
}

/// Build the minimal single-page PDF at an exact path.
#[cfg(feature = "pdf")]
pub(crate) fn write_pdf_to(path: &Path) {
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
