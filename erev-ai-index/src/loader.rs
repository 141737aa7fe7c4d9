//! Document loading for corpus builds.
//!
//! Reads every supported file in the corpus directory, in sorted order so
//! document ids are stable across rebuilds. `.txt` and `.md` files are
//! read directly (lossily, so stray invalid UTF-8 never aborts a build);
//! `.pdf` files are converted with the `pdftotext` system binary. Text is
//! whitespace-normalized before it becomes a [`Document`], so chunk
//! offsets always refer to the text the index actually stores.

use anyhow::{Context, Result};
use erev_ai_context::{Document, normalize_whitespace};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File extensions the loader accepts.
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "pdf"];

/// Load all supported documents under `dir`.
///
/// A missing or empty directory is not an error: it yields an empty
/// document list, and the caller builds an empty index from it.
pub async fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    if !dir.exists() {
        tracing::warn!(
            "document directory {} does not exist, building an empty index",
            dir.display()
        );
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to scan {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && is_supported(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        let source = relative_name(&path, dir);
        tracing::info!("Reading document: {source}");

        let Some(raw) = read_document_text(&path).await? else {
            continue;
        };
        let text = normalize_whitespace(&raw);
        if text.is_empty() {
            tracing::warn!("{source} contains no text, skipping");
            continue;
        }

        let id = format!("doc-{}", documents.len());
        documents.push(Document::new(id, source, text));
    }

    Ok(documents)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn relative_name(path: &Path, dir: &Path) -> String {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Read one document's raw text, or `None` when the file is unreadable in
/// a way the build should survive (e.g. pdftotext missing).
async fn read_document_text(path: &Path) -> Result<Option<String>> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => Ok(extract_pdf_text(path).await),
        _ => {
            let bytes = fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
    }
}

/// Extract PDF text with the `pdftotext` system binary (poppler).
///
/// Extraction failures skip the document with a warning instead of
/// aborting the whole build.
async fn extract_pdf_text(path: &Path) -> Option<String> {
    let path = path.to_path_buf();
    let output = tokio::process::Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(&path)
        .arg("-")
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            tracing::warn!(
                "pdftotext failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            None
        }
        Err(e) => {
            tracing::warn!(
                "could not run pdftotext for {} (is poppler installed?): {e}",
                path.display()
            );
            None
        }
    }
}
