//! Flat-file artifacts exchanged between stages.
//!
//! Layout under the output directory, keyed by company slug:
//! ```text
//! <output_dir>/
//! ├── <slug>-positioning.json        collection
//! ├── <slug>-brief.json              synthesis
//! ├── <slug>-positioning-brief.html  rendering
//! └── <slug>-positioning-brief.pdf   rendering (optional)
//! ```
//! Every write goes to a hidden temp file first and is renamed into place,
//! so a crashed stage never leaves a half-written artifact behind.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use positioning_shared::{
    CompanyScrape, PositioningBrief, PositioningError, Result, check_required_keys,
};

pub fn scrape_path(output_dir: &Path, slug: &str) -> PathBuf {
    output_dir.join(format!("{slug}-positioning.json"))
}

pub fn brief_path(output_dir: &Path, slug: &str) -> PathBuf {
    output_dir.join(format!("{slug}-brief.json"))
}

pub fn html_path(output_dir: &Path, slug: &str) -> PathBuf {
    output_dir.join(format!("{slug}-positioning-brief.html"))
}

pub fn pdf_path(output_dir: &Path, slug: &str) -> PathBuf {
    html_path(output_dir, slug).with_extension("pdf")
}

/// Pretty-print `data` and write it atomically.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(|e| {
        PositioningError::invalid_artifact(path, format!("JSON serialization failed: {e}"))
    })?;
    write_text(path, &json)
}

/// Write `content` to a temp file beside `path`, then rename over it.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| PositioningError::io(&dir, e))?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| PositioningError::invalid_artifact(path, "artifact path has no file name"))?;
    let temp = dir.join(format!(".{filename}.tmp"));

    std::fs::write(&temp, content).map_err(|e| PositioningError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| PositioningError::io(path, e))?;

    debug!(path = %path.display(), size = content.len(), "wrote artifact");
    Ok(())
}

fn read_artifact(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(PositioningError::input_not_found(path));
    }
    std::fs::read_to_string(path).map_err(|e| PositioningError::io(path, e))
}

/// Load a collection artifact.
pub fn read_scrape(path: &Path) -> Result<CompanyScrape> {
    let content = read_artifact(path)?;
    serde_json::from_str(&content)
        .map_err(|e| PositioningError::invalid_artifact(path, e.to_string()))
}

/// Load a brief artifact for rendering.
///
/// Only a top-level JSON object is required. Missing structural keys are
/// logged and rendered as empty sections, so hand-edited briefs still render.
pub fn read_brief(path: &Path) -> Result<PositioningBrief> {
    let content = read_artifact(path)?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| PositioningError::invalid_artifact(path, e.to_string()))?;

    if let Err(e) = check_required_keys(&value) {
        warn!(path = %path.display(), error = %e, "brief is incomplete, rendering what is present");
    }

    match value {
        Value::Object(map) => Ok(PositioningBrief::from_object(map)),
        _ => Err(PositioningError::invalid_artifact(
            path,
            "brief must be a JSON object",
        )),
    }
}
