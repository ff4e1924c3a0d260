use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub const NETSCAPE_DOCTYPE: &str = "<!DOCTYPE NETSCAPE-Bookmark-file-1>";

/// `*.html` files in `data_dir` that carry the Netscape doctype, sorted by path.
pub async fn list_bookmark_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(data_dir)
        .await
        .with_context(|| format!("listing data directory: {}", data_dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("html") {
            continue;
        }
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        if content.contains(NETSCAPE_DOCTYPE) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub async fn read_bookmark_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading bookmark file: {}", path.display()))
}

/// `<stem>_organized_<ISO-8601 with ':' and '.' replaced by '-'>.html`
pub fn organized_file_name(source: &Path, now: DateTime<Utc>) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bookmarks".to_string());
    format!("{stem}_organized_{}.html", now.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

pub async fn write_organized_file(
    output_dir: &Path,
    source: &Path,
    content: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("creating output directory: {}", output_dir.display()))?;

    let path = output_dir.join(organized_file_name(source, now));
    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("writing organized file: {}", path.display()))?;
    Ok(path)
}
