mod common;

use ai_bookmark_organizer::domain::error::ProviderErrorKind;
use ai_bookmark_organizer::infrastructure::netscape_parser::parse_bookmark_html;
use ai_bookmark_organizer::usecase::event::AppEvent;
use ai_bookmark_organizer::usecase::organize::{organize_all, OrganizeConfig};
use common::{fast_options, http_error, quota_exhausted, reply, ScriptedProvider};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::sync::mpsc;

const EXPORT: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
    <DT><H3 ADD_DATE="1" LAST_MODIFIED="2">Old stuff</H3>
    <DL><p>
        <DT><A HREF="https://doc.rust-lang.org" ADD_DATE="3">Rust docs</A>
        <DT><A HREF="https://www.imdb.com" ADD_DATE="4">IMDb</A>
    </DL><p>
    <DT><A HREF="https://news.ycombinator.com" ADD_DATE="5">Hacker News</A>
</DL><p>
"#;

struct Workspace {
    _dir: TempDir,
    data: PathBuf,
    output: PathBuf,
}

fn workspace(files: &[(&str, &str)]) -> Workspace {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("data");
    fs::create_dir(&data).expect("mkdir data");
    for (name, content) in files {
        fs::write(data.join(name), content).expect("write fixture");
    }
    let output = dir.path().join("output");
    Workspace {
        _dir: dir,
        data,
        output,
    }
}

fn config(ws: &Workspace, max_folders: Option<usize>) -> OrganizeConfig {
    OrganizeConfig {
        data_dir: ws.data.clone(),
        output_dir: ws.output.clone(),
        max_folders,
        classify: fast_options(50),
        custom_folder_prompt: None,
    }
}

fn outputs(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

/// Pre-order: Rust docs, IMDb (inside "Old stuff") come after the root's Hacker News.
fn three_folder_reply() -> String {
    reply(&[
        ("news, tech", "News"),
        ("rust, docs", "Programming/Rust"),
        ("movies", "Movies"),
    ])
}

#[tokio::test]
async fn organizes_a_file_end_to_end() {
    let ws = workspace(&[("chrome.html", EXPORT), ("notes.txt", "ignored")]);
    let provider = ScriptedProvider::new(vec![Ok(three_folder_reply())]);

    let run = organize_all(&provider, &config(&ws, None), &None)
        .await
        .expect("run");

    assert!(run.halted.is_none());
    assert_eq!(run.stats.files_found, 1);
    assert_eq!(run.stats.files_processed, 1);
    assert_eq!(run.stats.bookmarks_seen, 3);
    assert_eq!(run.stats.bookmarks_placed, 3);
    assert_eq!(run.stats.bookmarks_dropped, 0);

    let written = outputs(&ws.output);
    assert_eq!(written.len(), 1);
    let name = written[0].file_name().expect("name").to_string_lossy().into_owned();
    assert!(name.starts_with("chrome_organized_"), "{name}");
    assert!(name.ends_with("Z.html"), "{name}");

    let html = fs::read_to_string(&written[0]).expect("read output");
    assert!(html.contains("DO NOT EDIT!"));
    let tree = parse_bookmark_html(&html).expect("parse output");
    let rust = tree.folder_at("Programming/Rust").expect("rust folder");
    assert_eq!(rust.bookmarks[0].url, "https://doc.rust-lang.org");
    assert_eq!(rust.bookmarks[0].tags, vec!["rust", "docs"]);
    assert!(tree.folder_at("Old stuff").is_none());
}

#[tokio::test]
async fn grouping_builds_top_level_categories() {
    let ws = workspace(&[("edge.html", EXPORT)]);
    let grouping = "Here you go:\n```json\n{\"Technology\": [\"Programming/Rust\", \"News\"], \"Leisure\": [\"Movies\"]}\n```";
    let provider = ScriptedProvider::new(vec![Ok(three_folder_reply()), Ok(grouping.to_string())]);

    let run = organize_all(&provider, &config(&ws, Some(2)), &None)
        .await
        .expect("run");

    assert_eq!(provider.call_count(), 2);
    let grouping_request = &provider.requests()[1];
    assert!(grouping_request.prompt.contains("create exactly 2 broad top-level categories"));
    assert!(grouping_request.prompt.contains("Programming/Rust"));

    assert_eq!(run.stats.bookmarks_placed, 3);
    let tree = parse_bookmark_html(&fs::read_to_string(&outputs(&ws.output)[0]).expect("read"))
        .expect("parse");
    let top: Vec<&str> = tree.root.sub_folders.iter().map(|f| f.title.as_str()).collect();
    assert_eq!(top, vec!["Leisure", "Technology"]);
    assert!(tree.folder_at("Technology/Programming - Rust").is_some());
    assert!(tree.folder_at("Technology/News").is_some());
    assert!(tree.folder_at("Leisure/Movies").is_some());
}

#[tokio::test]
async fn malformed_grouping_keeps_suggested_folders() {
    let ws = workspace(&[("edge.html", EXPORT)]);
    let provider = ScriptedProvider::new(vec![
        Ok(three_folder_reply()),
        Ok("I cannot do that".to_string()),
    ]);

    let run = organize_all(&provider, &config(&ws, Some(2)), &None)
        .await
        .expect("run");

    assert!(run.halted.is_none());
    assert_eq!(run.stats.files_processed, 1);
    let tree = parse_bookmark_html(&fs::read_to_string(&outputs(&ws.output)[0]).expect("read"))
        .expect("parse");
    assert!(tree.folder_at("Movies").is_some());
    assert!(tree.folder_at("Programming/Rust").is_some());
}

#[tokio::test]
async fn broken_file_is_skipped_and_run_continues() {
    let broken = "<!DOCTYPE NETSCAPE-Bookmark-file-1>\n<TITLE>Bookmarks</TITLE>\nno list here";
    let ws = workspace(&[("a_broken.html", broken), ("b_good.html", EXPORT)]);
    let provider = ScriptedProvider::new(vec![Ok(three_folder_reply())]);
    let (tx, mut rx) = mpsc::channel::<AppEvent>(256);

    let run = organize_all(&provider, &config(&ws, None), &Some(tx))
        .await
        .expect("run");

    assert_eq!(run.stats.files_found, 2);
    assert_eq!(run.stats.files_skipped, 1);
    assert_eq!(run.stats.files_processed, 1);
    assert_eq!(outputs(&ws.output).len(), 1);

    let mut skipped = Vec::new();
    let mut finished = false;
    while let Ok(ev) = rx.try_recv() {
        match ev {
            AppEvent::FileSkipped { path, reason } => skipped.push((path, reason)),
            AppEvent::Finished { .. } => finished = true,
            _ => {}
        }
    }
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].0.ends_with("a_broken.html"));
    assert!(skipped[0].1.contains("Invalid bookmark file format"));
    assert!(finished);
}

#[tokio::test]
async fn quota_exhaustion_halts_remaining_files() {
    let ws = workspace(&[("a.html", EXPORT), ("b.html", EXPORT)]);
    let provider = ScriptedProvider::new(vec![Err(quota_exhausted()), Ok(three_folder_reply())]);

    let run = organize_all(&provider, &config(&ws, None), &None)
        .await
        .expect("run");

    assert_eq!(provider.call_count(), 1);
    assert_eq!(
        run.halted.as_ref().map(|e| e.kind),
        Some(ProviderErrorKind::QuotaExhausted)
    );
    assert_eq!(run.stats.files_found, 2);
    assert_eq!(run.stats.files_processed, 0);
    assert_eq!(run.stats.files_skipped, 1);
    assert!(outputs(&ws.output).is_empty());
}

#[tokio::test]
async fn partial_classification_is_written_before_halting() {
    let ws = workspace(&[("a.html", EXPORT), ("b.html", EXPORT)]);
    let provider = ScriptedProvider::new(vec![
        Ok(reply(&[("news", "News"), ("rust", "Programming")])),
        Err(quota_exhausted()),
    ]);
    let mut cfg = config(&ws, Some(3));
    cfg.classify = fast_options(2);

    let run = organize_all(&provider, &cfg, &None).await.expect("run");

    // two classification batches for a.html, no grouping call, nothing for b.html
    assert_eq!(provider.call_count(), 2);
    assert!(run.halted.is_some());
    assert_eq!(run.stats.files_processed, 1);
    assert_eq!(run.stats.bookmarks_placed, 2);
    assert_eq!(run.stats.bookmarks_dropped, 1);

    let written = outputs(&ws.output);
    assert_eq!(written.len(), 1);
    assert!(written[0]
        .file_name()
        .expect("name")
        .to_string_lossy()
        .starts_with("a_organized_"));
}

#[tokio::test]
async fn quota_halt_survives_a_failed_write() {
    let ws = workspace(&[("a.html", EXPORT), ("b.html", EXPORT)]);
    fs::write(&ws.output, "not a directory").expect("block output dir");
    let provider = ScriptedProvider::new(vec![
        Ok(reply(&[("news", "News")])),
        Err(quota_exhausted()),
        Ok(reply(&[("news", "News")])),
        Ok(reply(&[("news", "News")])),
    ]);
    let mut cfg = config(&ws, None);
    cfg.classify = fast_options(1);
    let (tx, mut rx) = mpsc::channel::<AppEvent>(256);

    let run = organize_all(&provider, &cfg, &Some(tx)).await.expect("run");

    assert_eq!(provider.call_count(), 2);
    assert_eq!(
        run.halted.as_ref().map(|e| e.kind),
        Some(ProviderErrorKind::QuotaExhausted)
    );
    assert_eq!(run.stats.files_processed, 0);
    assert_eq!(run.stats.files_skipped, 1);
    assert_eq!(run.stats.bookmarks_seen, 3);
    assert_eq!(run.stats.bookmarks_dropped, 3);

    let mut skipped = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if let AppEvent::FileSkipped { path, .. } = ev {
            skipped.push(path);
        }
    }
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].ends_with("a.html"));
}

#[tokio::test]
async fn unclassified_file_counts_its_bookmarks_as_dropped() {
    let ws = workspace(&[("a.html", EXPORT)]);
    let provider = ScriptedProvider::new(vec![Err(http_error(400, "invalid_request_error"))]);

    let run = organize_all(&provider, &config(&ws, None), &None)
        .await
        .expect("run");

    assert!(run.halted.is_none());
    assert_eq!(run.stats.files_skipped, 1);
    assert_eq!(run.stats.batches_failed, 1);
    assert_eq!(run.stats.bookmarks_seen, 3);
    assert_eq!(run.stats.bookmarks_placed, 0);
    assert_eq!(run.stats.bookmarks_dropped, 3);
    assert!(outputs(&ws.output).is_empty());
}

#[tokio::test]
async fn missing_data_dir_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = OrganizeConfig {
        data_dir: dir.path().join("nope"),
        output_dir: dir.path().join("out"),
        ..OrganizeConfig::default()
    };
    let provider = ScriptedProvider::default();

    let err = organize_all(&provider, &cfg, &None).await.unwrap_err();
    assert!(format!("{err:#}").contains("listing data directory"));
}
