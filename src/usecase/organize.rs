//! Per-file and whole-run organize workflow.

use crate::domain::error::ProviderError;
use crate::domain::model::{classification_map, BookmarkTree, CategoryGrouping};
use crate::domain::traits::CompletionProvider;
use crate::infrastructure::file_store::{list_bookmark_files, read_bookmark_file, write_organized_file};
use crate::infrastructure::netscape_parser::parse_bookmark_html;
use crate::infrastructure::netscape_writer::render_bookmark_html;
use crate::usecase::classify::{ClassificationOrchestrator, ClassifyOptions};
use crate::usecase::event::{emit, AppEvent, EventSink};
use crate::usecase::group::CategoryGrouper;
use crate::usecase::reorganize::{rebuild, RebuildReport};
use crate::usecase::stats::{count_bookmarks_and_folders, RunStats, TreeStats};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct OrganizeConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Target number of top-level categories; `None` or 0 disables grouping.
    pub max_folders: Option<usize>,
    pub classify: ClassifyOptions,
    pub custom_folder_prompt: Option<String>,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            max_folders: None,
            classify: ClassifyOptions::default(),
            custom_folder_prompt: None,
        }
    }
}

impl OrganizeConfig {
    pub fn grouping_target(&self) -> Option<usize> {
        self.max_folders.filter(|n| *n > 0)
    }
}

/// Result of classifying, grouping and rebuilding one tree.
#[derive(Debug, Clone, Default)]
pub struct TreeOutcome {
    pub initial: TreeStats,
    pub classified: usize,
    pub failed_batches: usize,
    pub grouping: Option<CategoryGrouping>,
    /// `None` when nothing was classified and reorganization was skipped.
    pub rebuilt: Option<RebuildReport>,
    /// Quota or credential failure that must stop the run.
    pub halted: Option<ProviderError>,
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub source: PathBuf,
    pub output: Option<PathBuf>,
    pub outcome: TreeOutcome,
    /// Rendering or writing the organized copy failed. The outcome, including
    /// any halt, is still reported.
    pub write_error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub stats: RunStats,
    pub halted: Option<ProviderError>,
}

pub async fn organize_tree(
    provider: &dyn CompletionProvider,
    tree: &BookmarkTree,
    config: &OrganizeConfig,
    sink: &EventSink,
) -> TreeOutcome {
    let initial = count_bookmarks_and_folders(tree);
    let bookmarks: Vec<_> = tree.bookmarks().into_iter().cloned().collect();

    info!("Classifying {} bookmarks...", bookmarks.len());
    emit(sink, AppEvent::PhaseStarted { name: "classify".to_string() }).await;
    let classified = ClassificationOrchestrator::new(provider, config.classify.clone())
        .with_sink(sink.clone())
        .classify_all(&bookmarks)
        .await;
    emit(sink, AppEvent::PhaseFinished { name: "classify".to_string() }).await;

    let mut outcome = TreeOutcome {
        initial,
        classified: classified.classifications.len(),
        failed_batches: classified.failed_batches,
        halted: classified.aborted,
        ..TreeOutcome::default()
    };

    if classified.classifications.is_empty() {
        warn!("No bookmarks were classified. Skipping reorganization.");
        return outcome;
    }
    if outcome.classified < bookmarks.len() {
        warn!(
            "Only {} out of {} bookmarks were classified.",
            outcome.classified,
            bookmarks.len()
        );
    }

    if let Some(target) = config.grouping_target() {
        if let Some(err) = &outcome.halted {
            emit(
                sink,
                AppEvent::GroupingSkipped {
                    reason: format!("classification aborted: {err}"),
                },
            )
            .await;
        } else {
            let folders: BTreeSet<String> = classified
                .classifications
                .iter()
                .map(|c| c.suggested_folder.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect();
            outcome.grouping = group(provider, config, sink, &folders, target, &mut outcome.halted).await;
        }
    }

    info!("Reorganizing bookmarks...");
    emit(sink, AppEvent::PhaseStarted { name: "reorganize".to_string() }).await;
    let map = classification_map(&classified.classifications);
    let report = rebuild(tree, &map, outcome.grouping.as_ref());

    for path in &report.flattened {
        emit(
            sink,
            AppEvent::PathFlattened {
                original: path.original.clone(),
                flattened: path.flattened.clone(),
            },
        )
        .await;
    }
    if report.dropped() > 0 {
        emit(
            sink,
            AppEvent::BookmarksDropped {
                unclassified: report.unclassified,
                unresolved: report.unresolved,
            },
        )
        .await;
    }
    emit(sink, AppEvent::PhaseFinished { name: "reorganize".to_string() }).await;

    log_final_stats(&initial, &report, config.grouping_target());
    outcome.rebuilt = Some(report);
    outcome
}

async fn group(
    provider: &dyn CompletionProvider,
    config: &OrganizeConfig,
    sink: &EventSink,
    folders: &BTreeSet<String>,
    target: usize,
    halted: &mut Option<ProviderError>,
) -> Option<CategoryGrouping> {
    info!(
        "Found {} folders to organize into {} categories",
        folders.len(),
        target
    );
    emit(sink, AppEvent::PhaseStarted { name: "group".to_string() }).await;

    let grouped = CategoryGrouper::new(provider, config.classify.retry)
        .with_custom_prompt(config.custom_folder_prompt.clone())
        .with_sink(sink.clone())
        .group_folders(folders, target)
        .await;

    let grouping = match grouped {
        Ok(grouping) => {
            info!("Created {} top-level categories", grouping.len());
            for (category, members) in &grouping.categories {
                info!(category = %category, folders = members.len(), "category");
            }
            emit(
                sink,
                AppEvent::CategoriesCreated {
                    requested: target,
                    created: grouping.len(),
                },
            )
            .await;
            Some(grouping)
        }
        Err(err) => {
            warn!("Folder grouping failed, keeping suggested folders: {err}");
            emit(sink, AppEvent::GroupingSkipped { reason: err.to_string() }).await;
            if err.aborts_run() {
                *halted = Some(err);
            }
            None
        }
    };

    emit(sink, AppEvent::PhaseFinished { name: "group".to_string() }).await;
    grouping
}

fn log_final_stats(initial: &TreeStats, report: &RebuildReport, target: Option<usize>) {
    let final_stats = count_bookmarks_and_folders(&report.tree);
    let top_level = report.tree.root.sub_folders.len();

    info!(
        "Final structure: {} bookmarks ({} unclassified), {} total folders, {} top-level categories",
        final_stats.bookmark_count,
        report.dropped(),
        final_stats.folder_count,
        top_level
    );
    for folder in &report.tree.root.sub_folders {
        info!(folder = %folder.title, subfolders = folder.sub_folders.len(), "top-level folder");
    }

    if let Some(expected) = target {
        if top_level != expected {
            warn!(
                "Found {} top-level folders instead of the expected {}",
                top_level, expected
            );
        }
    }
    if report.dropped() > 0 {
        warn!("{} bookmarks were not placed in the new structure", report.dropped());
    }
    if initial.bookmark_count != final_stats.bookmark_count + report.dropped() {
        error!(
            "Bookmark counts do not reconcile: {} before, {} placed, {} dropped",
            initial.bookmark_count,
            final_stats.bookmark_count,
            report.dropped()
        );
    }
}

pub async fn organize_file(
    provider: &dyn CompletionProvider,
    source: &Path,
    config: &OrganizeConfig,
    sink: &EventSink,
) -> Result<FileReport> {
    info!("Processing {}...", source.display());
    let html = read_bookmark_file(source).await?;
    let tree = parse_bookmark_html(&html)
        .with_context(|| format!("parsing bookmark file: {}", source.display()))?;

    let initial = count_bookmarks_and_folders(&tree);
    info!(
        "Initial structure: {} bookmarks, {} folders",
        initial.bookmark_count, initial.folder_count
    );
    emit(
        sink,
        AppEvent::FileStarted {
            path: source.display().to_string(),
            stats: initial,
        },
    )
    .await;

    let outcome = organize_tree(provider, &tree, config, sink).await;

    let Some(report) = &outcome.rebuilt else {
        emit(
            sink,
            AppEvent::FileSkipped {
                path: source.display().to_string(),
                reason: "no bookmarks were classified".to_string(),
            },
        )
        .await;
        return Ok(FileReport {
            source: source.to_path_buf(),
            output: None,
            outcome,
            write_error: None,
        });
    };

    let content = render_bookmark_html(&report.tree);
    let output = match write_organized_file(&config.output_dir, source, &content, chrono::Utc::now()).await {
        Ok(output) => output,
        Err(err) => {
            let reason = format!("{err:#}");
            return Ok(FileReport {
                source: source.to_path_buf(),
                output: None,
                outcome,
                write_error: Some(reason),
            });
        }
    };
    info!("Created organized bookmark file: {}", output.display());
    emit(
        sink,
        AppEvent::FileWritten {
            path: output.display().to_string(),
            stats: count_bookmarks_and_folders(&report.tree),
        },
    )
    .await;

    Ok(FileReport {
        source: source.to_path_buf(),
        output: Some(output),
        outcome,
        write_error: None,
    })
}

/// Organizes every bookmark file in the data directory, one at a time.
///
/// A file that fails to read, parse or write is skipped. A quota or credential
/// failure stops the run after the current file, even if that file could not
/// be written. Bookmarks of a file that produced no output count as dropped.
pub async fn organize_all(
    provider: &dyn CompletionProvider,
    config: &OrganizeConfig,
    sink: &EventSink,
) -> Result<RunOutcome> {
    let files = list_bookmark_files(&config.data_dir).await?;
    let mut run = RunOutcome::default();
    run.stats.files_found = files.len();

    if files.is_empty() {
        warn!("No bookmark files found in {}", config.data_dir.display());
    }

    for (i, path) in files.iter().enumerate() {
        match organize_file(provider, path, config, sink).await {
            Ok(report) => {
                if let Some(reason) = &report.write_error {
                    warn!("Skipping {}: {reason}", path.display());
                    emit(
                        sink,
                        AppEvent::FileSkipped {
                            path: path.display().to_string(),
                            reason: reason.clone(),
                        },
                    )
                    .await;
                }

                let outcome = report.outcome;
                run.stats.bookmarks_seen += outcome.initial.bookmark_count;
                run.stats.bookmarks_classified += outcome.classified;
                run.stats.batches_failed += outcome.failed_batches;

                match &outcome.rebuilt {
                    Some(rebuilt) if report.output.is_some() => {
                        run.stats.files_processed += 1;
                        run.stats.bookmarks_placed += rebuilt.placed;
                        run.stats.bookmarks_dropped += rebuilt.dropped();
                    }
                    _ => {
                        run.stats.files_skipped += 1;
                        run.stats.bookmarks_dropped += outcome.initial.bookmark_count;
                    }
                }

                if let Some(err) = outcome.halted {
                    error!(
                        "Stopping: {err}. {} file(s) left unprocessed.",
                        files.len() - i - 1
                    );
                    run.halted = Some(err);
                    break;
                }
            }
            Err(err) => {
                warn!("Skipping {}: {err:#}", path.display());
                emit(
                    sink,
                    AppEvent::FileSkipped {
                        path: path.display().to_string(),
                        reason: format!("{err:#}"),
                    },
                )
                .await;
                run.stats.files_skipped += 1;
            }
        }
    }

    emit(
        sink,
        AppEvent::Finished {
            stats: run.stats.clone(),
        },
    )
    .await;
    Ok(run)
}
