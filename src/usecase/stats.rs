use crate::domain::model::{BookmarkTree, Folder};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub bookmark_count: usize,
    /// Includes the root folder.
    pub folder_count: usize,
}

pub fn count_bookmarks_and_folders(tree: &BookmarkTree) -> TreeStats {
    let mut stats = TreeStats::default();
    let mut stack: Vec<&Folder> = vec![&tree.root];
    while let Some(folder) = stack.pop() {
        stats.bookmark_count += folder.bookmarks.len();
        stats.folder_count += 1;
        stack.extend(folder.sub_folders.iter());
    }
    stats
}

/// Cumulative counters for one run over all input files.
///
/// For files that were parsed, `bookmarks_seen == bookmarks_placed + bookmarks_dropped`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub files_found: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub bookmarks_seen: usize,
    pub bookmarks_classified: usize,
    pub bookmarks_placed: usize,
    pub bookmarks_dropped: usize,
    pub batches_failed: usize,
}
