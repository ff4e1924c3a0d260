//! Rebuilds a bookmark tree from per-bookmark folder assignments.

mod arena;
mod keywords;
mod path;
mod sort;

pub use arena::{FolderArena, Handle};
pub use keywords::{best_category, GENERIC_CATEGORY};
pub use path::{
    best_substring_match, flatten, split_segments, PathResolver, ResolvedPath, FLATTEN_SEPARATOR,
    MAX_DEPTH,
};
pub use sort::sort_tree;

use crate::domain::model::{Bookmark, BookmarkTree, CategoryGrouping, ClassificationMap, Placement};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlattenedPath {
    pub original: String,
    pub flattened: String,
}

#[derive(Debug, Clone)]
pub struct RebuildReport {
    pub tree: BookmarkTree,
    pub placed: usize,
    /// Bookmarks with no classification.
    pub unclassified: usize,
    /// Bookmarks whose folder path could not be resolved.
    pub unresolved: usize,
    /// Each distinct path that was flattened, in first-seen order.
    pub flattened: Vec<FlattenedPath>,
}

impl RebuildReport {
    pub fn dropped(&self) -> usize {
        self.unclassified + self.unresolved
    }
}

pub struct HierarchyBuilder<'g> {
    resolver: PathResolver<'g>,
    arena: FolderArena,
    placed: usize,
    unclassified: usize,
    unresolved: usize,
    flattened: Vec<FlattenedPath>,
    seen_flattened: HashSet<String>,
}

impl<'g> HierarchyBuilder<'g> {
    pub fn new(grouping: Option<&'g CategoryGrouping>, timestamp: i64) -> Self {
        Self::with_resolver(PathResolver::new(grouping), timestamp)
    }

    pub fn with_resolver(resolver: PathResolver<'g>, timestamp: i64) -> Self {
        Self {
            resolver,
            arena: FolderArena::new(timestamp),
            placed: 0,
            unclassified: 0,
            unresolved: 0,
            flattened: Vec::new(),
            seen_flattened: HashSet::new(),
        }
    }

    /// Resolves `raw_path` to a folder, creating it on first use.
    pub fn folder_for(&mut self, raw_path: &str) -> Option<Handle> {
        let resolved = self.resolver.resolve(raw_path)?;

        if let Some(original) = &resolved.flattened_from {
            if self.seen_flattened.insert(original.clone()) {
                debug!(original = %original, flattened = %resolved.key(), "flattened deep folder path");
                self.flattened.push(FlattenedPath {
                    original: original.clone(),
                    flattened: resolved.key(),
                });
            }
        }

        Some(self.arena.get_or_create(&resolved.segments))
    }

    /// Places a copy of `bookmark` carrying the classification's tags, or
    /// counts it as dropped.
    pub fn place(&mut self, bookmark: &Bookmark, placement: Option<&Placement>) -> Option<Handle> {
        let Some(placement) = placement else {
            self.unclassified += 1;
            return None;
        };

        let Some(target) = self.folder_for(&placement.folder_path) else {
            debug!(url = %bookmark.url, path = %placement.folder_path, "unresolvable folder path");
            self.unresolved += 1;
            return None;
        };

        let mut placed = bookmark.clone();
        placed.tags = placement.tags.clone();
        placed.parent_folder = Some(self.arena.nodes[target.0].title.clone());
        self.arena.attach(target, placed);
        self.placed += 1;
        Some(target)
    }

    pub fn finish(self) -> RebuildReport {
        let mut tree = self.arena.into_tree();
        sort_tree(&mut tree.root);

        RebuildReport {
            tree,
            placed: self.placed,
            unclassified: self.unclassified,
            unresolved: self.unresolved,
            flattened: self.flattened,
        }
    }
}

pub fn rebuild(
    tree: &BookmarkTree,
    classifications: &ClassificationMap,
    grouping: Option<&CategoryGrouping>,
) -> RebuildReport {
    rebuild_at(tree, classifications, grouping, chrono::Utc::now().timestamp())
}

/// [`rebuild`] with a fixed timestamp for the created folders.
pub fn rebuild_at(
    tree: &BookmarkTree,
    classifications: &ClassificationMap,
    grouping: Option<&CategoryGrouping>,
    timestamp: i64,
) -> RebuildReport {
    let mut builder = HierarchyBuilder::new(grouping, timestamp);
    for bookmark in tree.bookmarks() {
        builder.place(bookmark, classifications.get(&bookmark.url));
    }
    builder.finish()
}
