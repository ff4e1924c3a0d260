use crate::domain::model::{Bookmark, BookmarkTree, Folder, ROOT_TITLE};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(pub usize);

#[derive(Debug, Clone, Default)]
pub struct ArenaFolder {
    pub title: String,
    /// Joined path from the root, "" for the root itself.
    pub path: String,
    pub parent_path: Option<String>,
    pub bookmarks: Vec<Bookmark>,
    pub children: Vec<Handle>,
}

/// Folders created during one rebuild, memoized by joined path.
#[derive(Debug, Clone)]
pub struct FolderArena {
    pub nodes: Vec<ArenaFolder>,
    by_path: HashMap<String, Handle>,
    timestamp: i64,
}

impl FolderArena {
    pub const ROOT: Handle = Handle(0);

    pub fn new(timestamp: i64) -> Self {
        Self {
            nodes: vec![ArenaFolder {
                title: ROOT_TITLE.to_string(),
                ..ArenaFolder::default()
            }],
            by_path: HashMap::new(),
            timestamp,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn lookup(&self, path: &str) -> Option<Handle> {
        self.by_path.get(path).copied()
    }

    /// Returns the folder for `segments`, creating any missing ancestors.
    pub fn get_or_create(&mut self, segments: &[String]) -> Handle {
        let mut current = Self::ROOT;
        let mut path = String::new();

        for segment in segments {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(segment);

            current = match self.by_path.get(&path) {
                Some(existing) => *existing,
                None => {
                    let parent_path = if current == Self::ROOT {
                        ROOT_TITLE.to_string()
                    } else {
                        self.nodes[current.0].path.clone()
                    };
                    let created = Handle(self.nodes.len());
                    self.nodes.push(ArenaFolder {
                        title: segment.clone(),
                        path: path.clone(),
                        parent_path: Some(parent_path),
                        ..ArenaFolder::default()
                    });
                    self.nodes[current.0].children.push(created);
                    self.by_path.insert(path.clone(), created);
                    created
                }
            };
        }

        current
    }

    pub fn attach(&mut self, folder: Handle, bookmark: Bookmark) {
        self.nodes[folder.0].bookmarks.push(bookmark);
    }

    pub fn into_tree(mut self) -> BookmarkTree {
        let mut built: Vec<Option<Folder>> = vec![None; self.nodes.len()];

        for h in self.postorder_handles() {
            let node = std::mem::take(&mut self.nodes[h.0]);
            let sub_folders: Vec<Folder> = node
                .children
                .iter()
                .filter_map(|ch| built[ch.0].take())
                .collect();

            built[h.0] = Some(Folder {
                title: node.title,
                add_date: self.timestamp,
                last_modified: self.timestamp,
                bookmarks: node.bookmarks,
                sub_folders,
                parent_folder: node.parent_path,
            });
        }

        let root = built[Self::ROOT.0]
            .take()
            .unwrap_or_else(|| Folder::new(ROOT_TITLE, self.timestamp));
        BookmarkTree::new(root)
    }

    fn postorder_handles(&self) -> Vec<Handle> {
        let mut out: Vec<Handle> = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(Handle, bool)> = vec![(Self::ROOT, false)];

        while let Some((h, expanded)) = stack.pop() {
            if expanded {
                out.push(h);
                continue;
            }
            stack.push((h, true));
            for ch in self.nodes[h.0].children.iter().rev() {
                stack.push((*ch, false));
            }
        }

        out
    }
}
