use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const ROOT_TITLE: &str = "Bookmarks";
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub add_date: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_folder: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub title: String,
    pub add_date: i64,
    pub last_modified: i64,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    #[serde(default)]
    pub sub_folders: Vec<Folder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_folder: Option<String>,
}

impl Folder {
    pub fn new(title: impl Into<String>, timestamp: i64) -> Self {
        Self {
            title: title.into(),
            add_date: timestamp,
            last_modified: timestamp,
            ..Self::default()
        }
    }

    pub fn sub_folder(&self, title: &str) -> Option<&Folder> {
        self.sub_folders.iter().find(|f| f.title == title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkTree {
    pub root: Folder,
}

impl BookmarkTree {
    pub fn new(root: Folder) -> Self {
        Self { root }
    }

    /// Bookmarks in pre-order: a folder's own bookmarks before its subfolders.
    pub fn bookmarks(&self) -> Vec<&Bookmark> {
        let mut out = Vec::new();
        let mut stack: Vec<&Folder> = vec![&self.root];
        while let Some(folder) = stack.pop() {
            out.extend(folder.bookmarks.iter());
            for sub in folder.sub_folders.iter().rev() {
                stack.push(sub);
            }
        }
        out
    }

    /// Walks a "/"-separated path of folder titles starting below the root.
    pub fn folder_at(&self, path: &str) -> Option<&Folder> {
        let mut current = &self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current.sub_folder(segment)?;
        }
        Some(current)
    }
}

impl Default for BookmarkTree {
    fn default() -> Self {
        Self::new(Folder::new(ROOT_TITLE, 0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub url: String,
    pub suggested_tags: Vec<String>,
    pub suggested_folder: String,
}

impl Classification {
    pub fn uncategorized(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            suggested_tags: Vec::new(),
            suggested_folder: UNCATEGORIZED.to_string(),
        }
    }
}

/// Tags and folder path assigned to one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub tags: Vec<String>,
    pub folder_path: String,
}

pub type ClassificationMap = HashMap<String, Placement>;

pub fn classification_map(classifications: &[Classification]) -> ClassificationMap {
    classifications
        .iter()
        .map(|c| {
            (
                c.url.clone(),
                Placement {
                    tags: c.suggested_tags.clone(),
                    folder_path: c.suggested_folder.clone(),
                },
            )
        })
        .collect()
}

/// Top-level category name -> folder names assigned to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGrouping {
    pub categories: BTreeMap<String, BTreeSet<String>>,
}

impl CategoryGrouping {
    pub fn new(categories: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { categories }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn is_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().flat_map(|(category, folders)| {
            folders
                .iter()
                .map(move |folder| (folder.as_str(), category.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bm(title: &str) -> Bookmark {
        Bookmark {
            title: title.to_string(),
            url: format!("https://{title}.example"),
            ..Bookmark::default()
        }
    }

    #[test]
    fn bookmarks_are_collected_in_pre_order() {
        let mut child = Folder::new("child", 0);
        child.bookmarks.push(bm("c"));
        let mut sibling = Folder::new("sibling", 0);
        sibling.bookmarks.push(bm("d"));

        let mut root = Folder::new(ROOT_TITLE, 0);
        root.bookmarks.push(bm("a"));
        let mut parent = Folder::new("parent", 0);
        parent.bookmarks.push(bm("b"));
        parent.sub_folders.push(child);
        root.sub_folders.push(parent);
        root.sub_folders.push(sibling);

        let tree = BookmarkTree::new(root);
        let titles: Vec<&str> = tree.bookmarks().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn folder_at_walks_titles() {
        let mut root = Folder::new(ROOT_TITLE, 0);
        let mut tech = Folder::new("Tech", 0);
        tech.sub_folders.push(Folder::new("Dev", 0));
        root.sub_folders.push(tech);
        let tree = BookmarkTree::new(root);

        assert_eq!(tree.folder_at("Tech/Dev").map(|f| f.title.as_str()), Some("Dev"));
        assert_eq!(tree.folder_at("").map(|f| f.title.as_str()), Some(ROOT_TITLE));
        assert!(tree.folder_at("Tech/Missing").is_none());
    }

    #[test]
    fn grouping_members_pair_folder_with_category() {
        let grouping = CategoryGrouping::new(BTreeMap::from([(
            "Technology".to_string(),
            BTreeSet::from(["Programming".to_string(), "Tools".to_string()]),
        )]));
        let members: Vec<(&str, &str)> = grouping.members().collect();
        assert_eq!(
            members,
            vec![("Programming", "Technology"), ("Tools", "Technology")]
        );
        assert!(grouping.is_category("Technology"));
        assert!(!grouping.is_category("Programming"));
    }
}
