use crate::domain::model::Folder;

/// Orders every folder's subfolders and bookmarks by title, case-insensitively
/// first, so output does not depend on input or classification order.
pub fn sort_tree(root: &mut Folder) {
    let mut stack: Vec<&mut Folder> = vec![root];
    while let Some(folder) = stack.pop() {
        folder
            .sub_folders
            .sort_by_cached_key(|f| (f.title.to_lowercase(), f.title.clone()));
        folder
            .bookmarks
            .sort_by_cached_key(|b| (b.title.to_lowercase(), b.title.clone(), b.url.clone()));
        stack.extend(folder.sub_folders.iter_mut());
    }
}
