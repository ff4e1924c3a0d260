use crate::domain::model::{Bookmark, BookmarkTree, Folder, ROOT_TITLE};
use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Folder nesting accepted before the input is rejected.
pub const MAX_NESTING: usize = 64;

static FIRST_LIST: Lazy<Selector> =
    Lazy::new(|| Selector::parse("dl").expect("valid dl selector"));

/// Parses a Netscape bookmark export. The first `<DL>` is the root folder.
pub fn parse_bookmark_html(html: &str) -> Result<BookmarkTree> {
    let document = Html::parse_document(html);
    let list = document
        .select(&FIRST_LIST)
        .next()
        .ok_or_else(|| anyhow!("Invalid bookmark file format"))?;

    let mut root = Folder::new(ROOT_TITLE, 0);
    fill_folder(&mut root, list, 0)?;
    Ok(BookmarkTree::new(root))
}

fn fill_folder(folder: &mut Folder, list: ElementRef<'_>, depth: usize) -> Result<()> {
    if depth > MAX_NESTING {
        bail!("bookmark folders nested deeper than {MAX_NESTING} levels");
    }

    for entry in list_entries(list) {
        if let Some(heading) = child_element(entry, "h3") {
            let mut sub = Folder {
                title: text_of(heading),
                add_date: int_attr(heading, "add_date"),
                last_modified: int_attr(heading, "last_modified"),
                parent_folder: Some(folder.title.clone()),
                ..Folder::default()
            };
            if let Some(sub_list) = child_element(entry, "dl") {
                fill_folder(&mut sub, sub_list, depth + 1)?;
            }
            folder.sub_folders.push(sub);
        } else if let Some(anchor) = child_element(entry, "a") {
            folder.bookmarks.push(Bookmark {
                title: text_of(anchor),
                url: anchor.value().attr("href").unwrap_or_default().to_string(),
                icon: anchor.value().attr("icon").map(str::to_string),
                add_date: int_attr(anchor, "add_date"),
                tags: tags_attr(anchor),
                parent_folder: Some(folder.title.clone()),
            });
        }
    }

    Ok(())
}

/// `<DT>` entries of a list; the HTML parser may leave some wrapped in `<p>`.
fn list_entries(list: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut entries = Vec::new();
    for child in list.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "dt" => entries.push(child),
            "p" => entries.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "dt"),
            ),
            _ => {}
        }
    }
    entries
}

fn child_element<'a>(parent: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == name)
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn int_attr(el: ElementRef<'_>, name: &str) -> i64 {
    el.value()
        .attr(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

fn tags_attr(el: ElementRef<'_>) -> Vec<String> {
    el.value()
        .attr("tags")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
