use crate::domain::model::{Bookmark, BookmarkTree, Folder};
use html_escape::{encode_double_quoted_attribute, encode_text};

const HEADER: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<!-- This is an automatically generated file.
     It will be read and overwritten.
     DO NOT EDIT! -->
<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
"#;

const INDENT: &str = "    ";

enum Step<'a> {
    Enter(&'a Folder, usize),
    Leave(usize),
}

/// Renders a tree in the Netscape dialect. The root is the outermost `<DL>`;
/// every level below it is indented by four spaces.
pub fn render_bookmark_html(tree: &BookmarkTree) -> String {
    let mut out = String::from(HEADER);
    out.push_str("<DL><p>\n");
    push_bookmarks(&mut out, &tree.root.bookmarks, 1);

    let mut stack: Vec<Step<'_>> = tree
        .root
        .sub_folders
        .iter()
        .rev()
        .map(|f| Step::Enter(f, 1))
        .collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(folder, depth) => {
                let pad = INDENT.repeat(depth);
                out.push_str(&format!(
                    "{pad}<DT><H3 ADD_DATE=\"{}\" LAST_MODIFIED=\"{}\">{}</H3>\n",
                    folder.add_date,
                    folder.last_modified,
                    encode_text(&folder.title)
                ));
                out.push_str(&format!("{pad}<DL><p>\n"));
                push_bookmarks(&mut out, &folder.bookmarks, depth + 1);

                stack.push(Step::Leave(depth));
                for sub in folder.sub_folders.iter().rev() {
                    stack.push(Step::Enter(sub, depth + 1));
                }
            }
            Step::Leave(depth) => {
                out.push_str(&format!("{}</DL><p>\n", INDENT.repeat(depth)));
            }
        }
    }

    out.push_str("</DL><p>\n");
    out
}

fn push_bookmarks(out: &mut String, bookmarks: &[Bookmark], depth: usize) {
    let pad = INDENT.repeat(depth);
    for bookmark in bookmarks {
        let mut attrs = format!(
            "HREF=\"{}\" ADD_DATE=\"{}\"",
            encode_double_quoted_attribute(&bookmark.url),
            bookmark.add_date
        );
        if let Some(icon) = &bookmark.icon {
            attrs.push_str(&format!(" ICON=\"{}\"", encode_double_quoted_attribute(icon)));
        }
        if !bookmark.tags.is_empty() {
            attrs.push_str(&format!(
                " TAGS=\"{}\"",
                encode_double_quoted_attribute(&bookmark.tags.join(","))
            ));
        }
        out.push_str(&format!(
            "{pad}<DT><A {attrs}>{}</A>\n",
            encode_text(&bookmark.title)
        ));
    }
}
