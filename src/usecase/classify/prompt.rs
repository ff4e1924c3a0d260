use crate::domain::model::{Bookmark, Classification};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Write as _;

pub const CLASSIFIER_SYSTEM: &str = "You are a bookmark classification assistant. Analyze URLs and titles to suggest tags and folders for organization. Be concise and follow the exact format requested.";

/// `[n]` at the start of a line, optionally behind markdown heading or bold markers.
static ORDINAL_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*[#*]*[ \t]*\[(\d+)\]").expect("valid ordinal marker regex")
});

pub fn build_classification_prompt(batch: &[Bookmark], custom_prompt: Option<&str>) -> String {
    let mut prompt = String::from(
        "Analyze these bookmarks and suggest appropriate tags and folders for each:\n\n",
    );

    let entries: Vec<String> = batch
        .iter()
        .enumerate()
        .map(|(i, b)| format!("[{}]\nTitle: {}\nURL: {}", i + 1, b.title, b.url))
        .collect();
    prompt.push_str(&entries.join("\n\n"));

    prompt.push_str(
        "\n\nFor each bookmark, provide the classification in this exact format:\n\
         [Number]\n\
         Tags: tag1, tag2, tag3\n\
         Folder: folder_name\n\n\
         Consider the content, purpose, and context of each bookmark.",
    );

    if let Some(extra) = custom_prompt.map(str::trim).filter(|s| !s.is_empty()) {
        let _ = write!(prompt, "\n\nAdditional instructions: {extra}");
    }

    prompt
}

/// Maps response sections back onto `batch` by their `[n]` ordinal.
/// Items whose section is missing or has no usable `Folder:` line get
/// empty tags and the "Uncategorized" folder. Within a section the first
/// non-empty `Tags:` and `Folder:` lines win.
pub fn parse_classification_response(content: &str, batch: &[Bookmark]) -> Vec<Classification> {
    let sections = split_sections(content);

    batch
        .iter()
        .enumerate()
        .map(|(i, bookmark)| {
            sections
                .get(&(i + 1))
                .and_then(|section| parse_section(section))
                .map(|(tags, folder)| Classification {
                    url: bookmark.url.clone(),
                    suggested_tags: tags,
                    suggested_folder: folder,
                })
                .unwrap_or_else(|| Classification::uncategorized(bookmark.url.clone()))
        })
        .collect()
}

fn split_sections(content: &str) -> HashMap<usize, &str> {
    let markers: Vec<(usize, usize, usize)> = ORDINAL_MARKER
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let ordinal = caps.get(1)?.as_str().parse().ok()?;
            Some((ordinal, whole.start(), whole.end()))
        })
        .collect();

    let mut sections = HashMap::new();
    for (idx, (ordinal, _, body_start)) in markers.iter().enumerate() {
        let body_end = markers
            .get(idx + 1)
            .map(|(_, start, _)| *start)
            .unwrap_or(content.len());
        // First occurrence wins.
        sections
            .entry(*ordinal)
            .or_insert(&content[*body_start..body_end]);
    }
    sections
}

fn parse_section(section: &str) -> Option<(Vec<String>, String)> {
    let mut tags = Vec::new();
    let mut folder = None;

    for line in section.lines() {
        let line = line.trim_start_matches(|c: char| c == '-' || c == '*' || c.is_whitespace());
        if let Some(rest) = strip_label(line, "tags:") {
            if tags.is_empty() {
                tags = rest
                    .split(',')
                    .map(|t| t.trim().trim_matches('*').trim())
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        } else if let Some(rest) = strip_label(line, "folder:") {
            let value = rest.trim().trim_matches('*').trim();
            if folder.is_none() && !value.is_empty() {
                folder = Some(value.to_string());
            }
        }
    }

    folder.map(|f| (tags, f))
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        line.get(label.len()..)
    } else {
        None
    }
}
