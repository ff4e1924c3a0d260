use crate::domain::model::{CategoryGrouping, UNCATEGORIZED};
use crate::usecase::reorganize::keywords::{best_category, GENERIC_CATEGORY};

pub const FLATTEN_SEPARATOR: &str = " - ";
/// Folder levels allowed below the root.
pub const MAX_DEPTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub segments: Vec<String>,
    /// The pre-flattening path when deeper segments were merged.
    pub flattened_from: Option<String>,
}

impl ResolvedPath {
    pub fn key(&self) -> String {
        self.segments.join("/")
    }
}

pub fn split_segments(raw: &str) -> Vec<String> {
    raw.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keeps segment 0 and joins the rest into one second-level segment.
pub fn flatten(mut segments: Vec<String>) -> ResolvedPath {
    if segments.len() <= MAX_DEPTH {
        return ResolvedPath {
            segments,
            flattened_from: None,
        };
    }

    let original = segments.join("/");
    let rest = segments.split_off(1).join(FLATTEN_SEPARATOR);
    segments.push(rest);
    ResolvedPath {
        segments,
        flattened_from: Some(original),
    }
}

/// Case-insensitive substring match in either direction. The candidate with
/// the longest overlap wins; equal overlaps keep the earlier candidate.
pub fn best_substring_match<'a, T>(
    needle: &str,
    candidates: impl IntoIterator<Item = (&'a str, T)>,
) -> Option<T> {
    let needle_lc = needle.to_lowercase();
    if needle_lc.is_empty() {
        return None;
    }

    let mut best: Option<(T, usize)> = None;
    for (text, value) in candidates {
        let text_lc = text.to_lowercase();
        if text_lc.is_empty() {
            continue;
        }
        if text_lc.contains(&needle_lc) || needle_lc.contains(&text_lc) {
            let overlap = text_lc.len().min(needle_lc.len());
            if best.as_ref().map_or(true, |(_, most)| overlap > *most) {
                best = Some((value, overlap));
            }
        }
    }

    best.map(|(value, _)| value)
}

/// Turns a raw suggested folder into at most [`MAX_DEPTH`] segments,
/// optionally re-rooted under a top-level category.
#[derive(Debug, Clone)]
pub struct PathResolver<'g> {
    grouping: Option<&'g CategoryGrouping>,
    fallback: Option<String>,
}

impl<'g> PathResolver<'g> {
    pub fn new(grouping: Option<&'g CategoryGrouping>) -> Self {
        Self {
            grouping,
            fallback: Some(GENERIC_CATEGORY.to_string()),
        }
    }

    /// Disables the generic category; paths matching no category become unresolvable.
    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn grouping_active(&self) -> bool {
        self.grouping.is_some()
    }

    pub fn resolve(&self, raw: &str) -> Option<ResolvedPath> {
        let segments = split_segments(raw);
        let segments = match self.grouping {
            Some(grouping) => self.categorize(grouping, segments)?,
            None => segments,
        };

        if segments.is_empty() {
            return None;
        }
        Some(flatten(segments))
    }

    fn categorize(&self, grouping: &CategoryGrouping, mut segments: Vec<String>) -> Option<Vec<String>> {
        let Some(first) = segments.first().cloned() else {
            return self
                .fallback
                .clone()
                .map(|category| vec![category, UNCATEGORIZED.to_string()]);
        };

        if grouping.is_category(&first) {
            return Some(segments);
        }

        let whole = segments.join("/");
        let prefixed = |category: &str, mut segments: Vec<String>| {
            segments.insert(0, category.to_string());
            segments
        };

        if let Some(category) = member_category(grouping, &whole) {
            return Some(prefixed(category, segments));
        }

        let categories = || grouping.category_names().map(|c| (c, c));

        if let Some(category) = best_substring_match(&first, categories()) {
            segments[0] = category.to_string();
            return Some(segments);
        }

        if let Some(category) = best_substring_match(&whole, grouping.members()) {
            return Some(prefixed(category, segments));
        }

        if let Some(category) = best_substring_match(&whole, categories()) {
            return Some(prefixed(category, segments));
        }

        if let Some(category) = best_category(&whole, grouping.category_names()) {
            return Some(prefixed(category, segments));
        }

        self.fallback
            .as_deref()
            .map(|category| prefixed(category, segments))
    }
}

/// Category listing `folder` verbatim, or failing that case-insensitively.
fn member_category<'g>(grouping: &'g CategoryGrouping, folder: &str) -> Option<&'g str> {
    grouping
        .members()
        .find(|(member, _)| *member == folder)
        .or_else(|| {
            grouping
                .members()
                .find(|(member, _)| member.eq_ignore_ascii_case(folder))
        })
        .map(|(_, category)| category)
}
