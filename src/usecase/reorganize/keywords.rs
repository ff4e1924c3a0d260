/// Fallback category when nothing else matches.
pub const GENERIC_CATEGORY: &str = "Digital Resources";

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Technology",
        &["tech", "programming", "software", "dev", "code", "api", "web", "app", "tool"],
    ),
    (
        "Work & Business",
        &["business", "work", "job", "finance", "market", "company", "professional"],
    ),
    (
        "Digital Resources",
        &["resource", "online", "digital", "internet", "cloud", "service"],
    ),
    (
        "Design & Creativity",
        &["design", "art", "creative", "visual", "graphic", "photo", "portfolio"],
    ),
    (
        "Learning & Education",
        &["learn", "education", "course", "tutorial", "guide", "training"],
    ),
    (
        "Leisure & Lifestyle",
        &["entertainment", "game", "music", "movie", "sport", "hobby"],
    ),
    (
        "Security & Privacy",
        &["security", "privacy", "crypto", "blockchain", "protect"],
    ),
    (
        "E-commerce & Shopping",
        &["shop", "store", "commerce", "retail", "product"],
    ),
    (
        "Health & Wellness",
        &["health", "wellness", "fitness", "medical", "lifestyle"],
    ),
    (
        "Community & Communication",
        &["community", "social", "communication", "forum", "chat"],
    ),
];

/// Keywords for a category the model invented: the table entries sharing a
/// word with the category name, plus the category's own words.
fn keywords_for(category: &str) -> Vec<String> {
    let category_lc = category.to_lowercase();
    let own_words = significant_words(&category_lc);

    let mut keywords: Vec<String> = Vec::new();
    for (name, words) in CATEGORY_KEYWORDS {
        let name_lc = name.to_lowercase();
        let applies = name_lc == category_lc
            || significant_words(&name_lc)
                .iter()
                .any(|w| own_words.contains(w))
            || words.iter().any(|w| own_words.iter().any(|o| o == w));
        if applies {
            keywords.extend(words.iter().map(|w| w.to_string()));
        }
    }
    keywords.extend(own_words);
    keywords.sort();
    keywords.dedup();
    keywords
}

fn significant_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| w.len() >= 3 && *w != "and")
        .map(str::to_string)
        .collect()
}

/// The category whose keywords occur most often in `folder_name`.
/// Ties keep the earlier category; no hits at all yields `None`.
pub fn best_category<'a>(
    folder_name: &str,
    categories: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    let folder_lc = folder_name.to_lowercase();
    let mut best: Option<(&str, usize)> = None;

    for category in categories {
        let hits = keywords_for(category)
            .iter()
            .filter(|k| folder_lc.contains(k.as_str()))
            .count();
        if hits > 0 && best.map_or(true, |(_, most)| hits > most) {
            best = Some((category, hits));
        }
    }

    best.map(|(category, _)| category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_table_category_matches_its_keywords() {
        let cats = ["Leisure & Lifestyle", "Technology"];
        assert_eq!(best_category("Web Dev Tools", cats), Some("Technology"));
        assert_eq!(best_category("Movie night", cats), Some("Leisure & Lifestyle"));
    }

    #[test]
    fn invented_category_borrows_keywords_by_shared_word() {
        let cats = ["Technology & Development", "Media & Entertainment"];
        assert_eq!(best_category("api docs", cats), Some("Technology & Development"));
        assert_eq!(best_category("Music videos", cats), Some("Media & Entertainment"));
    }

    #[test]
    fn most_hits_wins_and_ties_keep_first() {
        let cats = ["Work & Business", "Technology"];
        assert_eq!(best_category("software dev api", cats), Some("Technology"));
        assert_eq!(best_category("finance app", cats), Some("Work & Business"));
    }

    #[test]
    fn no_hits_is_none() {
        assert_eq!(best_category("zzz", ["Technology"]), None);
        assert_eq!(best_category("tech", std::iter::empty::<&str>()), None);
    }
}
