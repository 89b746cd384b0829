/// True iff any keyword occurs in `title`, ignoring case.
pub fn should_hide_by_keywords(title: &str, keywords: &[String]) -> bool {
    matching_keyword(title, keywords).is_some()
}

/// The first keyword contained in `title`, ignoring case.
pub fn matching_keyword<'k>(title: &str, keywords: &'k [String]) -> Option<&'k str> {
    if keywords.is_empty() {
        return None;
    }
    let haystack = title.to_lowercase();
    keywords
        .iter()
        .find(|keyword| haystack.contains(&keyword.to_lowercase()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn empty_keyword_list_never_hides() {
        assert!(!should_hide_by_keywords("anything at all", &[]));
    }

    #[test]
    fn matches_substrings_case_insensitively() {
        let keywords = kw(&["clickbait"]);
        assert!(should_hide_by_keywords("Insane CLICKBAIT you won't believe", &keywords));
        assert!(!should_hide_by_keywords("Normal video", &keywords));
    }

    #[test]
    fn reports_first_matching_keyword() {
        let keywords = kw(&["react", "Minecraft", "mine"]);
        assert_eq!(
            matching_keyword("MINECRAFT speedrun", &keywords),
            Some("Minecraft")
        );
        assert_eq!(matching_keyword("Cooking", &keywords), None);
    }
}
