//! Book query parsing.
//!
//! Splits `"<title> - <author>"` queries so providers with a fielded search
//! mode can run a more precise query. Parsing is total: anything that does
//! not match simply keeps the raw string.

use std::sync::LazyLock;

use regex::Regex;

/// Dash glyphs accepted as a title/author separator: hyphen, en dash, em dash.
pub const DASHES: [char; 3] = ['-', '\u{2013}', '\u{2014}'];

static TITLE_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<title>.+?)\s+[-\u{2013}\u{2014}]\s+(?P<author>.+)$")
        .expect("title/author pattern is valid")
});

/// Title and author halves of a separated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleAuthor {
    pub title: String,
    pub author: String,
}

/// Raw query plus the optional fielded split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub raw: String,
    pub parts: Option<TitleAuthor>,
}

impl ParsedQuery {
    /// Parses `raw`. Never fails.
    pub fn parse(raw: &str) -> Self {
        let parts = TITLE_AUTHOR.captures(raw.trim()).and_then(|caps| {
            let title = caps["title"].trim();
            let author = caps["author"].trim();
            (!title.is_empty() && !author.is_empty()).then(|| TitleAuthor {
                title: title.to_string(),
                author: author.to_string(),
            })
        });

        Self {
            raw: raw.to_string(),
            parts,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.parts.as_ref().map(|p| p.title.as_str())
    }

    pub fn author(&self) -> Option<&str> {
        self.parts.as_ref().map(|p| p.author.as_str())
    }

    /// Raw query with dashes flattened to spaces, for plain full-text providers.
    pub fn plain(&self) -> String {
        dash_to_space(&self.raw)
    }
}

/// Replaces every dash glyph with a space and collapses runs of whitespace.
pub fn dash_to_space(raw: &str) -> String {
    raw.replace(DASHES, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_title_author_split() {
        let parsed = ParsedQuery::parse("Harry Potter - Rowling");
        assert_eq!(parsed.title(), Some("Harry Potter"));
        assert_eq!(parsed.author(), Some("Rowling"));
        assert_eq!(parsed.raw, "Harry Potter - Rowling");
    }

    #[test]
    fn test_plain_query_has_no_parts() {
        let parsed = ParsedQuery::parse("Harry Potter");
        assert_eq!(parsed.raw, "Harry Potter");
        assert!(parsed.parts.is_none());
    }

    #[test]
    fn test_en_and_em_dash_separators() {
        let en = ParsedQuery::parse("클린 코드 \u{2013} 로버트 마틴");
        assert_eq!(en.title(), Some("클린 코드"));
        assert_eq!(en.author(), Some("로버트 마틴"));

        let em = ParsedQuery::parse("Dune \u{2014} Herbert");
        assert_eq!(em.title(), Some("Dune"));
        assert_eq!(em.author(), Some("Herbert"));
    }

    #[test]
    fn test_unspaced_dash_is_not_a_separator() {
        assert!(ParsedQuery::parse("Spider-Man").parts.is_none());
        assert!(ParsedQuery::parse(" - Rowling").parts.is_none());
    }

    #[test]
    fn test_dash_to_space() {
        assert_eq!(dash_to_space("Harry Potter - Rowling"), "Harry Potter Rowling");
        assert_eq!(dash_to_space("Spider-Man\u{2014}Homecoming"), "Spider Man Homecoming");
        assert_eq!(dash_to_space("  "), "");
    }

    proptest! {
        #[test]
        fn parse_is_total(raw in ".*") {
            let parsed = ParsedQuery::parse(&raw);
            prop_assert_eq!(&parsed.raw, &raw);
            if let Some(parts) = parsed.parts {
                prop_assert!(!parts.title.is_empty());
                prop_assert!(!parts.author.is_empty());
            }
        }

        #[test]
        fn plain_never_contains_dashes(raw in ".*") {
            let plain = dash_to_space(&raw);
            prop_assert!(!plain.contains(DASHES));
        }
    }
}
