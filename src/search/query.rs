//! Raw query text parsing: docset filter extraction and `LIKE` sanitization.

/// Delimiter separating an optional docset-prefix filter from the search term,
/// as in `go:fprintf`.
pub const FILTER_DELIMITER: char = ':';

/// A parsed, immutable search query.
///
/// Built once per submitted query. The term is carried in two forms: the raw
/// text (kept on results for UI highlighting) and a sanitized copy safe to
/// embed in `LIKE` patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    term: String,
    sanitized: String,
    filter: Option<String>,
}

impl SearchQuery {
    /// Parse raw input text.
    ///
    /// A leading `<prefix>:` token becomes the docset filter when the prefix
    /// is non-empty, free of whitespace, and the remainder does not itself
    /// start with the delimiter, so `std::vector` stays a plain term.
    /// Parsing never fails; anything unrecognized is treated as term text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        let (filter, term) = match raw.split_once(FILTER_DELIMITER) {
            Some((prefix, rest))
                if !prefix.is_empty()
                    && !prefix.contains(char::is_whitespace)
                    && !rest.starts_with(FILTER_DELIMITER) =>
            {
                (Some(prefix.to_owned()), rest.trim_start())
            }
            _ => (None, raw),
        };

        Self {
            term: term.to_owned(),
            sanitized: escape_like(term),
            filter,
        }
    }

    /// The search term as the user typed it (filter stripped).
    pub fn term(&self) -> &str {
        &self.term
    }

    /// The term with `LIKE` metacharacters escaped, for use in patterns.
    pub fn sanitized_term(&self) -> &str {
        &self.sanitized
    }

    /// The docset filter prefix, when the query carried one.
    pub fn docset_filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Whether a docset with the given prefix participates in this query.
    ///
    /// Exact-prefix and case-sensitive: `ja:` matches a docset whose prefix
    /// is `java`. Always true when no filter is present.
    pub fn matches_docset(&self, candidate_prefix: &str) -> bool {
        self.filter
            .as_deref()
            .is_none_or(|filter| candidate_prefix.starts_with(filter))
    }
}

/// Escape `\`, `%` and `_` so the text matches literally under
/// `LIKE ... ESCAPE '\'`.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
