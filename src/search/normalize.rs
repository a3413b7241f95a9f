//! Symbol name normalization: parameter-list stripping and parent/child
//! decomposition for display.

use regex::Regex;
use std::sync::LazyLock;

/// Matches an identifier with an optional trailing parenthesized group, as in
/// `Read(Stream, int)`. Capture 1 is the identifier portion.
static METHOD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^(]+)(?:\(.*\))?$").expect("method name pattern"));

/// Qualified-name separators, tried in priority order.
const SEPARATORS: [&str; 3] = [".", "::", "/"];

/// Decompose a raw symbol name into `(display_name, parent_name)`.
///
/// A trailing parameter list is stripped first. When the backing row supplied
/// an explicit parent it is used verbatim; otherwise the name is split on the
/// last occurrence of the first qualifying separator, so
/// `std::vector::push_back` becomes `push_back` with parent `vector`. A
/// separator whose first occurrence is at position 0 never splits; `::method`
/// stays whole.
pub fn normalize(raw: &str, parent_hint: Option<&str>) -> (String, Option<String>) {
    let stripped = METHOD_NAME
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map_or(raw, |ident| ident.as_str());

    if let Some(parent) = parent_hint {
        return (stripped.to_owned(), Some(parent.to_owned()));
    }

    for separator in SEPARATORS {
        match stripped.find(separator) {
            None | Some(0) => continue,
            Some(_) => {
                let segments: Vec<&str> = stripped.split(separator).collect();
                let display = segments[segments.len() - 1];
                let parent = segments[segments.len() - 2];
                return (display.to_owned(), Some(parent.to_owned()));
            }
        }
    }

    (stripped.to_owned(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("List", "List", None)]
    #[case("Read(Stream, int)", "Read", None)]
    #[case("util.ListUtils", "ListUtils", Some("util"))]
    #[case("std::vector::push_back", "push_back", Some("vector"))]
    #[case("archive/tar", "tar", Some("archive"))]
    #[case("django.utils.http", "http", Some("utils"))]
    #[case("::method", "::method", None)]
    #[case(".hidden", ".hidden", None)]
    #[case("QFile::open(const QString &)", "open", Some("QFile"))]
    #[case("", "", None)]
    fn test_normalize(
        #[case] raw: &str,
        #[case] display: &str,
        #[case] parent: Option<&str>,
    ) {
        let (name, parent_name) = normalize(raw, None);
        check!(name == display);
        check!(parent_name.as_deref() == parent);
    }

    #[rstest]
    #[case("push_back(const T &)", "Vector", "push_back")]
    #[case("util.ListUtils", "explicit", "util.ListUtils")]
    fn test_parent_hint_suppresses_splitting(
        #[case] raw: &str,
        #[case] hint: &str,
        #[case] display: &str,
    ) {
        let (name, parent_name) = normalize(raw, Some(hint));
        check!(name == display);
        check!(parent_name.as_deref() == Some(hint));
    }

    /// The display name never keeps a trailing parameter list.
    #[rstest]
    #[case("a()")]
    #[case("method(int, long)")]
    #[case("ns.method(x)")]
    #[case("deeply::nested::call(a, b)")]
    fn test_no_trailing_parens_survive(#[case] raw: &str) {
        let (name, _) = normalize(raw, None);
        check!(!name.ends_with(')'));
        check!(!name.contains('('));
    }
}
