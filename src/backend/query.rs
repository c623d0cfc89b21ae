//! PostgREST query-string building and response header parsing.

use crate::models::{FeedQuery, PromptId, SortKey};

/// Columns the search term is matched against.
const SEARCH_COLUMNS: [&str; 2] = ["title", "text"];

/// Builder for a table query string.
///
/// Values are percent-encoded as they are added.
#[derive(Debug, Default, Clone)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(self, columns: &str) -> Self {
        self.param("select", columns)
    }

    /// `column=eq.value`
    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.param(column, &format!("eq.{}", value.to_string()))
    }

    pub fn order(self, sort: SortKey) -> Self {
        self.param("order", &order_clause(sort))
    }

    pub fn range(self, offset: u64, limit: u32) -> Self {
        self.param("offset", &offset.to_string())
            .param("limit", &limit.to_string())
    }

    pub fn limit(self, limit: u32) -> Self {
        self.param("limit", &limit.to_string())
    }

    /// Case-insensitive substring match on title OR text.
    pub fn search(self, term: &str) -> Self {
        self.param("or", &search_filter(term))
    }

    /// Feed page query: search filter, ordering and window.
    pub fn feed(query: &FeedQuery) -> Self {
        let mut qs = Self::new().select("*");
        if let Some(term) = query.search_term() {
            qs = qs.search(term);
        }
        qs.order(query.sort).range(query.offset(), query.limit())
    }

    pub fn prompt_id(id: PromptId) -> Self {
        Self::new().eq("id", id)
    }

    fn param(mut self, key: &str, value: &str) -> Self {
        self.pairs
            .push((key.to_string(), urlencoding::encode(value).into_owned()));
        self
    }

    /// Render as `?k=v&k=v`, or an empty string when there are no pairs.
    pub fn build(&self) -> String {
        if self.pairs.is_empty() {
            return String::new();
        }
        let joined: Vec<String> = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("?{}", joined.join("&"))
    }
}

/// `order` value for a sort key. Always ends with `id.desc` so equal keys
/// still page deterministically.
pub fn order_clause(sort: SortKey) -> String {
    match sort {
        SortKey::Newest => "created_at.desc,id.desc".to_string(),
        other => format!("{}.desc.nullslast,id.desc", other.column()),
    }
}

/// `or` filter matching `term` as a literal substring of any search column.
///
/// LIKE wildcards in the term are escaped so `50%` matches the text "50%"
/// rather than everything starting with "50". PostgREST reads `*` as `%`
/// and offers no escape for it, so a literal `*` becomes the single-character
/// wildcard `_`. The pattern is double-quoted
/// so commas and parentheses in the term do not break the filter grammar.
pub fn search_filter(term: &str) -> String {
    let pattern = format!("%{}%", escape_like(term));
    let quoted = quote_value(&pattern);
    let clauses: Vec<String> = SEARCH_COLUMNS
        .iter()
        .map(|column| format!("{}.ilike.{}", column, quoted))
        .collect();
    format!("({})", clauses.join(","))
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '*' => escaped.push('_'),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn quote_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Total row count from a `Content-Range` header such as `0-8/42` or `*/0`.
pub fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_has_id_tiebreak() {
        assert_eq!(order_clause(SortKey::Newest), "created_at.desc,id.desc");
        assert_eq!(order_clause(SortKey::Likes), "likes.desc.nullslast,id.desc");
        assert_eq!(
            order_clause(SortKey::Copies),
            "copy_count.desc.nullslast,id.desc"
        );
    }

    #[test]
    fn test_search_filter_plain() {
        assert_eq!(
            search_filter("cat"),
            r#"(title.ilike."%cat%",text.ilike."%cat%")"#
        );
    }

    #[test]
    fn test_search_filter_escapes_wildcards_and_quotes() {
        assert_eq!(
            search_filter(r#"50%_"x""#),
            r#"(title.ilike."%50\\%\\_\"x\"%",text.ilike."%50\\%\\_\"x\"%")"#
        );
    }

    #[test]
    fn test_search_filter_star_is_not_a_wildcard() {
        assert_eq!(
            search_filter("a*b"),
            r#"(title.ilike."%a_b%",text.ilike."%a_b%")"#
        );
        let qs = QueryString::feed(&FeedQuery {
            search: "a*b".to_string(),
            ..FeedQuery::new(9)
        })
        .build();
        assert!(qs.contains("%25a_b%25"));
        assert!(!qs.contains("%2A%25"));
    }

    #[test]
    fn test_feed_query_string() {
        let mut query = FeedQuery::new(9);
        query.page = 2;
        query.sort = SortKey::Likes;
        let qs = QueryString::feed(&query).build();
        assert_eq!(
            qs,
            "?select=%2A&order=likes.desc.nullslast%2Cid.desc&offset=9&limit=9"
        );

        query.search = "cat".to_string();
        let qs = QueryString::feed(&query).build();
        assert!(qs.contains("&or=%28title.ilike.%22%25cat%25%22%2Ctext.ilike.%22%25cat%25%22%29&"));
    }

    #[test]
    fn test_eq_filter() {
        assert_eq!(QueryString::prompt_id(7).build(), "?id=eq.7");
        assert_eq!(QueryString::new().build(), "");
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-8/42"), Some(42));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-8/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }
}
