//! Command dispatch: reduce raw content to a [`DerivedValue`].
//!
//! Every function here is pure and synchronous. Markup is parsed with
//! `scraper`, so selector semantics follow the html5ever tree (for example
//! `<li/>` opens an element rather than closing one).

use crate::command::Command;
use crate::error::{ExtractError, Result};
use crate::json_path;
use crate::value::{DerivedValue, NumericSum};
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Value};

/// Selector used when the query is empty: the whole document.
pub const DEFAULT_SELECTOR: &str = "html";

/// Apply `command` to `raw` using `query` as selector or JSON path.
///
/// Zero matches is not an error: `count` and `sum` return 0, `html` and
/// `text` return an empty string.
///
/// # Errors
///
/// Returns [`ExtractError::MalformedQuery`] if the selector or JSON path
/// cannot be parsed.
pub fn extract(raw: &str, command: Command, query: &str) -> Result<DerivedValue> {
    match command {
        Command::Html => select_each(raw, query, |el| el.inner_html())
            .map(|parts| DerivedValue::Text(parts.join("\n"))),
        Command::Text => select_each(raw, query, |el| el.text().collect::<String>())
            .map(|parts| DerivedValue::Text(parts.join("\n"))),
        Command::Count => select_each(raw, query, |_| ()).map(|m| DerivedValue::Count(m.len())),
        Command::Sum => select_each(raw, query, |el| parse_leading_int(&el.text().collect::<String>()))
            .map(|terms| {
                let sum = terms
                    .into_iter()
                    .fold(NumericSum::default(), NumericSum::add);
                DerivedValue::Sum(sum)
            }),
        Command::Raw => Ok(DerivedValue::Text(raw.to_owned())),
        Command::Json => extract_json(raw, query),
    }
}

/// Like [`extract`], but takes the command by name.
///
/// # Errors
///
/// Returns [`ExtractError::UnsupportedCommand`] for unknown command names,
/// otherwise the same errors as [`extract`].
pub fn extract_named(raw: &str, command: &str, query: &str) -> Result<DerivedValue> {
    let command: Command = command.parse()?;
    extract(raw, command, query)
}

/// Parse a CSS selector, substituting [`DEFAULT_SELECTOR`] for an empty query.
///
/// # Errors
///
/// Returns [`ExtractError::MalformedQuery`] if the selector is invalid.
pub fn parse_selector(query: &str) -> Result<Selector> {
    let query = query.trim();
    let query = if query.is_empty() { DEFAULT_SELECTOR } else { query };
    Selector::parse(query)
        .map_err(|e| ExtractError::MalformedQuery(format!("invalid selector \"{query}\": {e:?}")))
}

fn select_each<T>(raw: &str, query: &str, map: impl Fn(ElementRef<'_>) -> T) -> Result<Vec<T>> {
    let selector = parse_selector(query)?;
    let document = Html::parse_document(raw);
    let matches: Vec<T> = document.select(&selector).map(map).collect();
    tracing::debug!(matches = matches.len(), query, "selector evaluated");
    Ok(matches)
}

fn extract_json(raw: &str, query: &str) -> Result<DerivedValue> {
    let document: Value = match serde_json::from_str(raw) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(error = %e, "content is not valid JSON");
            return Ok(DerivedValue::Json(json!({
                "error": format!("invalid JSON: {e}"),
                "raw": raw,
            })));
        }
    };
    json_path::resolve(&document, query).map(DerivedValue::Json)
}

/// Parse the integer at the start of `text`, ignoring surrounding whitespace.
///
/// Accepts an optional sign followed by decimal digits; anything after the
/// digits is ignored (`"12px"` is 12). Returns `None` when no digits lead.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let sign_len = usize::from(matches!(text.as_bytes().first(), Some(b'-' | b'+')));
    let digits_len = text[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    text[..sign_len + digits_len].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "<ul><li>alpha</li><li><b>beta</b></li><li>gamma</li></ul>";

    #[test]
    fn html_joins_inner_markup() {
        let value = extract(LIST, Command::Html, "li").expect("extract");
        assert_eq!(value, DerivedValue::Text("alpha\n<b>beta</b>\ngamma".into()));
    }

    #[test]
    fn text_joins_rendered_text() {
        let value = extract(LIST, Command::Text, "li").expect("extract");
        assert_eq!(value, DerivedValue::Text("alpha\nbeta\ngamma".into()));
    }

    #[test]
    fn count_counts_matches() {
        let value = extract(LIST, Command::Count, "li").expect("extract");
        assert_eq!(value, DerivedValue::Count(3));
    }

    #[test]
    fn count_self_closing_list_items() {
        let value = extract("<ul><li/><li/></ul>", Command::Count, "li").expect("extract");
        assert_eq!(value, DerivedValue::Count(2));
    }

    #[test]
    fn sum_adds_span_values() {
        let value =
            extract("<span>3</span><span>4</span>", Command::Sum, "span").expect("extract");
        assert_eq!(value, DerivedValue::Sum(NumericSum::Total(7)));
    }

    #[test]
    fn sum_with_non_numeric_text_is_not_a_number() {
        let value =
            extract("<span>3</span><span>n/a</span>", Command::Sum, "span").expect("extract");
        assert_eq!(value, DerivedValue::Sum(NumericSum::NotANumber));
    }

    #[test]
    fn zero_matches_are_empty_not_errors() {
        assert_eq!(
            extract(LIST, Command::Count, "table").expect("extract"),
            DerivedValue::Count(0)
        );
        assert_eq!(
            extract(LIST, Command::Sum, "table").expect("extract"),
            DerivedValue::Sum(NumericSum::Total(0))
        );
        assert_eq!(
            extract(LIST, Command::Html, "table").expect("extract"),
            DerivedValue::Text(String::new())
        );
        assert_eq!(
            extract(LIST, Command::Text, "table").expect("extract"),
            DerivedValue::Text(String::new())
        );
    }

    #[test]
    fn count_agrees_with_html_line_count() {
        let html = extract(LIST, Command::Html, "li").expect("extract");
        let count = extract(LIST, Command::Count, "li").expect("extract");
        let lines = html.to_string().split('\n').count();
        assert_eq!(count, DerivedValue::Count(lines));
    }

    #[test]
    fn empty_query_selects_whole_document() {
        let value = extract("<p>x</p>", Command::Count, "").expect("extract");
        assert_eq!(value, DerivedValue::Count(1));
    }

    #[test]
    fn raw_ignores_query() {
        let value = extract("not <even> html", Command::Raw, "div[").expect("extract");
        assert_eq!(value, DerivedValue::Text("not <even> html".into()));
    }

    #[test]
    fn invalid_selector_is_malformed_query() {
        let err = extract(LIST, Command::Text, "li[").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedQuery(_)));
    }

    #[test]
    fn json_addresses_sub_value() {
        let value = extract(r#"{"a":{"b":[1,2]}}"#, Command::Json, "a.b").expect("extract");
        assert_eq!(value, DerivedValue::Json(json!([1, 2])));
    }

    #[test]
    fn json_without_query_returns_document() {
        let value = extract(r#"{"a":1}"#, Command::Json, "").expect("extract");
        assert_eq!(value, DerivedValue::Json(json!({"a": 1})));
    }

    #[test]
    fn json_parse_failure_embeds_raw_content() {
        let value = extract("<html>oops</html>", Command::Json, "a").expect("extract");
        let payload = value.as_json().expect("json payload");
        assert_eq!(payload["raw"], json!("<html>oops</html>"));
        assert!(payload["error"]
            .as_str()
            .expect("error string")
            .starts_with("invalid JSON"));
    }

    #[test]
    fn extract_named_rejects_unknown_command() {
        let err = extract_named("<div>1</div>", "foo", "div").unwrap_err();
        assert_eq!(err, ExtractError::UnsupportedCommand("foo".into()));
    }

    #[test]
    fn extract_named_dispatches_known_command() {
        let value = extract_named("<div>1</div>", "text", "div").expect("extract");
        assert_eq!(value, DerivedValue::Text("1".into()));
    }

    #[test]
    fn extraction_is_deterministic() {
        let a = extract(LIST, Command::Html, "li").expect("extract");
        let b = extract(LIST, Command::Html, "li").expect("extract");
        assert_eq!(a, b);
    }

    #[test]
    fn leading_int_parsing() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("  7 items"), Some(7));
        assert_eq!(parse_leading_int("12px"), Some(12));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("+5"), Some(5));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn leading_int_covers_full_i64_range() {
        assert_eq!(parse_leading_int("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_leading_int("9223372036854775807 left"), Some(i64::MAX));
        assert_eq!(parse_leading_int("9223372036854775808"), None);
    }
}
