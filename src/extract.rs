//! Recovery of JSON values from free-text model completions.
//!
//! Models asked for "pure JSON" still wrap it in prose, code fences, or typographic
//! punctuation, and occasionally emit small syntax errors. [`extract_json`] runs a fixed
//! cleanup pipeline over the text and parses whatever is left. There is no partial
//! result: the text either parses or the caller substitutes its own fallback value.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Optional pipeline stages. Only course generation turns them on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Drop every non-ASCII code point after punctuation normalization.
    /// This loses legitimate non-English text.
    pub strip_non_ascii: bool,
    /// Remove trailing commas, insert commas between adjacent containers,
    /// and escape stray quotes inside string values.
    pub repair_syntax: bool,
}

impl ExtractOptions {
    pub const fn lenient() -> Self {
        Self {
            strip_non_ascii: false,
            repair_syntax: false,
        }
    }

    pub const fn strict() -> Self {
        Self {
            strip_non_ascii: true,
            repair_syntax: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("model returned an empty response")]
    Empty,
    #[error("response is not valid JSON after cleanup: {0}")]
    Parse(#[from] serde_json::Error),
}

lazy_static! {
    static ref OPENING_FENCE: Regex = Regex::new(r"^```[A-Za-z0-9_+-]*").unwrap();
    static ref CLOSING_FENCE: Regex = Regex::new(r"```\s*$").unwrap();
}

/// Runs the full cleanup pipeline and parses the result.
///
/// Stage order matters: each stage assumes the noise handled by the previous
/// ones is gone.
pub fn extract_json(text: &str, options: &ExtractOptions) -> Result<Value, ExtractError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::Empty);
    }

    let unfenced = strip_code_fence(trimmed);
    let (array, object) = containers(unfenced);

    if let Some(array) = array {
        match parse_cleaned(array, options) {
            Ok(value) => return Ok(value),
            Err(e) => debug!(error = %e, "leading bracket is not a JSON array, trying the object span"),
        }
    }
    parse_cleaned(object, options)
}

fn parse_cleaned(bounded: &str, options: &ExtractOptions) -> Result<Value, ExtractError> {
    let mut cleaned: String = bounded.chars().filter(|c| !c.is_control()).collect();
    cleaned = normalize_punctuation(&cleaned);
    if options.strip_non_ascii {
        cleaned.retain(|c| c.is_ascii());
    }
    if options.repair_syntax {
        cleaned = repair_syntax(&cleaned);
    }

    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(e) => {
            debug!(error = %e, cleaned = %cleaned, "cleaned response still fails to parse");
            Err(e.into())
        }
    }
}

/// [`extract_json`] followed by deserialization into `T`.
pub fn extract_as<T: DeserializeOwned>(
    text: &str,
    options: &ExtractOptions,
) -> Result<T, ExtractError> {
    let value = extract_json(text, options)?;
    Ok(serde_json::from_value(value)?)
}

/// Extracts a `T` or returns the caller's fallback. Failures are logged, never surfaced.
pub fn extract_or_else<T, F>(text: &str, options: &ExtractOptions, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match extract_as(text, options) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "could not recover structured response, using fallback");
            fallback()
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    match OPENING_FENCE.find(text) {
        Some(open) => {
            let body = &text[open.end()..];
            match CLOSING_FENCE.find(body) {
                Some(close) => body[..close.start()].trim(),
                None => body.trim(),
            }
        }
        None => text,
    }
}

/// Cuts leading prose up to the first `{` and trailing prose after the last `}`.
/// When a `[` comes before any `{`, the bracketed span is returned too so it can be
/// tried as a top-level array first.
fn containers(text: &str) -> (Option<&str>, &str) {
    let brace = text.find('{');
    let array = match (text.find('['), brace) {
        (Some(open), None) => span(text, open, ']'),
        (Some(open), Some(brace)) if open < brace => span(text, open, ']'),
        _ => None,
    };
    let start = brace.unwrap_or(0);
    let object = span(text, start, '}').unwrap_or(&text[start..]);
    (array, object)
}

fn span(text: &str, start: usize, close: char) -> Option<&str> {
    let text = &text[start..];
    text.rfind(close).map(|end| &text[..=end])
}

/// Curly double quotes are string delimiters outside a string or where they close
/// one. Anywhere else inside a string they are escaped.
fn normalize_punctuation(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\u{201C}' | '\u{201D}' if in_string && !closes_string(&chars[i + 1..]) => {
                out.push_str("\\\"")
            }
            '\u{201C}' | '\u{201D}' => {
                in_string = !in_string;
                out.push('"');
            }
            '"' if !escaped => {
                in_string = !in_string;
                out.push(c);
            }
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            _ => out.push(c),
        }
        escaped = in_string && c == '\\' && !escaped;
    }
    out
}

/// String-aware syntax repair. A quote inside a string only terminates it when the
/// next significant character could follow a string; otherwise it is escaped.
fn repair_syntax(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let rest = &chars[i + 1..];
        if in_string {
            match c {
                '\\' => {
                    out.push(c);
                    if let Some(&escaped) = rest.first() {
                        out.push(escaped);
                        i += 1;
                    }
                }
                '"' if closes_string(rest) => {
                    in_string = false;
                    out.push(c);
                }
                '"' => out.push_str("\\\""),
                _ => out.push(c),
            }
        } else {
            match c {
                '"' => {
                    in_string = true;
                    out.push(c);
                }
                ',' if matches!(next_significant(rest), Some('}' | ']')) => {}
                '}' | ']' => {
                    out.push(c);
                    if matches!(next_significant(rest), Some('{' | '[')) {
                        out.push(',');
                    }
                }
                _ => out.push(c),
            }
        }
        i += 1;
    }
    out
}

fn next_significant(rest: &[char]) -> Option<char> {
    rest.iter().copied().find(|c| !c.is_whitespace())
}

fn closes_string(rest: &[char]) -> bool {
    matches!(next_significant(rest), None | Some(',' | '}' | ']' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lenient(text: &str) -> Result<Value, ExtractError> {
        extract_json(text, &ExtractOptions::lenient())
    }

    fn strict(text: &str) -> Result<Value, ExtractError> {
        extract_json(text, &ExtractOptions::strict())
    }

    mod identity {
        use super::*;

        #[test]
        fn clean_json_parses_unchanged() {
            let inputs = [
                r#"{"a":1}"#,
                r#"{"nested":{"list":[1,2,{"x":"y"}]},"flag":true,"none":null}"#,
                r#"{"text":"braces } and { inside","escaped":"a \"quote\""}"#,
                r#"[{"a":1},{"b":[2,3]}]"#,
                r#"{ "spaced" : [ ] , "empty" : { } }"#,
            ];
            for input in inputs {
                let expected: Value = serde_json::from_str(input).unwrap();
                assert_eq!(lenient(input).unwrap(), expected, "lenient: {}", input);
                assert_eq!(strict(input).unwrap(), expected, "strict: {}", input);
            }
        }

        #[test]
        fn pretty_printed_json_survives_control_char_removal() {
            let value = json!({"modules": [{"title": "One", "lessons": []}]});
            let pretty = serde_json::to_string_pretty(&value).unwrap();
            assert_eq!(lenient(&pretty).unwrap(), value);
        }
    }

    mod noise {
        use super::*;

        #[test]
        fn code_fence_with_and_without_language_tag() {
            let expected = json!({"title": "Rust", "count": 2});
            for input in [
                "```json\n{\"title\": \"Rust\", \"count\": 2}\n```",
                "```\n{\"title\": \"Rust\", \"count\": 2}\n```",
                "```JSON {\"title\": \"Rust\", \"count\": 2}```",
                "```json\n{\"title\": \"Rust\", \"count\": 2}",
            ] {
                assert_eq!(lenient(input).unwrap(), expected, "{}", input);
            }
        }

        #[test]
        fn prose_around_the_object_is_discarded() {
            let input = "Here is your JSON:\n{\"a\": [1, 2]}\nLet me know if you need more.";
            assert_eq!(lenient(input).unwrap(), json!({"a": [1, 2]}));
        }

        #[test]
        fn control_characters_are_removed() {
            let input = "{\"a\": \"x\u{0007}y\u{0085}z\"}";
            assert_eq!(lenient(input).unwrap(), json!({"a": "xyz"}));
        }

        #[test]
        fn smart_punctuation_round_trips() {
            let input = "{\u{201C}title\u{201D}: \u{201C}Ownership \u{2013} borrowing \u{2014} lifetimes\u{2026}\u{201D}, \u{201C}note\u{201D}: \u{201C}it\u{2019}s fine\u{201D}}";
            let expected = json!({"title": "Ownership - borrowing - lifetimes...", "note": "it's fine"});
            assert_eq!(lenient(input).unwrap(), expected);
        }

        #[test]
        fn smart_quotes_inside_a_value_are_escaped_in_every_mode() {
            let input = "{\"title\": \"He said \u{201C}hi\u{201D}\"}";
            let expected = json!({"title": "He said \"hi\""});
            assert_eq!(lenient(input).unwrap(), expected);
            assert_eq!(strict(input).unwrap(), expected);
        }

        #[test]
        fn smart_quote_can_close_a_straight_quoted_string() {
            let input = "{\"a\": \"x\u{201D}, \"b\": \"\u{201C}y\u{201D} z\"}";
            assert_eq!(lenient(input).unwrap(), json!({"a": "x", "b": "\"y\" z"}));
        }

        #[test]
        fn bracketed_prose_before_the_object_is_discarded() {
            for input in [
                "[Assistant] Here is your JSON: {\"a\": 1}",
                "[note] see [1] below: {\"a\": 1}",
                "[Assistant] {\"a\": 1} [end]",
            ] {
                assert_eq!(lenient(input).unwrap(), json!({"a": 1}), "{}", input);
                assert_eq!(strict(input).unwrap(), json!({"a": 1}), "{}", input);
            }
        }

        #[test]
        fn array_after_prose_is_kept_whole() {
            let input = "Results: [{\"a\": 1}, {\"b\": 2}] hope that helps";
            assert_eq!(lenient(input).unwrap(), json!([{"a": 1}, {"b": 2}]));
        }

        #[test]
        fn non_ascii_is_stripped_only_when_asked() {
            let input = "{\"title\": \"caf\u{00E9} \u{65E5}\u{672C}\"}";
            assert_eq!(lenient(input).unwrap(), json!({"title": "caf\u{00E9} \u{65E5}\u{672C}"}));
            assert_eq!(strict(input).unwrap(), json!({"title": "caf "}));
        }
    }

    mod repair {
        use super::*;

        #[test]
        fn fenced_object_with_trailing_comma_after_prose() {
            let input = "Sure! ```json\n{\"a\":1,}\n```";
            assert_eq!(strict(input).unwrap(), json!({"a": 1}));
            assert!(lenient(input).is_err());
        }

        #[test]
        fn trailing_commas_before_closers() {
            let input = r#"{"list": [1, 2, 3, ], "inner": {"k": "v",},}"#;
            assert_eq!(strict(input).unwrap(), json!({"list": [1, 2, 3], "inner": {"k": "v"}}));
        }

        #[test]
        fn missing_comma_between_adjacent_containers() {
            let input = r#"{"modules": [{"t": 1} {"t": 2}], "grid": [[1] [2]]}"#;
            assert_eq!(
                strict(input).unwrap(),
                json!({"modules": [{"t": 1}, {"t": 2}], "grid": [[1], [2]]})
            );
        }

        #[test]
        fn smart_quotes_inside_a_value_become_straight_quotes() {
            let input = "{\"title\": \"He said \u{201C}hi\u{201D}\"}";
            let value = strict(input).unwrap();
            assert_eq!(value["title"], "He said \"hi\"");
        }

        #[test]
        fn stray_ascii_quotes_are_escaped() {
            let input = r#"{"content": "Use the "mut" keyword", "n": 1}"#;
            assert_eq!(strict(input).unwrap(), json!({"content": "Use the \"mut\" keyword", "n": 1}));
        }

        #[test]
        fn repair_leaves_string_contents_alone() {
            let input = r#"{"a": "x, ] y", "b": "} {"}"#;
            assert_eq!(strict(input).unwrap(), json!({"a": "x, ] y", "b": "} {"}));
        }
    }

    mod failure {
        use super::*;

        #[test]
        fn empty_input() {
            assert!(matches!(lenient("   \n"), Err(ExtractError::Empty)));
        }

        #[test]
        fn text_without_braces_fails() {
            assert!(matches!(lenient("not json"), Err(ExtractError::Parse(_))));
            assert!(matches!(strict("not json"), Err(ExtractError::Parse(_))));
        }

        #[test]
        fn fallback_is_returned_unchanged() {
            #[derive(Debug, serde::Deserialize, PartialEq)]
            struct Shape {
                a: i32,
            }
            let got = extract_or_else("not json", &ExtractOptions::strict(), || Shape { a: 7 });
            assert_eq!(got, Shape { a: 7 });
        }

        #[test]
        fn wrong_shape_is_a_failure() {
            #[derive(Debug, serde::Deserialize)]
            #[allow(dead_code)]
            struct Shape {
                a: i32,
            }
            assert!(extract_as::<Shape>(r#"{"b": 1}"#, &ExtractOptions::lenient()).is_err());
        }
    }
}
