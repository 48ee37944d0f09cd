//! Extraction of `<Quiz ... />` tags from Markdown/MDX lesson pages.
//!
//! Pure functions — text in, props out. No I/O.
//!
//! Attribute grammar (the subset of JSX that lesson pages use):
//! - `name="text"` or `name='text'`: literal string, HTML entities decoded,
//!   `\"` (or `\'`) for the quote itself; other backslashes are kept
//! - `name={ json }`: a JSON value, braces balanced, strings respected
//! - `name={Infinity}`: unlimited (only meaningful for `maxTries`)
//! - bare `name`: boolean true
//!
//! Tags inside fenced code blocks, inline code spans, and `{/* */}` or
//! `<!-- -->` comments are documentation, not quizzes.

use std::fmt;
use std::ops::Range;

use serde_json::{Map, Value};

use crate::types::QuizProps;

/// Tag name of the quiz component.
const TAG_OPEN: &str = "<Quiz";

/// Props the quiz component understands. Everything else is ignored.
const KNOWN_PROPS: [&str; 4] = ["question", "options", "answer", "maxTries"];

/// Comment delimiters: JSX expression comments and HTML comments.
const COMMENTS: [(&str, &str); 2] = [("{/*", "*/"), ("<!--", "-->")];

/// A `<Quiz>` tag that could not be turned into props.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line where the tag starts.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// One tag found in a page: its 1-based line and props, or why it failed.
pub type Extracted = Result<(usize, QuizProps), ParseError>;

/// Find every `<Quiz>` tag in a page, in document order.
pub fn extract_quizzes(text: &str) -> Vec<Extracted> {
    let fences = fenced_ranges(text);
    let mut results = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        if let Some(fence) = fences.iter().find(|r| r.contains(&pos)) {
            pos = fence.end;
            continue;
        }

        let rest = &text[pos..];
        if let Some(len) = comment_len(rest).or_else(|| code_span_len(rest)) {
            pos += len;
            continue;
        }

        if !starts_quiz_tag(rest) {
            pos += rest.chars().next().map_or(1, char::len_utf8);
            continue;
        }

        let line = line_of(text, pos);
        let after_name = pos + TAG_OPEN.len();
        let mut cursor = Cursor::new(text, after_name);
        match parse_attributes(&mut cursor).and_then(build_props) {
            Ok(props) => {
                pos = cursor.pos;
                results.push(Ok((line, props)));
            }
            Err(message) => {
                tracing::debug!(line, %message, "rejected quiz tag");
                results.push(Err(ParseError { line, message }));
                pos = after_name;
            }
        }
    }

    results
}

// ============================================================================
// INTERNAL: document structure
// ============================================================================

/// True when `rest` opens a `<Quiz>` tag, not `<QuizBox` and friends.
fn starts_quiz_tag(rest: &str) -> bool {
    match rest.strip_prefix(TAG_OPEN).and_then(|after| after.chars().next()) {
        Some(c) => c.is_whitespace() || c == '/' || c == '>',
        None => false,
    }
}

/// Byte ranges covered by ``` or ~~~ fenced code blocks.
///
/// An unclosed fence runs to the end of the document.
fn fenced_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut open: Option<(usize, &str)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let marker = if trimmed.starts_with("```") {
            Some("```")
        } else if trimmed.starts_with("~~~") {
            Some("~~~")
        } else {
            None
        };

        match (open, marker) {
            (None, Some(m)) => open = Some((offset, m)),
            (Some((begin, m)), Some(found)) if m == found => {
                ranges.push(begin..offset + line.len());
                open = None;
            }
            _ => {}
        }
        offset += line.len();
    }

    if let Some((begin, _)) = open {
        ranges.push(begin..text.len());
    }
    ranges
}

/// Length of a comment starting at the head of `rest`, if one does.
///
/// A JSX comment includes its closing `}`. An unclosed comment runs to
/// the end of the document.
fn comment_len(rest: &str) -> Option<usize> {
    let (open, close) = COMMENTS.iter().find(|(open, _)| rest.starts_with(open))?;
    let body = &rest[open.len()..];
    let Some(idx) = body.find(close) else {
        return Some(rest.len());
    };
    let mut end = open.len() + idx + close.len();
    if *open == "{/*" {
        let tail = &rest[end..];
        let trimmed = tail.trim_start();
        if trimmed.starts_with('}') {
            end += tail.len() - trimmed.len() + 1;
        }
    }
    Some(end)
}

/// Length of an inline code span starting at the head of `rest`.
///
/// A run of N backticks is closed by the next run of exactly N backticks
/// in the same paragraph. An unmatched run is literal text and only the
/// run itself is consumed.
fn code_span_len(rest: &str) -> Option<usize> {
    let ticks = rest.bytes().take_while(|&b| b == b'`').count();
    if ticks == 0 {
        return None;
    }

    let paragraph_end = rest[ticks..].find("\n\n").map_or(rest.len(), |i| ticks + i);
    let mut i = ticks;
    while i < paragraph_end {
        if rest.as_bytes()[i] != b'`' {
            i += 1;
            continue;
        }
        let run = rest[i..].bytes().take_while(|&b| b == b'`').count();
        if run == ticks && i + run <= paragraph_end {
            return Some(i + run);
        }
        i += run;
    }
    Some(ticks)
}

fn line_of(text: &str, byte: usize) -> usize {
    text[..byte].bytes().filter(|&b| b == b'\n').count() + 1
}

// ============================================================================
// INTERNAL: attribute parsing
// ============================================================================

enum AttrValue {
    Str(String),
    Expr(Value),
    Infinity,
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Cursor { src, pos }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }
}

/// Parse `name=value` pairs up to the end of the opening tag.
fn parse_attributes(cursor: &mut Cursor<'_>) -> Result<Vec<(String, AttrValue)>, String> {
    let mut attrs = Vec::new();

    loop {
        cursor.skip_ws();
        match cursor.peek() {
            None => return Err("unterminated <Quiz> tag".to_string()),
            Some('/') => {
                cursor.bump();
                if cursor.bump() != Some('>') {
                    return Err("expected '>' after '/'".to_string());
                }
                return Ok(attrs);
            }
            Some('>') => {
                cursor.bump();
                return Ok(attrs);
            }
            Some(c) if c.is_alphabetic() || c == '_' => {
                let name = cursor
                    .take_while(|c| c.is_alphanumeric() || c == '_' || c == '-')
                    .to_string();
                cursor.skip_ws();
                let value = if cursor.peek() == Some('=') {
                    cursor.bump();
                    cursor.skip_ws();
                    parse_value(cursor, &name)?
                } else {
                    AttrValue::Expr(Value::Bool(true))
                };
                attrs.push((name, value));
            }
            Some(c) => return Err(format!("unexpected character '{}' in <Quiz> tag", c)),
        }
    }
}

fn parse_value(cursor: &mut Cursor<'_>, name: &str) -> Result<AttrValue, String> {
    match cursor.peek() {
        Some(q @ ('"' | '\'')) => {
            cursor.bump();
            let mut body = String::new();
            loop {
                match cursor.bump() {
                    None => return Err(format!("{}: unterminated string", name)),
                    Some(c) if c == q => break,
                    Some('\\') if cursor.peek() == Some(q) => {
                        cursor.bump();
                        body.push(q);
                    }
                    Some(c) => body.push(c),
                }
            }
            Ok(AttrValue::Str(decode_entities(&body)))
        }
        Some('{') => {
            let body = take_braced(cursor).ok_or_else(|| format!("{}: unbalanced '{{'", name))?;
            let body = body.trim();
            if body == "Infinity" {
                return Ok(AttrValue::Infinity);
            }
            serde_json::from_str(body)
                .map(AttrValue::Expr)
                .map_err(|e| format!("{}: expected a JSON value ({})", name, e))
        }
        _ => Err(format!("{}: expected a quoted string or {{...}}", name)),
    }
}

/// Consume `{ ... }` and return the text between the outer braces.
fn take_braced<'a>(cursor: &mut Cursor<'a>) -> Option<&'a str> {
    debug_assert_eq!(cursor.peek(), Some('{'));
    cursor.bump();
    let start = cursor.pos;
    let mut depth = 1usize;
    let mut in_string: Option<char> = None;

    while let Some(c) = cursor.bump() {
        match in_string {
            Some(q) => {
                if c == '\\' {
                    cursor.bump();
                } else if c == q {
                    in_string = None;
                }
            }
            None => match c {
                '"' | '\'' | '`' => in_string = Some(c),
                '{' | '[' => depth += 1,
                // A ']' can never close the outer brace.
                ']' => depth = depth.checked_sub(1).filter(|&d| d > 0)?,
                '}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(&cursor.src[start..cursor.pos - 1]);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Turn parsed attributes into props, letting serde report missing or
/// mistyped fields.
fn build_props(attrs: Vec<(String, AttrValue)>) -> Result<QuizProps, String> {
    let mut map = Map::new();

    for (name, value) in attrs {
        if !KNOWN_PROPS.contains(&name.as_str()) {
            tracing::debug!(%name, "ignoring unknown quiz prop");
            continue;
        }
        let json = match value {
            AttrValue::Str(s) => Value::String(s),
            AttrValue::Expr(v) => v,
            AttrValue::Infinity if name == "maxTries" => Value::Null,
            AttrValue::Infinity => return Err(format!("{}: Infinity is only valid for maxTries", name)),
        };
        map.insert(name, json);
    }

    serde_json::from_value(Value::Object(map)).map_err(|e| e.to_string())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TriesProp;

    fn only_ok(text: &str) -> (usize, QuizProps) {
        let mut found = extract_quizzes(text);
        assert_eq!(found.len(), 1, "expected exactly one tag");
        found.remove(0).expect("tag should parse")
    }

    #[test]
    fn extracts_self_closing_tag() {
        let (line, props) = only_ok(
            r#"# Capacitors

<Quiz question="What is the SI unit of capacitance?" options={["Henry", "Farad", "Tesla"]} answer={1} />
"#,
        );
        assert_eq!(line, 3);
        assert_eq!(props.question, "What is the SI unit of capacitance?");
        assert_eq!(props.options, vec!["Henry", "Farad", "Tesla"]);
        assert_eq!(props.answer, 1);
        assert_eq!(props.max_tries, None);
    }

    #[test]
    fn extracts_multiline_tag_with_max_tries() {
        let (line, props) = only_ok(
            "intro\n\n<Quiz\n  question='Which law relates E to enclosed charge?'\n  options={[\n    \"Gauss\",\n    \"Faraday\"\n  ]}\n  answer={0}\n  maxTries={2}\n/>\n",
        );
        assert_eq!(line, 3);
        assert_eq!(props.options.len(), 2);
        assert_eq!(props.max_tries, Some(TriesProp::Count(2)));
    }

    #[test]
    fn infinity_means_unlimited() {
        let (_, props) =
            only_ok(r#"<Quiz question="Q" options={["a"]} answer={0} maxTries={Infinity} />"#);
        assert_eq!(props.max_tries, Some(TriesProp::Unlimited));
    }

    #[test]
    fn braces_inside_strings_do_not_end_expression() {
        let (_, props) = only_ok(
            r#"<Quiz question="Field?" options={["{E}", "a } b", "[x"]} answer={2} />"#,
        );
        assert_eq!(props.options, vec!["{E}", "a } b", "[x"]);
    }

    #[test]
    fn html_entities_are_decoded() {
        let (_, props) = only_ok(
            r#"<Quiz question="Is V &lt; 0 &amp; &quot;safe&quot;?" options={["yes"]} answer={0} />"#,
        );
        assert_eq!(props.question, "Is V < 0 & \"safe\"?");
    }

    #[test]
    fn unknown_props_are_ignored() {
        let (_, props) =
            only_ok(r#"<Quiz key="q1" question="Q" options={["a"]} answer={0} compact />"#);
        assert_eq!(props.question, "Q");
    }

    #[test]
    fn fenced_code_is_skipped() {
        let text = "```jsx\n<Quiz question=\"demo\" options={[\"a\"]} answer={0} />\n```\n\n<Quiz question=\"real\" options={[\"a\"]} answer={0} />\n";
        let (line, props) = only_ok(text);
        assert_eq!(props.question, "real");
        assert_eq!(line, 5);
    }

    #[test]
    fn other_components_are_skipped() {
        assert!(extract_quizzes("<QuizBox title=\"x\" />").is_empty());
    }

    #[test]
    fn missing_answer_is_parse_error() {
        let found = extract_quizzes(r#"<Quiz question="Q" options={["a"]} />"#);
        assert_eq!(found.len(), 1);
        let err = found[0].as_ref().unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("answer"), "got: {}", err.message);
    }

    #[test]
    fn js_only_syntax_is_parse_error() {
        let found = extract_quizzes("<Quiz question=\"Q\" options={['a', 'b']} answer={0} />");
        let err = found[0].as_ref().unwrap_err();
        assert!(err.message.starts_with("options:"), "got: {}", err.message);
    }

    #[test]
    fn unterminated_tag_is_parse_error() {
        let found = extract_quizzes("<Quiz question=\"Q\"");
        assert_eq!(
            found[0].as_ref().unwrap_err().message,
            "unterminated <Quiz> tag"
        );
    }

    #[test]
    fn bad_tag_does_not_hide_following_tags() {
        let text = "<Quiz answer={0 />\n<Quiz question=\"ok\" options={[\"a\"]} answer={0} />";
        let found = extract_quizzes(text);
        assert!(found.iter().any(|r| matches!(r, Ok((2, p)) if p.question == "ok")));
    }

    #[test]
    fn stray_closing_bracket_is_parse_error() {
        let found = extract_quizzes("<Quiz question=\"Q\" options={]} answer={0} />");
        assert_eq!(found.len(), 1);
        let err = found[0].as_ref().unwrap_err();
        assert!(err.message.contains("unbalanced"), "got: {}", err.message);
    }

    #[test]
    fn escaped_quotes_in_strings() {
        let (_, props) = only_ok(
            r#"<Quiz question="Say \"hi\"" options={["\\frac{a}{b}"]} answer={0} />"#,
        );
        assert_eq!(props.question, "Say \"hi\"");
        assert_eq!(props.options, vec!["\\frac{a}{b}"]);
    }

    #[test]
    fn backslashes_are_literal_unless_escaping_the_quote() {
        let (_, props) =
            only_ok(r#"<Quiz question='E = \frac{q}{r}' options={["a"]} answer={0} />"#);
        assert_eq!(props.question, "E = \\frac{q}{r}");
    }

    #[test]
    fn commented_out_tags_are_skipped() {
        let text = "{/* <Quiz question=\"old\" options={[\"a\"]} answer={0} /> */}\n<!--\n<Quiz question=\"draft\" />\n-->\n<Quiz question=\"real\" options={[\"a\"]} answer={0} />\n";
        let (line, props) = only_ok(text);
        assert_eq!(props.question, "real");
        assert_eq!(line, 5);
    }

    #[test]
    fn unclosed_comment_hides_rest_of_page() {
        let text = "{/* draft\n<Quiz question=\"Q\" options={[\"a\"]} answer={0} />\n";
        assert!(extract_quizzes(text).is_empty());
    }

    #[test]
    fn inline_code_is_skipped() {
        let text = "Write `<Quiz question=\"Q\" />` or ``<Quiz />`` in a page.\n\n<Quiz question=\"real\" options={[\"a\"]} answer={0} />\n";
        let (line, props) = only_ok(text);
        assert_eq!(props.question, "real");
        assert_eq!(line, 3);
    }

    #[test]
    fn unmatched_backtick_does_not_hide_tags() {
        let text = "a stray ` tick\n\n<Quiz question=\"Q\" options={[\"a\"]} answer={0} />\n";
        let (line, _) = only_ok(text);
        assert_eq!(line, 3);
    }

    #[test]
    fn multiple_tags_in_order() {
        let text = "<Quiz question=\"one\" options={[\"a\"]} answer={0} />\n\ntext\n<Quiz question=\"two\" options={[\"a\"]} answer={0} />\n";
        let found: Vec<_> = extract_quizzes(text)
            .into_iter()
            .map(|r| r.unwrap())
            .map(|(line, p)| (line, p.question))
            .collect();
        assert_eq!(found, vec![(1, "one".to_string()), (4, "two".to_string())]);
    }
}
