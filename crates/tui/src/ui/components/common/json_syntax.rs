//! Syntax-highlighted pretty JSON for the details panel.

use std::io;

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use serde_json::Value;

use crate::ui::theme::roles::Theme;

/// Upper bound on serialized bytes kept for one details view.
const MAX_PRETTY_BYTES: usize = 64 * 1024;

/// Pretty-prints `value` and returns at most `max_lines` highlighted lines.
/// A final `…` line marks truncation.
pub fn highlighted_json_lines(value: &Value, theme: &dyn Theme, max_lines: usize) -> Vec<Line<'static>> {
    if max_lines == 0 {
        return Vec::new();
    }
    let (formatted, truncated) = pretty_prefix(value, max_lines);
    let mut lines: Vec<Line<'static>> = formatted
        .lines()
        .take(max_lines)
        .map(|line| Line::from(highlight_line(line, theme)))
        .collect();
    if truncated {
        lines.push(Line::from(Span::styled("…", theme.text_muted_style())));
    }
    lines
}

/// Serializes only as much of `value` as `max_lines` lines need.
///
/// Returns the text and whether anything was left out.
fn pretty_prefix(value: &Value, max_lines: usize) -> (String, bool) {
    let mut writer = LineBudget::new(max_lines, MAX_PRETTY_BYTES);
    // The writer errors out once the budget is spent, which stops serialization.
    let _ = serde_json::to_writer_pretty(&mut writer, value);
    (String::from_utf8_lossy(&writer.buffer).into_owned(), writer.truncated)
}

/// Collects output until `max_lines` lines or `max_bytes` bytes are seen.
struct LineBudget {
    buffer: Vec<u8>,
    max_lines: usize,
    max_bytes: usize,
    lines: usize,
    truncated: bool,
}

impl LineBudget {
    fn new(max_lines: usize, max_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_lines,
            max_bytes,
            lines: 0,
            truncated: false,
        }
    }

    fn exhausted(&mut self) -> io::Error {
        self.truncated = true;
        io::Error::other("line budget spent")
    }
}

impl io::Write for LineBudget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            if byte == b'\n' {
                // Pretty output never ends with a newline, so another line follows.
                self.lines += 1;
                if self.lines >= self.max_lines {
                    return Err(self.exhausted());
                }
            }
            if self.buffer.len() >= self.max_bytes {
                return Err(self.exhausted());
            }
            self.buffer.push(byte);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Whitespace,
    Key,
    Str,
    Number,
    Keyword,
    Null,
    Punctuation,
    Other,
}

fn token_style(token: Token, theme: &dyn Theme) -> Style {
    match token {
        Token::Key => theme.accent_secondary_style(),
        Token::Str => theme.syntax_string_style(),
        Token::Number => theme.syntax_number_style(),
        Token::Keyword => theme.syntax_keyword_style(),
        Token::Null => theme.text_muted_style(),
        Token::Punctuation => theme.syntax_type_style(),
        Token::Whitespace | Token::Other => theme.text_primary_style(),
    }
}

fn highlight_line(line: &str, theme: &dyn Theme) -> Vec<Span<'static>> {
    tokenize(line)
        .into_iter()
        .map(|(token, text)| Span::styled(text.to_string(), token_style(token, theme)))
        .collect()
}

fn tokenize(line: &str) -> Vec<(Token, &str)> {
    let mut tokens = Vec::new();
    let mut index = 0usize;
    while let Some(character) = line[index..].chars().next() {
        let rest = &line[index..];
        let (token, length) = if character.is_whitespace() {
            let end = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
            (Token::Whitespace, end)
        } else if character == '"' {
            let length = string_length(rest);
            let is_key = rest[length..].trim_start().starts_with(':');
            (if is_key { Token::Key } else { Token::Str }, length)
        } else if matches!(character, '{' | '}' | '[' | ']' | ':' | ',') {
            (Token::Punctuation, 1)
        } else if let Some(keyword) = ["true", "false"].into_iter().find(|keyword| starts_with_word(rest, keyword)) {
            (Token::Keyword, keyword.len())
        } else if starts_with_word(rest, "null") {
            (Token::Null, 4)
        } else if character == '-' || character.is_ascii_digit() {
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
                .unwrap_or(rest.len());
            (Token::Number, end)
        } else {
            (Token::Other, character.len_utf8())
        };
        tokens.push((token, &rest[..length]));
        index += length;
    }
    tokens
}

/// Byte length of the string literal at the start of `input`, quotes included.
fn string_length(input: &str) -> usize {
    let mut escaped = false;
    for (offset, byte) in input.bytes().enumerate().skip(1) {
        match byte {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'"' => return offset + 1,
            _ => {}
        }
    }
    input.len()
}

fn starts_with_word(input: &str, word: &str) -> bool {
    input
        .strip_prefix(word)
        .is_some_and(|rest| rest.chars().next().is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::DraculaTheme;
    use serde_json::json;

    fn kinds(line: &str) -> Vec<Token> {
        tokenize(line)
            .into_iter()
            .filter(|(token, _)| *token != Token::Whitespace)
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn keys_and_string_values_are_distinguished() {
        assert_eq!(
            kinds(r#"  "email": "ada@example.com","#),
            vec![Token::Key, Token::Punctuation, Token::Str, Token::Punctuation]
        );
    }

    #[test]
    fn escaped_quotes_stay_inside_the_literal() {
        let line = r#""say \"hi\"" : 1"#;
        let tokens = tokenize(line);
        assert_eq!(tokens[0], (Token::Key, r#""say \"hi\"""#));
    }

    #[test]
    fn literals_are_classified() {
        assert_eq!(
            kinds("[true, null, -1.5e3, trueish]"),
            vec![
                Token::Punctuation,
                Token::Keyword,
                Token::Punctuation,
                Token::Null,
                Token::Punctuation,
                Token::Number,
                Token::Punctuation,
                Token::Other,
                Token::Other,
                Token::Other,
                Token::Other,
                Token::Other,
                Token::Other,
                Token::Other,
                Token::Punctuation,
            ]
        );
    }

    #[test]
    fn long_values_are_truncated_with_marker() {
        let theme = DraculaTheme::new();
        let value = json!({ "a": 1, "b": 2, "c": 3 });
        let lines = highlighted_json_lines(&value, &theme, 2);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].spans[0].content, "…");

        let all = highlighted_json_lines(&value, &theme, 10);
        assert_eq!(all.len(), 5);
        assert_ne!(all[4].spans[0].content, "…");

        let exact = highlighted_json_lines(&value, &theme, 5);
        assert_eq!(exact.len(), 5);
    }

    #[test]
    fn large_values_serialize_only_the_visible_lines() {
        let value = Value::Array((0..200_000).map(|n| json!({ "n": n })).collect());
        let (text, truncated) = pretty_prefix(&value, 4);
        assert!(truncated);
        assert_eq!(text, "[\n  {\n    \"n\": 0\n  },");

        let theme = DraculaTheme::new();
        let lines = highlighted_json_lines(&value, &theme, 4);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4].spans[0].content, "…");
    }

    #[test]
    fn long_single_lines_are_capped_by_bytes() {
        let value = json!("x".repeat(MAX_PRETTY_BYTES * 2));
        let (text, truncated) = pretty_prefix(&value, 10);
        assert!(truncated);
        assert_eq!(text.len(), MAX_PRETTY_BYTES);
    }
}
