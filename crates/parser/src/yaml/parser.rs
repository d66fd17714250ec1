//! Indentation-driven value parser
//!
//! Works over classified lines. Each block (mapping or sequence) owns the
//! lines at its indentation and hands more-indented lines to a nested block,
//! so a block never sees a line less indented than itself without having
//! returned first.

use super::flow;
use super::Value;
use crate::line::{self, ClassifiedLine};
use crate::options::ParseOptions;
use crate::scalar;
use apiconv_common::{ConverterError, Result};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Parse a document with default options.
pub fn parse_document(text: &str) -> Result<Value> {
    parse_document_with(text, &ParseOptions::default())
}

/// Parse a document into a generic value tree.
pub fn parse_document_with(text: &str, options: &ParseOptions) -> Result<Value> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
            trace!("document is plain JSON");
            return Ok(Value::from(json));
        }
    }

    let lines = line::classify_all(text, options.tab_policy)?;
    let mut parser = ValueParser {
        lines,
        pos: 0,
        options,
    };
    parser.parse_root()
}

struct ValueParser<'a, 'o> {
    lines: Vec<ClassifiedLine<'a>>,
    pos: usize,
    options: &'o ParseOptions,
}

impl<'a, 'o> ValueParser<'a, 'o> {
    fn parse_root(&mut self) -> Result<Value> {
        match self.peek() {
            None => return Ok(Value::Null),
            Some(first) if first.content == "---" => self.pos += 1,
            Some(_) => {}
        }

        let value = self.parse_block()?;

        if let Some(extra) = self.peek() {
            debug!(
                line = extra.number,
                "ignoring content after the root value"
            );
        }
        Ok(value)
    }

    /// Next line that is neither blank nor a comment, without consuming it.
    fn peek(&mut self) -> Option<ClassifiedLine<'a>> {
        while let Some(line) = self.lines.get(self.pos) {
            if !line.is_skippable() {
                return Some(*line);
            }
            self.pos += 1;
        }
        None
    }

    /// Parse the block starting at the next line, kind decided by that line.
    fn parse_block(&mut self) -> Result<Value> {
        let Some(first) = self.peek() else {
            return Ok(Value::Null);
        };

        if is_sequence_item(first.content) {
            return self.parse_sequence(first.indent);
        }
        if split_key(first.content).is_some() {
            return self.parse_mapping(first.indent);
        }

        self.pos += 1;
        let owner = ClassifiedLine {
            indent: first.indent.saturating_sub(1),
            ..first
        };
        self.parse_inline(strip_comment(first.content), &owner)
    }

    fn parse_mapping(&mut self, indent: usize) -> Result<Value> {
        let mut map = HashMap::new();

        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent == indent && is_sequence_item(line.content) {
                break;
            }
            self.pos += 1;

            let Some((key, rest)) = split_key(line.content) else {
                debug!(
                    line = line.number,
                    content = line.content,
                    "dropping mapping line without a key"
                );
                continue;
            };

            let rest = strip_comment(rest);
            let value = if rest.is_empty() {
                self.parse_nested(line.indent, true)?
            } else {
                self.parse_inline(rest, &line)?
            };
            trace!(key = %key, "mapping entry");
            map.insert(key, value);
        }

        Ok(Value::Mapping(map))
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<Value> {
        let mut items = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                debug!(line = line.number, "ignoring stray indented line in sequence");
                self.pos += 1;
                continue;
            }
            if !is_sequence_item(line.content) {
                break;
            }
            self.pos += 1;

            let after_dash = line.content[1..].trim_start();
            let column = line.indent + line.content.len() - after_dash.len();
            let rest = strip_comment(after_dash);

            let item = if rest.is_empty() {
                self.parse_nested(line.indent, false)?
            } else if is_sequence_item(rest) || split_key(rest).is_some() {
                // Compact form: re-read the item content as a block at its own column
                self.pos -= 1;
                self.lines[self.pos] = ClassifiedLine {
                    indent: column,
                    content: rest,
                    ..line
                };
                self.parse_block()?
            } else {
                self.parse_inline(rest, &line)?
            };
            items.push(item);
        }

        Ok(Value::Sequence(items))
    }

    /// Value for a key or dash with nothing after it on the line.
    fn parse_nested(&mut self, owner_indent: usize, allow_indentless: bool) -> Result<Value> {
        match self.peek() {
            Some(next) if next.indent > owner_indent => self.parse_block(),
            Some(next)
                if allow_indentless
                    && next.indent == owner_indent
                    && is_sequence_item(next.content) =>
            {
                self.parse_sequence(owner_indent)
            }
            _ => Ok(Value::Null),
        }
    }

    /// Value written on the same line as its key or dash.
    fn parse_inline(&mut self, text: &str, owner: &ClassifiedLine<'a>) -> Result<Value> {
        if let Some(folded) = block_indicator(text) {
            return Ok(Value::String(self.parse_block_scalar(owner.indent, folded)));
        }

        if text.starts_with('{') || text.starts_with('[') {
            let source = self.collect_flow(text, owner.indent);
            if let Some(value) = flow::parse_flow(&source) {
                return Ok(value);
            }
            if self.options.strict_flow {
                return Err(ConverterError::syntax(
                    owner.number,
                    format!("invalid flow collection: {}", source),
                ));
            }
            debug!(line = owner.number, "flow collection kept as a string");
            return Ok(Value::String(source));
        }

        if text.starts_with('"') || text.starts_with('\'') {
            if let Some(s) = scalar::unquote(text) {
                return Ok(Value::String(s));
            }
            let folded = self.fold_plain(text, owner.indent);
            return Ok(match scalar::unquote(&folded) {
                Some(s) => Value::String(s),
                None => Value::String(folded),
            });
        }

        if text.starts_with('@') || text.starts_with('`') {
            if self.options.strict_flow {
                return Err(ConverterError::syntax(
                    owner.number,
                    format!("reserved indicator at start of plain scalar: {}", text),
                ));
            }
            debug!(line = owner.number, "reserved indicator kept as a string");
            return Ok(Value::String(self.fold_plain(text, owner.indent)));
        }

        Ok(scalar::recognize(&self.fold_plain(text, owner.indent)))
    }

    /// Join more-indented continuation lines of a plain scalar with spaces.
    fn fold_plain(&mut self, text: &str, owner_indent: usize) -> String {
        let mut out = text.to_string();
        while let Some(next) = self.peek() {
            if next.indent <= owner_indent {
                break;
            }
            out.push(' ');
            out.push_str(strip_comment(next.content));
            self.pos += 1;
        }
        out
    }

    /// Extend an unbalanced flow collection with more-indented lines.
    fn collect_flow(&mut self, text: &str, owner_indent: usize) -> String {
        let mut out = text.to_string();
        while !flow::is_balanced(&out) {
            match self.peek() {
                Some(next) if next.indent > owner_indent => {
                    out.push(' ');
                    out.push_str(next.content);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        out
    }

    /// Consume a `|` or `>` block; blank lines inside it become newlines.
    fn parse_block_scalar(&mut self, owner_indent: usize, folded: bool) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut block_indent: Option<usize> = None;
        let mut pending_blanks = 0;

        while let Some(line) = self.lines.get(self.pos).copied() {
            if line.is_blank() {
                pending_blanks += 1;
                self.pos += 1;
                continue;
            }
            if line.indent <= owner_indent {
                break;
            }

            let base = *block_indent.get_or_insert(line.indent);
            lines.extend(std::iter::repeat(String::new()).take(pending_blanks));
            pending_blanks = 0;

            let extra = line.indent.saturating_sub(base);
            lines.push(format!("{}{}", " ".repeat(extra), line.verbatim()));
            self.pos += 1;
        }

        if folded {
            fold_lines(&lines)
        } else {
            lines.join("\n")
        }
    }
}

/// Folded style: text lines joined by a space, blank lines kept as newlines.
fn fold_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut previous_was_text = false;

    for line in lines {
        if line.is_empty() {
            out.push('\n');
            previous_was_text = false;
        } else {
            if previous_was_text {
                out.push(' ');
            }
            out.push_str(line);
            previous_was_text = true;
        }
    }

    out
}

/// `-` alone or followed by whitespace.
fn is_sequence_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ") || content.starts_with("-\t")
}

/// `|` or `>` followed only by chomping/indentation indicators.
fn block_indicator(text: &str) -> Option<bool> {
    let mut chars = text.chars();
    let folded = match chars.next()? {
        '|' => false,
        '>' => true,
        _ => return None,
    };
    chars
        .all(|c| c == '-' || c == '+' || c.is_ascii_digit())
        .then_some(folded)
}

/// Split `key: rest` at the first unquoted `:` followed by whitespace or end.
fn split_key(content: &str) -> Option<(String, &str)> {
    if content.is_empty()
        || content.starts_with('{')
        || content.starts_with('[')
        || content.starts_with('#')
        || is_sequence_item(content)
    {
        return None;
    }

    if content.starts_with('"') || content.starts_with('\'') {
        let end = scalar::closing_quote(content)?;
        let key = scalar::unquote(&content[..=end])?;
        let after = content[end + 1..].trim_start().strip_prefix(':')?;
        if !(after.is_empty() || after.starts_with(char::is_whitespace)) {
            return None;
        }
        return Some((key, after.trim_start()));
    }

    let mut chars = content.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if ch == '#' && i > 0 && content[..i].ends_with(char::is_whitespace) {
            return None;
        }
        if ch != ':' {
            continue;
        }
        let separates = match chars.peek() {
            None => true,
            Some((_, next)) => next.is_whitespace(),
        };
        if separates {
            let key = content[..i].trim_end();
            if key.is_empty() {
                return None;
            }
            return Some((key.to_string(), content[i + 1..].trim_start()));
        }
    }

    None
}

/// Remove a trailing ` # comment` outside of quotes.
fn strip_comment(text: &str) -> &str {
    if text.starts_with('#') {
        return "";
    }

    let scan_from = if text.starts_with('"') || text.starts_with('\'') {
        match scalar::closing_quote(text) {
            Some(end) => end + 1,
            None => return text,
        }
    } else {
        0
    };

    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let in_flow = text.starts_with('{') || text.starts_with('[');

    for i in scan_from..bytes.len() {
        let b = bytes[i];
        if in_flow {
            match quote {
                Some(q) if b == q => {
                    quote = None;
                    continue;
                }
                Some(_) => continue,
                None if b == b'"' || b == b'\'' => {
                    quote = Some(b);
                    continue;
                }
                None => {}
            }
        }
        if b == b'#' && i > 0 && (bytes[i - 1] == b' ' || bytes[i - 1] == b'\t') {
            return text[..i].trim_end();
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("title: X"), Some(("title".to_string(), "X")));
        assert_eq!(split_key("paths:"), Some(("paths".to_string(), "")));
        assert_eq!(
            split_key("url: http://example.com"),
            Some(("url".to_string(), "http://example.com"))
        );
        assert_eq!(split_key("'200': ok"), Some(("200".to_string(), "ok")));
        assert_eq!(split_key("http://example.com"), None);
        assert_eq!(split_key("- a: b"), None);
        assert_eq!(split_key("{a: b}"), None);
        assert_eq!(split_key("\"a: b\""), None);
        assert_eq!(split_key("note # a: b"), None);
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("value # note"), "value");
        assert_eq!(strip_comment("# only"), "");
        assert_eq!(strip_comment("a#b"), "a#b");
        assert_eq!(strip_comment("\"x # y\" # z"), "\"x # y\"");
        assert_eq!(strip_comment("{\"c\": \"# f\"} # z"), "{\"c\": \"# f\"}");
    }

    #[test]
    fn test_block_indicator() {
        assert_eq!(block_indicator("|"), Some(false));
        assert_eq!(block_indicator(">-"), Some(true));
        assert_eq!(block_indicator("|2+"), Some(false));
        assert_eq!(block_indicator("| text"), None);
        assert_eq!(block_indicator(">x"), None);
    }

    #[test]
    fn test_fold_lines_keeps_blank_lines_as_newlines() {
        let lines = vec!["a".to_string(), "b".to_string(), String::new(), "c".to_string()];
        assert_eq!(fold_lines(&lines), "a b\nc");
    }
}
