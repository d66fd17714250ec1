//! Inline flow collections (`{...}` / `[...]`)
//!
//! JSON is tried first. Plain YAML flow syntax (`[a, b]`, `{type: string}`)
//! is accepted by a small recursive-descent fallback.

use super::Value;
use crate::scalar;
use std::collections::HashMap;

/// Parse a flow collection, or `None` if `text` is not one.
pub fn parse_flow(text: &str) -> Option<Value> {
    let text = text.trim();
    if !(text.starts_with('{') || text.starts_with('[')) {
        return None;
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
        return Some(Value::from(json));
    }

    let mut parser = FlowParser { src: text, pos: 0 };
    let value = parser.value()?;
    parser.skip_ws();
    (parser.pos == text.len()).then_some(value)
}

/// Whether every bracket opened in `text` is closed, ignoring quoted strings.
pub fn is_balanced(text: &str) -> bool {
    let mut depth: i64 = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in text.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' && q == '"' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && quote.is_none()
}

struct FlowParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> FlowParser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Option<Value> {
        self.skip_ws();
        match self.peek()? {
            '[' => self.sequence(),
            '{' => self.mapping(),
            '"' | '\'' => self.quoted().map(Value::String),
            _ => Some(scalar::recognize(self.plain(&[',', ']', '}']))),
        }
    }

    fn sequence(&mut self) -> Option<Value> {
        self.eat('[');
        let mut items = Vec::new();

        loop {
            self.skip_ws();
            if self.eat(']') {
                return Some(Value::Sequence(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            if !self.eat(',') && self.peek() != Some(']') {
                return None;
            }
        }
    }

    fn mapping(&mut self) -> Option<Value> {
        self.eat('{');
        let mut map = HashMap::new();

        loop {
            self.skip_ws();
            if self.eat('}') {
                return Some(Value::Mapping(map));
            }

            let key = match self.peek()? {
                '"' | '\'' => self.quoted()?,
                _ => self.plain(&[':', ',', '}']).to_string(),
            };
            self.skip_ws();

            let value = if self.eat(':') {
                self.skip_ws();
                if matches!(self.peek(), Some(',') | Some('}')) {
                    Value::Null
                } else {
                    self.value()?
                }
            } else {
                Value::Null
            };
            map.insert(key, value);

            self.skip_ws();
            if !self.eat(',') && self.peek() != Some('}') {
                return None;
            }
        }
    }

    fn quoted(&mut self) -> Option<String> {
        let rest = self.rest();
        let end = scalar::closing_quote(rest)?;
        let token = &rest[..=end];
        self.pos += end + 1;
        scalar::unquote(token)
    }

    fn plain(&mut self, stops: &[char]) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| stops.contains(&c)).unwrap_or(rest.len());
        self.pos += len;
        rest[..len].trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flow() {
        let value = parse_flow(r#"{"a": [1, true, null]}"#).unwrap();
        assert_eq!(
            value.get("a"),
            Some(&Value::Sequence(vec![
                Value::Number(1.0),
                Value::Bool(true),
                Value::Null
            ]))
        );
    }

    #[test]
    fn test_yaml_flow_sequence() {
        assert_eq!(
            parse_flow("[a, 'b c', 3]"),
            Some(Value::Sequence(vec![
                Value::from("a"),
                Value::from("b c"),
                Value::Number(3.0)
            ]))
        );
        assert_eq!(parse_flow("[]"), Some(Value::Sequence(vec![])));
    }

    #[test]
    fn test_yaml_flow_mapping() {
        let value = parse_flow("{type: string, format: uri, items: [x]}").unwrap();
        assert_eq!(value.get("type"), Some(&Value::from("string")));
        assert_eq!(value.get("format"), Some(&Value::from("uri")));
        assert_eq!(
            value.get("items"),
            Some(&Value::Sequence(vec![Value::from("x")]))
        );
    }

    #[test]
    fn test_malformed_flow_is_rejected() {
        assert_eq!(parse_flow("[a, b"), None);
        assert_eq!(parse_flow("{a: 1} trailing"), None);
        assert_eq!(parse_flow("plain"), None);
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("[a, [b]]"));
        assert!(!is_balanced("[a, {b: 1}"));
        assert!(is_balanced("['[', \"]\"]"));
    }
}
