//! Scalar literal recognizer
//!
//! Decides whether a bare token is a boolean, null, number or string, and
//! unquotes quoted strings.

use crate::yaml::Value;

/// Classify an unquoted token.
///
/// `true`/`false` (any case) are booleans, `null`/`~` are null, base-10
/// integers and decimals are numbers, anything else is a string.
pub fn recognize(token: &str) -> Value {
    let token = token.trim();

    if token.is_empty() || token == "~" || token.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if token.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if token.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if is_decimal_number(token) {
        if let Ok(n) = token.parse::<f64>() {
            return Value::Number(n);
        }
    }

    Value::String(token.to_string())
}

/// Parse a scalar that may be quoted.
pub fn parse_scalar(token: &str) -> Value {
    match unquote(token) {
        Some(s) => Value::String(s),
        None => recognize(token),
    }
}

/// `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`
pub fn is_decimal_number(token: &str) -> bool {
    let bytes = token.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }

    if int_digits == 0 && frac_digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

/// Unquote a fully quoted token.
///
/// Returns `None` unless the token both starts and ends with the same quote
/// character. Double quotes resolve `\"`, `\n`, `\r`, `\t` and `\\`; single
/// quotes resolve `''`.
pub fn unquote(token: &str) -> Option<String> {
    let quote = token.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let end = closing_quote(token)?;
    if end != token.len() - 1 {
        return None;
    }

    let body = &token[1..end];
    Some(if quote == '"' {
        unescape(body)
    } else {
        body.replace("''", "'")
    })
}

/// Byte index of the quote closing the string that opens `token`.
pub fn closing_quote(token: &str) -> Option<usize> {
    let bytes = token.as_bytes();
    let quote = *bytes.first()?;
    let mut i = 1;

    while i < bytes.len() {
        let b = bytes[i];
        if quote == b'"' && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }

    None
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(recognize("true"), Value::Bool(true));
        assert_eq!(recognize("FALSE"), Value::Bool(false));
        assert_eq!(recognize("Null"), Value::Null);
        assert_eq!(recognize("~"), Value::Null);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(recognize("42"), Value::Number(42.0));
        assert_eq!(recognize("-0.5"), Value::Number(-0.5));
        assert_eq!(recognize("1e3"), Value::Number(1000.0));
        assert_eq!(recognize(".25"), Value::Number(0.25));
    }

    #[test]
    fn test_version_strings_stay_strings() {
        assert_eq!(recognize("1.0.0"), Value::from("1.0.0"));
        assert_eq!(recognize("3.0.3"), Value::from("3.0.3"));
    }

    #[test]
    fn test_non_decimal_tokens_stay_strings() {
        for token in ["inf", "NaN", "0x1F", "1e", "+", ".", "12abc"] {
            assert_eq!(recognize(token), Value::from(token), "token {:?}", token);
        }
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""a\"b\n""#).as_deref(), Some("a\"b\n"));
        assert_eq!(unquote(r"'it''s'").as_deref(), Some("it's"));
        assert_eq!(unquote(r"'no\n'").as_deref(), Some("no\\n"));
        assert_eq!(unquote("\"open"), None);
        assert_eq!(unquote("\"a\" b"), None);
        assert_eq!(unquote("plain"), None);
    }

    #[test]
    fn test_parse_scalar_keeps_quoted_keywords_as_strings() {
        assert_eq!(parse_scalar("\"true\""), Value::from("true"));
        assert_eq!(parse_scalar("'200'"), Value::from("200"));
        assert_eq!(parse_scalar("200"), Value::Number(200.0));
    }
}
