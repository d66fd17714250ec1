//! Line classifier shared by both decoders
//!
//! Splits source text into physical lines (normalizing `\n`, `\r\n` and `\r`)
//! and measures each line's indentation in leading spaces.

use crate::options::TabPolicy;
use apiconv_common::{ConverterError, Result};

/// One physical line with its indentation measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedLine<'a> {
    /// 1-based line number
    pub number: usize,
    /// Leading whitespace width in columns
    pub indent: usize,
    /// Line with leading and trailing whitespace removed
    pub content: &'a str,
    /// Line as it appeared in the source, without its terminator
    pub raw: &'a str,
}

impl<'a> ClassifiedLine<'a> {
    pub fn is_blank(&self) -> bool {
        self.content.is_empty()
    }

    /// Full-line `#` comment
    pub fn is_comment(&self) -> bool {
        self.content.starts_with('#')
    }

    /// Blank or comment
    pub fn is_skippable(&self) -> bool {
        self.is_blank() || self.is_comment()
    }

    /// The raw line with its leading whitespace removed, trailing kept
    pub fn verbatim(&self) -> &'a str {
        self.raw.trim_start()
    }
}

/// Split text into lines, treating `\r\n` and bare `\r` as `\n`
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    if start < bytes.len() {
        lines.push(&text[start..]);
    }

    lines
}

/// Measure and trim one raw line
pub fn classify(raw: &str, number: usize, policy: TabPolicy) -> Result<ClassifiedLine<'_>> {
    let content = raw.trim();
    if content.is_empty() {
        return Ok(ClassifiedLine {
            number,
            indent: 0,
            content,
            raw,
        });
    }

    let mut indent = 0;

    for ch in raw.chars() {
        match ch {
            ' ' => indent += 1,
            '\t' => match policy {
                TabPolicy::Literal => break,
                TabPolicy::Expand(width) => indent += width,
                TabPolicy::Reject => {
                    return Err(ConverterError::syntax(
                        number,
                        "tab character in indentation",
                    ))
                }
            },
            _ => break,
        }
    }

    Ok(ClassifiedLine {
        number,
        indent,
        content,
        raw,
    })
}

/// Split and classify a whole document
pub fn classify_all(text: &str, policy: TabPolicy) -> Result<Vec<ClassifiedLine<'_>>> {
    split_lines(text)
        .into_iter()
        .enumerate()
        .map(|(i, raw)| classify(raw, i + 1, policy))
        .collect()
}
