//! Line rules for the Blueprint decoder
//!
//! Each rule is a pure function from a classified line and the decoder's
//! rule context to an optional [`LineEvent`]. Rules are tried in order and
//! the first match wins: header rules, then structural rules, then content
//! rules, then the body-capture / free-text fallback.

use crate::line::ClassifiedLine;
use apiconv_common::HttpMethod;

/// Decoder state visible to the rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleContext {
    pub has_title: bool,
    pub in_named_types: bool,
    /// Indent of the open `+ Parameters` marker
    pub parameter_indent: Option<usize>,
    /// Minimum indent of lines belonging to the open attribute block
    pub property_min_indent: Option<usize>,
    pub capturing: bool,
}

/// What a line means to the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent<'a> {
    Format(&'a str),
    Title(&'a str),
    Host(&'a str),
    Group(&'a str),
    DataStructures,
    Resource {
        name: &'a str,
        template: &'a str,
    },
    Action {
        name: &'a str,
        method: HttpMethod,
        template: Option<&'a str>,
    },
    NamedType {
        name: &'a str,
        attributes: Option<&'a str>,
    },
    Parameters,
    ParameterLine,
    Request {
        name: Option<&'a str>,
        content_type: Option<&'a str>,
    },
    Response {
        status: Option<&'a str>,
        content_type: Option<&'a str>,
    },
    Attributes {
        type_decl: Option<&'a str>,
    },
    Body,
    Headers,
    Schema,
    Property,
    BodyLine,
    Text,
}

type Rule = for<'a> fn(&ClassifiedLine<'a>, &RuleContext) -> Option<LineEvent<'a>>;

const RULES: &[Rule] = &[
    // header
    format_rule,
    title_rule,
    host_rule,
    // structural
    group_rule,
    resource_rule,
    action_rule,
    named_type_rule,
    data_structures_rule,
    // content
    parameters_rule,
    parameter_line_rule,
    request_rule,
    response_rule,
    attributes_rule,
    body_rule,
    headers_rule,
    schema_rule,
    property_rule,
];

/// Classify one non-blank line
pub fn classify_line<'a>(line: &ClassifiedLine<'a>, ctx: &RuleContext) -> LineEvent<'a> {
    RULES
        .iter()
        .find_map(|rule| rule(line, ctx))
        .unwrap_or(if ctx.capturing && line.indent > 0 {
            LineEvent::BodyLine
        } else {
            LineEvent::Text
        })
}

/// `#`-heading level and text
pub fn heading(content: &str) -> Option<(usize, &str)> {
    let level = content.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &content[level..];
    if !(rest.is_empty() || rest.starts_with(' ')) {
        return None;
    }
    Some((level, rest.trim()))
}

/// Text after a `+`, `-` or `*` list marker
pub fn bullet(content: &str) -> Option<&str> {
    let mut chars = content.chars();
    match chars.next()? {
        '+' | '-' | '*' => {}
        _ => return None,
    }
    let rest = chars.as_str();
    if rest.starts_with(' ') || rest.starts_with('\t') {
        Some(rest.trim())
    } else {
        None
    }
}

/// Split `Name [inside]` at its trailing bracket group
pub fn bracket_suffix(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_suffix(']')?;
    let open = body.rfind('[')?;
    Some((body[..open].trim(), body[open + 1..].trim()))
}

/// Split `Name (inside)` at its trailing parenthesized group
pub fn paren_suffix(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_suffix(')')?;
    let mut depth = 0usize;
    for (i, ch) in body.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' if depth == 0 => return Some((body[..i].trim(), body[i + 1..].trim())),
            '(' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Text after a keyword that must end or be followed by a space or `(`
fn keyword<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(word)?;
    if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('(') {
        Some(rest.trim())
    } else {
        None
    }
}

fn format_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    if line.indent != 0 {
        return None;
    }
    line.content
        .strip_prefix("FORMAT:")
        .map(|v| LineEvent::Format(v.trim()))
}

fn title_rule<'a>(line: &ClassifiedLine<'a>, ctx: &RuleContext) -> Option<LineEvent<'a>> {
    if line.indent != 0 || ctx.has_title {
        return None;
    }
    let (level, text) = heading(line.content)?;
    if level != 1
        || text.is_empty()
        || text.starts_with("Group ")
        || text.eq_ignore_ascii_case("Data Structures")
        || bracket_suffix(text).is_some()
    {
        return None;
    }
    Some(LineEvent::Title(text))
}

fn host_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    if line.indent != 0 {
        return None;
    }
    line.content
        .strip_prefix("HOST:")
        .map(|v| LineEvent::Host(v.trim()))
}

fn group_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    let (level, text) = heading(line.content)?;
    if level > 2 {
        return None;
    }
    text.strip_prefix("Group ")
        .map(|name| LineEvent::Group(name.trim()))
}

fn resource_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    let (level, text) = heading(line.content)?;
    if level > 2 {
        return None;
    }
    let (name, template) = bracket_suffix(text)?;
    if !template.starts_with('/') {
        return None;
    }
    Some(LineEvent::Resource { name, template })
}

fn action_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    let (level, text) = heading(line.content)?;
    if level != 3 {
        return None;
    }
    let (name, inside) = bracket_suffix(text)?;
    let (verb, template) = match inside.split_once(' ') {
        Some((verb, template)) => (verb, Some(template.trim())),
        None => (inside, None),
    };
    let method = verb.parse::<HttpMethod>().ok()?;
    Some(LineEvent::Action {
        name,
        method,
        template: template.filter(|t| t.starts_with('/')),
    })
}

fn named_type_rule<'a>(line: &ClassifiedLine<'a>, ctx: &RuleContext) -> Option<LineEvent<'a>> {
    if !ctx.in_named_types {
        return None;
    }
    let (level, text) = heading(line.content)?;
    if level != 3 || text.is_empty() {
        return None;
    }
    Some(match paren_suffix(text) {
        Some((name, attributes)) => LineEvent::NamedType {
            name,
            attributes: Some(attributes),
        },
        None => LineEvent::NamedType {
            name: text,
            attributes: None,
        },
    })
}

fn data_structures_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    let (level, text) = heading(line.content)?;
    (level <= 2 && text.eq_ignore_ascii_case("Data Structures")).then_some(LineEvent::DataStructures)
}

fn parameters_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    (bullet(line.content)? == "Parameters").then_some(LineEvent::Parameters)
}

fn parameter_line_rule<'a>(line: &ClassifiedLine<'a>, ctx: &RuleContext) -> Option<LineEvent<'a>> {
    let marker_indent = ctx.parameter_indent?;
    (line.indent > marker_indent).then_some(LineEvent::ParameterLine)
}

fn request_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    let rest = keyword(bullet(line.content)?, "Request")?;
    let (name, content_type) = match paren_suffix(rest) {
        Some((name, content_type)) => (name, Some(content_type)),
        None => (rest, None),
    };
    Some(LineEvent::Request {
        name: Some(name).filter(|n| !n.is_empty()),
        content_type: content_type.filter(|c| !c.is_empty()),
    })
}

fn response_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    let rest = keyword(bullet(line.content)?, "Response")?;
    let (status, content_type) = match paren_suffix(rest) {
        Some((status, content_type)) => (status, Some(content_type)),
        None => (rest, None),
    };
    Some(LineEvent::Response {
        status: Some(status).filter(|s| !s.is_empty()),
        content_type: content_type.filter(|c| !c.is_empty()),
    })
}

fn attributes_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    let rest = keyword(bullet(line.content)?, "Attributes")?;
    Some(LineEvent::Attributes {
        type_decl: paren_suffix(rest).map(|(_, inside)| inside),
    })
}

fn body_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    (bullet(line.content)? == "Body").then_some(LineEvent::Body)
}

fn headers_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    (bullet(line.content)? == "Headers").then_some(LineEvent::Headers)
}

fn schema_rule<'a>(line: &ClassifiedLine<'a>, _ctx: &RuleContext) -> Option<LineEvent<'a>> {
    (bullet(line.content)? == "Schema").then_some(LineEvent::Schema)
}

fn property_rule<'a>(line: &ClassifiedLine<'a>, ctx: &RuleContext) -> Option<LineEvent<'a>> {
    let min_indent = ctx.property_min_indent?;
    (line.indent >= min_indent).then_some(LineEvent::Property)
}
