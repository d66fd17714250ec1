//! MSON attribute micro-parser
//!
//! Parses the property-declaration grammar used by `+ Attributes` blocks,
//! named types and parameter lists:
//!
//! ```text
//! + name: example (type, required) - description
//! ```
//!
//! Nested members are grouped by indentation and recurse into object,
//! array and enum parents.

use super::rules;
use crate::line::{self, ClassifiedLine};
use crate::options::TabPolicy;
use crate::scalar;
use crate::yaml::Value;
use apiconv_common::Schema;
use tracing::debug;

const PRIMITIVES: &[&str] = &["string", "number", "boolean", "object"];

/// Member type sections that group children without declaring a property
const TYPE_SECTIONS: &[&str] = &["Properties", "Items", "Members", "Include"];

/// Declared type of a property or block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TypeKind {
    #[default]
    Unspecified,
    Primitive(String),
    Array(Option<Box<TypeKind>>),
    /// Named type reference
    Reference(String),
}

/// Parsed contents of a `( ... )` attribute list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeAttributes {
    pub kind: TypeKind,
    pub required: bool,
    pub nullable: bool,
    /// Declared as `enum[T]`
    pub enumerated: bool,
    /// Backticked sample value inside the attribute list
    pub example: Option<String>,
}

/// One property declaration line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: String,
    pub example: Option<String>,
    pub attributes: TypeAttributes,
    pub description: Option<String>,
}

/// Parse a bulleted declaration line. `None` for non-bullet lines.
pub fn parse_property_line(content: &str) -> Option<PropertyDecl> {
    let text = rules::bullet(content)?;
    let (name, rest) = split_name(text);
    let mut decl = PropertyDecl {
        name: name.trim().to_string(),
        ..Default::default()
    };

    let mut rest = rest.trim_start();
    if let Some(after) = rest.strip_prefix(':') {
        let (example, tail) = split_example(after.trim_start());
        decl.example = Some(example.to_string()).filter(|e| !e.is_empty());
        rest = tail.trim_start();
    }

    if rest.starts_with('(') {
        if let Some(close) = closing_paren(rest) {
            decl.attributes = parse_type_attributes(&rest[1..close]);
            rest = rest[close + 1..].trim_start();
        }
    }

    if let Some(description) = rest.strip_prefix('-') {
        let description = description.trim();
        if !description.is_empty() {
            decl.description = Some(description.to_string());
        }
    }

    Some(decl)
}

/// Classify each comma-separated token of an attribute list
pub fn parse_type_attributes(text: &str) -> TypeAttributes {
    let mut attrs = TypeAttributes::default();

    for token in split_top_level(text) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some(example) = token.strip_prefix('`').and_then(|t| t.strip_suffix('`')) {
            attrs.example = Some(example.to_string());
            continue;
        }
        match token.to_ascii_lowercase().as_str() {
            "required" => attrs.required = true,
            "optional" => attrs.required = false,
            "nullable" => attrs.nullable = true,
            "fixed" | "fixed-type" | "sample" | "default" => {}
            _ => {
                if let Some(inner) = generic_argument(token, "enum") {
                    attrs.enumerated = true;
                    attrs.kind = match type_kind(inner) {
                        TypeKind::Unspecified => TypeKind::Primitive("string".to_string()),
                        kind => kind,
                    };
                } else {
                    attrs.kind = type_kind(token);
                }
            }
        }
    }

    attrs
}

fn type_kind(token: &str) -> TypeKind {
    let token = token.trim();
    if token.is_empty() {
        return TypeKind::Unspecified;
    }
    if let Some(inner) = generic_argument(token, "array") {
        let first = inner.split(',').next().unwrap_or_default().trim();
        return TypeKind::Array((!first.is_empty()).then(|| Box::new(type_kind(first))));
    }

    let lower = token.to_ascii_lowercase();
    if lower == "array" {
        TypeKind::Array(None)
    } else if PRIMITIVES.contains(&lower.as_str()) {
        TypeKind::Primitive(lower)
    } else {
        TypeKind::Reference(token.to_string())
    }
}

/// Schema for a single declaration, before any nested members are applied
pub fn property_schema(decl: &PropertyDecl) -> Schema {
    let attrs = &decl.attributes;
    let mut schema = kind_schema(&attrs.kind);

    if attrs.nullable {
        if let Some(spec) = schema.schema_type.take() {
            schema.schema_type = Some(spec.with_null());
        }
    }
    schema.description = decl.description.clone();
    schema.example = decl
        .example
        .as_deref()
        .or(attrs.example.as_deref())
        .map(|raw| typed_example(raw, &schema));
    schema
}

fn kind_schema(kind: &TypeKind) -> Schema {
    match kind {
        TypeKind::Unspecified => Schema::of_type("string"),
        TypeKind::Primitive(name) => Schema::of_type(name.as_str()),
        TypeKind::Array(None) => Schema::of_type("array"),
        TypeKind::Array(Some(inner)) => Schema::array_of(kind_schema(inner)),
        TypeKind::Reference(name) => Schema::reference(name),
    }
}

/// Interpret a sample value according to the schema's declared type
pub fn typed_example(raw: &str, schema: &Schema) -> serde_json::Value {
    match schema.type_name() {
        Some("number") | Some("integer") => {
            let token = raw.trim();
            match token.parse::<f64>() {
                Ok(n) if scalar::is_decimal_number(token) => Value::Number(n).to_json(),
                _ => serde_json::Value::String(raw.to_string()),
            }
        }
        Some("boolean") => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => serde_json::Value::Bool(true),
            "false" => serde_json::Value::Bool(false),
            _ => serde_json::Value::String(raw.to_string()),
        },
        Some("array") => {
            let item = schema.items.as_deref().cloned().unwrap_or_default();
            serde_json::Value::Array(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| typed_example(s, &item))
                    .collect(),
            )
        }
        _ => serde_json::Value::String(raw.to_string()),
    }
}

/// Build the schema of an attribute block (or named type) from its lines
pub fn block_schema(base: &TypeAttributes, lines: &[ClassifiedLine<'_>]) -> Schema {
    let kind = match &base.kind {
        TypeKind::Unspecified => TypeKind::Primitive("object".to_string()),
        kind => kind.clone(),
    };
    let mut schema = kind_schema(&kind);
    if base.nullable {
        if let Some(spec) = schema.schema_type.take() {
            schema.schema_type = Some(spec.with_null());
        }
    }

    let mut nested = Schema::default();
    let mut pos = 0;
    while pos < lines.len() {
        parse_level(lines, &mut pos, base, &mut nested);
    }
    absorb(&mut schema, &kind, nested);
    schema
}

/// Parse a standalone MSON attribute block
pub fn parse_attributes(text: &str) -> Schema {
    let lines: Vec<ClassifiedLine<'_>> = line::split_lines(text)
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| line::classify(raw, i + 1, TabPolicy::Literal).ok())
        .filter(|l| !l.is_blank())
        .collect();
    block_schema(&TypeAttributes::default(), &lines)
}

/// Consume one indentation level of members into `collected`
fn parse_level(
    lines: &[ClassifiedLine<'_>],
    pos: &mut usize,
    owner: &TypeAttributes,
    collected: &mut Schema,
) {
    let Some(first) = lines.get(*pos) else {
        return;
    };
    let level = first.indent;

    while let Some(line) = lines.get(*pos) {
        if line.indent < level {
            break;
        }
        *pos += 1;

        let decl = match parse_property_line(line.content) {
            Some(decl) if line.indent == level => decl,
            _ => {
                append_description(collected, line.content);
                continue;
            }
        };
        let has_children = lines.get(*pos).is_some_and(|next| next.indent > level);

        if is_type_section(&decl) {
            if has_children {
                parse_level(lines, pos, owner, collected);
            }
            continue;
        }

        if owner.enumerated {
            let member = kind_schema(&owner.kind);
            let value = decl.example.as_deref().unwrap_or(&decl.name);
            collected.enum_values.push(typed_example(value, &member));
            skip_deeper(lines, pos, level);
            continue;
        }

        let mut schema = property_schema(&decl);
        if has_children {
            let mut nested = Schema::default();
            parse_level(lines, pos, &decl.attributes, &mut nested);
            absorb(&mut schema, &decl.attributes.kind, nested);
        }

        if matches!(owner.kind, TypeKind::Array(_)) || decl.name.is_empty() {
            if decl.name.is_empty() || decl.attributes.kind != TypeKind::Unspecified {
                if collected.items.is_none() {
                    collected.items = Some(Box::new(schema));
                }
            } else {
                debug!(line = line.number, member = %decl.name, "skipping array sample member");
            }
            continue;
        }

        collected.insert_property(decl.name, schema, decl.attributes.required);
    }
}

/// Apply members collected from nested lines to a declared schema
fn absorb(schema: &mut Schema, kind: &TypeKind, nested: Schema) {
    let Schema {
        description,
        properties,
        required,
        items,
        enum_values,
        ..
    } = nested;

    if let Some(text) = description {
        append_description(schema, &text);
    }
    schema.enum_values.extend(enum_values);
    if let Some(items) = items {
        if schema.type_name() == Some("array") && schema.items.is_none() {
            schema.items = Some(items);
        }
    }
    if properties.is_empty() {
        return;
    }

    match kind {
        TypeKind::Unspecified => {
            schema.schema_type = Some("object".into());
            schema.example = None;
            schema.properties.extend(properties);
            schema.required.extend(required);
        }
        TypeKind::Primitive(name) if name == "object" => {
            schema.properties.extend(properties);
            schema.required.extend(required);
        }
        TypeKind::Reference(name) => {
            let own = Schema {
                properties,
                required,
                ..Schema::of_type("object")
            };
            *schema = Schema {
                all_of: vec![Schema::reference(name), own],
                description: schema.description.take(),
                example: schema.example.take(),
                ..Default::default()
            };
        }
        _ => debug!(
            count = properties.len(),
            "dropping members nested under a non-object type"
        ),
    }
}

fn is_type_section(decl: &PropertyDecl) -> bool {
    decl.example.is_none()
        && decl.description.is_none()
        && decl.attributes == TypeAttributes::default()
        && TYPE_SECTIONS.contains(&decl.name.as_str())
}

fn skip_deeper(lines: &[ClassifiedLine<'_>], pos: &mut usize, level: usize) {
    while lines.get(*pos).is_some_and(|l| l.indent > level) {
        *pos += 1;
    }
}

fn append_description(schema: &mut Schema, text: &str) {
    match &mut schema.description {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => schema.description = Some(text.to_string()),
    }
}

fn split_name(text: &str) -> (&str, &str) {
    if let Some(inner) = text.strip_prefix('`') {
        if let Some(end) = inner.find('`') {
            return (&inner[..end], &inner[end + 1..]);
        }
    }
    let end = [text.find(':'), text.find('('), text.find(" -")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(text.len());
    (&text[..end], &text[end..])
}

fn split_example(text: &str) -> (&str, &str) {
    if let Some(inner) = text.strip_prefix('`') {
        if let Some(end) = inner.find('`') {
            return (&inner[..end], &inner[end + 1..]);
        }
    }
    if text.starts_with('(') {
        return ("", text);
    }
    let end = [text.find(" ("), text.find(" - ")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(text.len());
    (text[..end].trim(), &text[end..])
}

fn closing_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas outside brackets and backticks
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_tick = false;
    let mut start = 0;

    for (i, ch) in text.char_indices() {
        match ch {
            '`' => in_tick = !in_tick,
            '[' if !in_tick => depth += 1,
            ']' if !in_tick => depth = depth.saturating_sub(1),
            ',' if !in_tick && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn generic_argument<'a>(token: &'a str, head: &str) -> Option<&'a str> {
    let open = token.find('[')?;
    if !token[..open].trim().eq_ignore_ascii_case(head) {
        return None;
    }
    token[open + 1..].strip_suffix(']')
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiconv_common::TypeSpec;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_full_property_line() {
        let decl =
            parse_property_line("+ id: 42 (number, required) - The unique identifier").unwrap();
        assert_eq!(decl.name, "id");
        assert_eq!(decl.example.as_deref(), Some("42"));
        assert_eq!(
            decl.attributes.kind,
            TypeKind::Primitive("number".to_string())
        );
        assert!(decl.attributes.required);
        assert_eq!(decl.description.as_deref(), Some("The unique identifier"));

        let schema = property_schema(&decl);
        assert_eq!(schema.type_name(), Some("number"));
        assert_eq!(schema.example, Some(json!(42)));
    }

    #[test]
    fn test_backticked_name_and_example() {
        let decl = parse_property_line("- `created-at`: `2020-01-01 (UTC)` (string)").unwrap();
        assert_eq!(decl.name, "created-at");
        assert_eq!(decl.example.as_deref(), Some("2020-01-01 (UTC)"));
        assert_eq!(
            decl.attributes.kind,
            TypeKind::Primitive("string".to_string())
        );
    }

    #[test]
    fn test_bare_name() {
        let decl = parse_property_line("+ nickname").unwrap();
        assert_eq!(decl.name, "nickname");
        assert_eq!(decl.attributes, TypeAttributes::default());
        assert_eq!(property_schema(&decl).type_name(), Some("string"));
        assert!(parse_property_line("nickname").is_none());
    }

    #[test]
    fn test_type_attribute_tokens() {
        let attrs = parse_type_attributes("array[User], optional");
        assert_eq!(
            attrs.kind,
            TypeKind::Array(Some(Box::new(TypeKind::Reference("User".to_string()))))
        );
        assert!(!attrs.required);

        let attrs = parse_type_attributes("string, nullable, fixed");
        assert!(attrs.nullable);

        let attrs = parse_type_attributes("Address");
        assert_eq!(attrs.kind, TypeKind::Reference("Address".to_string()));

        let attrs = parse_type_attributes("enum[number], `3`");
        assert!(attrs.enumerated);
        assert_eq!(attrs.kind, TypeKind::Primitive("number".to_string()));
        assert_eq!(attrs.example.as_deref(), Some("3"));
    }

    #[test]
    fn test_reference_and_nullable_schemas() {
        let decl = parse_property_line("+ owner (User)").unwrap();
        let schema = property_schema(&decl);
        assert_eq!(schema.referenced_name(), Some("User"));
        assert_eq!(schema.schema_type, None);

        let decl = parse_property_line("+ nickname (string, nullable)").unwrap();
        assert_eq!(
            property_schema(&decl).schema_type,
            Some(TypeSpec::Union(vec!["string".into(), "null".into()]))
        );
    }

    #[test]
    fn test_nested_object_members() {
        let schema = parse_attributes("+ parent (object)\n    + child (string)\n");
        let parent = &schema.properties["parent"];
        assert_eq!(parent.type_name(), Some("object"));
        assert_eq!(parent.properties["child"].type_name(), Some("string"));
    }

    #[test]
    fn test_untyped_parent_with_children_becomes_object() {
        let schema = parse_attributes(
            "+ address\n    + street: Main St (required)\n    + city\n+ name (string, required)\n",
        );
        let address = &schema.properties["address"];
        assert_eq!(address.type_name(), Some("object"));
        assert_eq!(address.required, vec!["street".to_string()]);
        assert_eq!(address.properties["street"].example, Some(json!("Main St")));
        assert_eq!(schema.required, vec!["name".to_string()]);
    }

    #[test]
    fn test_description_continuation() {
        let schema = parse_attributes("+ bio (string) - Short bio\n    Shown on the profile\n");
        assert_eq!(
            schema.properties["bio"].description.as_deref(),
            Some("Short bio\nShown on the profile")
        );
    }

    #[test]
    fn test_array_items_and_enum_members() {
        let schema = parse_attributes(
            "+ tags (array)\n    + (string)\n+ state (enum[string])\n    + `open`\n    + `closed`\n",
        );
        let tags = &schema.properties["tags"];
        assert_eq!(tags.items.as_ref().unwrap().type_name(), Some("string"));

        let state = &schema.properties["state"];
        assert_eq!(state.type_name(), Some("string"));
        assert_eq!(state.enum_values, vec![json!("open"), json!("closed")]);
    }

    #[test]
    fn test_named_base_with_own_members_uses_all_of() {
        let base = parse_type_attributes("User");
        let lines = vec![line::classify("+ role (string)", 1, TabPolicy::Literal).unwrap()];
        let schema = block_schema(&base, &lines);
        assert_eq!(schema.all_of.len(), 2);
        assert_eq!(schema.all_of[0].referenced_name(), Some("User"));
        assert!(schema.all_of[1].properties.contains_key("role"));
        assert!(schema.properties.is_empty());
    }

    #[test]
    fn test_typed_examples() {
        let flags = Schema::array_of(Schema::of_type("boolean"));
        assert_eq!(typed_example("true, false", &flags), json!([true, false]));
        assert_eq!(
            typed_example("1.5", &Schema::of_type("number")),
            json!(1.5)
        );
        assert_eq!(
            typed_example("abc", &Schema::of_type("number")),
            json!("abc")
        );
        assert_eq!(typed_example("NaN", &Schema::of_type("number")), json!("NaN"));
        assert_eq!(typed_example("inf", &Schema::of_type("integer")), json!("inf"));
    }
}
