//! Incremental document builder driven by line events
//!
//! Holds the decoder's open foci (resource, action, request, response,
//! attribute block, parameter list, body capture). Every structural
//! transition finalizes the innermost open focus into its parent before a
//! new one is opened, and [`DocumentBuilder::finish`] flushes whatever is
//! still open at end of input.

use super::mson::{self, TypeAttributes};
use super::rules::{self, LineEvent, RuleContext};
use crate::line::ClassifiedLine;
use apiconv_common::{
    Document, Header, HttpMethod, MediaType, Operation, Parameter, ParameterLocation, PathItem,
    RequestBody, Response, Schema, Server, Tag,
};
use std::collections::BTreeMap;
use tracing::{debug, trace};

const DEFAULT_CONTENT_TYPE: &str = "application/json";
const DEFAULT_STATUS: &str = "200";
const FORMAT_EXTENSION: &str = "x-blueprint-format";

struct ResourceFocus {
    name: String,
    template: String,
}

struct ActionFocus {
    template: String,
    method: HttpMethod,
    operation: Operation,
}

struct RequestFocus {
    content_type: String,
    description: Option<String>,
    media: MediaType,
}

struct ResponseFocus {
    status: String,
    content_type: Option<String>,
    description: Option<String>,
    headers: BTreeMap<String, Header>,
    media: MediaType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureKind {
    Body,
    Headers,
    Schema,
}

struct Capture<'a> {
    kind: CaptureKind,
    lines: Vec<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SchemaTarget {
    Named(String),
    Request,
    Response,
    Discard,
}

struct SchemaFocus<'a> {
    target: SchemaTarget,
    base: TypeAttributes,
    min_indent: usize,
    lines: Vec<ClassifiedLine<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParameterTarget {
    Operation,
    PathItem,
}

struct ParameterSection {
    indent: usize,
    target: ParameterTarget,
    /// Indent of the first parameter line; deeper lines are details
    item_indent: Option<usize>,
    in_members: bool,
}

/// Blueprint decoding state for a single document
pub(crate) struct DocumentBuilder<'a> {
    document: Document,
    group: Option<String>,
    resource: Option<ResourceFocus>,
    action: Option<ActionFocus>,
    request: Option<RequestFocus>,
    response: Option<ResponseFocus>,
    named_types: bool,
    parameters: Option<ParameterSection>,
    schema_focus: Option<SchemaFocus<'a>>,
    capture: Option<Capture<'a>>,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new() -> Self {
        Self {
            document: Document::default(),
            group: None,
            resource: None,
            action: None,
            request: None,
            response: None,
            named_types: false,
            parameters: None,
            schema_focus: None,
            capture: None,
        }
    }

    fn context(&self) -> RuleContext {
        RuleContext {
            has_title: !self.document.info.title.is_empty(),
            in_named_types: self.named_types,
            parameter_indent: self.parameters.as_ref().map(|p| p.indent),
            property_min_indent: self.schema_focus.as_ref().map(|f| f.min_indent),
            capturing: self.capture.is_some(),
        }
    }

    /// Process one line
    pub fn feed(&mut self, line: ClassifiedLine<'a>) {
        if line.is_blank() {
            // A blank line ends a body that has started, but not one still
            // waiting for its first line.
            if self.capture.as_ref().is_some_and(|c| !c.lines.is_empty()) {
                self.flush_capture();
            }
            return;
        }
        if is_html_comment(line.content) {
            return;
        }

        let event = rules::classify_line(&line, &self.context());
        trace!(line = line.number, ?event, "blueprint line");

        match event {
            LineEvent::BodyLine => {}
            LineEvent::Attributes { .. } => self.capture = None,
            _ => self.flush_capture(),
        }
        if event != LineEvent::Property {
            self.finalize_schema_focus();
        }
        if event != LineEvent::ParameterLine {
            self.parameters = None;
        }

        match event {
            LineEvent::Format(version) => {
                self.document
                    .extensions
                    .insert(FORMAT_EXTENSION.to_string(), version.into());
            }
            LineEvent::Title(title) => self.document.info.title = title.to_string(),
            LineEvent::Host(url) => self.document.servers.push(Server {
                url: url.to_string(),
                description: None,
            }),
            LineEvent::Group(name) => self.open_group(name),
            LineEvent::DataStructures => {
                self.finalize_action();
                self.resource = None;
                self.named_types = true;
            }
            LineEvent::Resource { name, template } => self.open_resource(name, template),
            LineEvent::Action {
                name,
                method,
                template,
            } => self.open_action(name, method, template),
            LineEvent::NamedType { name, attributes } => {
                self.schema_focus = Some(SchemaFocus {
                    target: SchemaTarget::Named(name.to_string()),
                    base: attributes.map(mson::parse_type_attributes).unwrap_or_default(),
                    min_indent: 0,
                    lines: Vec::new(),
                });
            }
            LineEvent::Parameters => {
                let target = if self.action.is_some() {
                    ParameterTarget::Operation
                } else {
                    ParameterTarget::PathItem
                };
                self.parameters = Some(ParameterSection {
                    indent: line.indent,
                    target,
                    item_indent: None,
                    in_members: false,
                });
            }
            LineEvent::ParameterLine => self.parameter_line(&line),
            LineEvent::Request { name, content_type } => self.open_request(name, content_type),
            LineEvent::Response {
                status,
                content_type,
            } => self.open_response(status, content_type),
            LineEvent::Attributes { type_decl } => self.open_attributes(&line, type_decl),
            LineEvent::Body => self.arm_capture(CaptureKind::Body),
            LineEvent::Headers => self.arm_capture(CaptureKind::Headers),
            LineEvent::Schema => self.arm_capture(CaptureKind::Schema),
            LineEvent::Property => {
                if let Some(focus) = self.schema_focus.as_mut() {
                    focus.lines.push(line);
                }
            }
            LineEvent::BodyLine => {
                if let Some(capture) = self.capture.as_mut() {
                    capture.lines.push(line.verbatim());
                }
            }
            LineEvent::Text => self.text(line.content),
        }
    }

    /// Flush every open focus and return the document
    pub fn finish(mut self) -> Document {
        self.flush_capture();
        self.finalize_schema_focus();
        self.finalize_action();
        self.document
    }

    fn open_group(&mut self, name: &str) {
        self.finalize_action();
        self.resource = None;
        self.named_types = false;
        if !self.document.tags.iter().any(|t| t.name == name) {
            self.document.tags.push(Tag {
                name: name.to_string(),
                description: None,
            });
        }
        self.group = Some(name.to_string());
    }

    fn open_resource(&mut self, name: &str, template: &str) {
        self.finalize_action();
        self.named_types = false;

        let item = self.document.paths.entry(path_key(template)).or_default();
        if !name.is_empty() {
            item.summary = Some(name.to_string());
        }
        self.resource = Some(ResourceFocus {
            name: name.to_string(),
            template: template.to_string(),
        });
    }

    fn open_action(&mut self, name: &str, method: HttpMethod, template: Option<&str>) {
        self.finalize_action();
        self.named_types = false;

        let template = template
            .map(str::to_string)
            .or_else(|| self.resource.as_ref().map(|r| r.template.clone()))
            .unwrap_or_else(|| "/".to_string());
        let operation = Operation {
            summary: Some(name.to_string()).filter(|n| !n.is_empty()),
            tags: self.group.iter().cloned().collect(),
            ..Default::default()
        };
        self.action = Some(ActionFocus {
            template,
            method,
            operation,
        });
    }

    fn open_request(&mut self, name: Option<&str>, content_type: Option<&str>) {
        if self.action.is_none() {
            debug!("ignoring request outside of an action");
            return;
        }
        self.finalize_response();
        self.finalize_request();
        self.request = Some(RequestFocus {
            content_type: content_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_string(),
            description: name.map(str::to_string),
            media: MediaType::default(),
        });
        self.arm_capture(CaptureKind::Body);
    }

    fn open_response(&mut self, status: Option<&str>, content_type: Option<&str>) {
        if self.action.is_none() {
            debug!("ignoring response outside of an action");
            return;
        }
        self.finalize_response();
        self.finalize_request();
        self.response = Some(ResponseFocus {
            status: status.unwrap_or(DEFAULT_STATUS).to_string(),
            content_type: content_type.map(str::to_string),
            description: None,
            headers: BTreeMap::new(),
            media: MediaType::default(),
        });
        self.arm_capture(CaptureKind::Body);
    }

    fn open_attributes(&mut self, line: &ClassifiedLine<'a>, type_decl: Option<&str>) {
        let target = if self.response.is_some() {
            SchemaTarget::Response
        } else if self.request.is_some() {
            SchemaTarget::Request
        } else if self.action.is_some() {
            self.request = Some(RequestFocus {
                content_type: DEFAULT_CONTENT_TYPE.to_string(),
                description: None,
                media: MediaType::default(),
            });
            SchemaTarget::Request
        } else if let Some(resource) = self.resource.as_ref().filter(|r| !r.name.is_empty()) {
            SchemaTarget::Named(resource.name.clone())
        } else {
            debug!(line = line.number, "attributes without an owner");
            SchemaTarget::Discard
        };

        self.schema_focus = Some(SchemaFocus {
            target,
            base: type_decl.map(mson::parse_type_attributes).unwrap_or_default(),
            min_indent: line.indent + 1,
            lines: Vec::new(),
        });
    }

    fn arm_capture(&mut self, kind: CaptureKind) {
        if self.request.is_none() && self.response.is_none() {
            debug!(?kind, "ignoring payload section outside of a request or response");
            return;
        }
        self.capture = Some(Capture {
            kind,
            lines: Vec::new(),
        });
    }

    fn text(&mut self, text: &str) {
        let slot = if let Some(response) = self.response.as_mut() {
            &mut response.description
        } else if let Some(request) = self.request.as_mut() {
            &mut request.description
        } else if let Some(action) = self.action.as_mut() {
            &mut action.operation.description
        } else if let Some(resource) = self.resource.as_ref() {
            let key = path_key(&resource.template);
            &mut self.document.paths.entry(key).or_default().description
        } else if self.named_types {
            debug!("dropping text inside data structures");
            return;
        } else if let Some(tag) = self
            .group
            .as_ref()
            .and_then(|group| self.document.tags.iter_mut().find(|t| &t.name == group))
        {
            &mut tag.description
        } else {
            &mut self.document.info.description
        };
        append_text(slot, text);
    }

    fn parameter_line(&mut self, line: &ClassifiedLine<'a>) {
        let Some(section) = self.parameters.as_mut() else {
            return;
        };
        let item_indent = *section.item_indent.get_or_insert(line.indent);
        let target = section.target;

        let decl = match mson::parse_property_line(line.content) {
            Some(decl) if line.indent == item_indent && !decl.name.is_empty() => decl,
            _ => {
                self.parameter_detail(line);
                return;
            }
        };
        section.in_members = false;

        let mut schema = mson::property_schema(&decl);
        let location = infer_location(&decl.name, self.current_template());
        let parameter = Parameter {
            name: decl.name,
            location,
            description: schema.description.take(),
            required: location == ParameterLocation::Path || decl.attributes.required,
            example: schema.example.take(),
            schema: Some(schema),
        };
        trace!(name = %parameter.name, %location, "parameter");

        if let Some(list) = self.parameter_list(target) {
            list.push(parameter);
        }
    }

    /// Default value, enum members or description under the last parameter
    fn parameter_detail(&mut self, line: &ClassifiedLine<'a>) {
        let Some(section) = self.parameters.as_mut() else {
            return;
        };
        let target = section.target;
        let bullet = rules::bullet(line.content);
        if bullet == Some("Members") {
            section.in_members = true;
            return;
        }
        let in_members = section.in_members;

        let Some(parameter) = self.parameter_list(target).and_then(|list| list.last_mut()) else {
            debug!(line = line.number, "parameter detail without a parameter");
            return;
        };
        let schema = parameter.schema.get_or_insert_with(|| Schema::of_type("string"));

        match bullet {
            Some(text) if in_members => {
                let value = strip_ticks(text.split(" - ").next().unwrap_or(text));
                let member = mson::typed_example(value, schema);
                schema.enum_values.push(member);
            }
            Some(text) => match text.split_once(':') {
                Some((key, value)) if key.trim().eq_ignore_ascii_case("Default") => {
                    let value = mson::typed_example(strip_ticks(value.trim()), schema);
                    schema.extensions.insert("default".to_string(), value);
                }
                _ => debug!(line = line.number, "unrecognized parameter detail"),
            },
            None => append_text(&mut parameter.description, line.content),
        }
    }

    fn parameter_list(&mut self, target: ParameterTarget) -> Option<&mut Vec<Parameter>> {
        match target {
            ParameterTarget::Operation => self.action.as_mut().map(|a| &mut a.operation.parameters),
            ParameterTarget::PathItem => {
                let key = path_key(&self.resource.as_ref()?.template);
                Some(&mut self.document.paths.entry(key).or_default().parameters)
            }
        }
    }

    fn current_template(&self) -> &str {
        if let Some(action) = &self.action {
            &action.template
        } else if let Some(resource) = &self.resource {
            &resource.template
        } else {
            ""
        }
    }

    fn flush_capture(&mut self) {
        let Some(capture) = self.capture.take() else {
            return;
        };
        if capture.lines.is_empty() {
            return;
        }

        match capture.kind {
            CaptureKind::Body => {
                let text = capture.lines.join("\n");
                match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(example) => {
                        if let Some(media) = self.payload_media() {
                            media.example = Some(example);
                        }
                    }
                    Err(e) => debug!(error = %e, "discarding non-JSON body"),
                }
            }
            CaptureKind::Schema => {
                let text = capture.lines.join("\n");
                match serde_json::from_str::<Schema>(&text) {
                    Ok(schema) => {
                        if let Some(media) = self.payload_media() {
                            media.schema = Some(schema);
                        }
                    }
                    Err(e) => debug!(error = %e, "discarding unreadable schema"),
                }
            }
            CaptureKind::Headers => {
                for header in capture.lines {
                    match header.split_once(':') {
                        Some((name, value)) => self.header(name.trim(), value.trim()),
                        None => debug!(header, "skipping malformed header line"),
                    }
                }
            }
        }
    }

    fn header(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case("Content-Type") {
            if let Some(response) = self.response.as_mut() {
                response.content_type = Some(value.to_string());
            } else if let Some(request) = self.request.as_mut() {
                request.content_type = value.to_string();
            }
            return;
        }

        let example = Some(serde_json::Value::String(value.to_string()));
        if let Some(response) = self.response.as_mut() {
            response.headers.insert(
                name.to_string(),
                Header {
                    description: None,
                    schema: Some(Schema::of_type("string")),
                    example,
                },
            );
        } else if let Some(action) = self.action.as_mut() {
            action.operation.parameters.push(Parameter {
                name: name.to_string(),
                location: ParameterLocation::Header,
                description: None,
                required: false,
                schema: Some(Schema::of_type("string")),
                example,
            });
        }
    }

    fn payload_media(&mut self) -> Option<&mut MediaType> {
        if let Some(response) = self.response.as_mut() {
            Some(&mut response.media)
        } else {
            self.request.as_mut().map(|r| &mut r.media)
        }
    }

    fn finalize_schema_focus(&mut self) {
        let Some(focus) = self.schema_focus.take() else {
            return;
        };
        let schema = mson::block_schema(&focus.base, &focus.lines);

        match focus.target {
            SchemaTarget::Named(name) => {
                debug!(%name, "named type");
                self.document.schemas_mut().insert(name, schema);
            }
            SchemaTarget::Request => {
                if let Some(request) = self.request.as_mut() {
                    request.media.schema = Some(schema);
                }
            }
            SchemaTarget::Response => {
                if let Some(response) = self.response.as_mut() {
                    response.media.schema = Some(schema);
                }
            }
            SchemaTarget::Discard => {}
        }
    }

    fn finalize_request(&mut self) {
        let Some(request) = self.request.take() else {
            return;
        };
        let Some(action) = self.action.as_mut() else {
            return;
        };

        let body = action
            .operation
            .request_body
            .get_or_insert_with(RequestBody::default);
        body.required = true;
        if request.description.is_some() {
            body.description = request.description;
        }
        body.content
            .entry(request.content_type)
            .or_default()
            .merge(request.media);
    }

    fn finalize_response(&mut self) {
        let Some(focus) = self.response.take() else {
            return;
        };
        let Some(action) = self.action.as_mut() else {
            return;
        };

        let has_payload = focus.media.schema.is_some() || focus.media.example.is_some();
        let response = action
            .operation
            .responses
            .entry(focus.status.clone())
            .or_insert_with(|| Response {
                description: reason_phrase(&focus.status).to_string(),
                ..Default::default()
            });
        if let Some(description) = focus.description {
            response.description = description;
        }
        response.headers.extend(focus.headers);
        if has_payload || focus.content_type.is_some() {
            let content_type = focus
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
            response
                .content
                .entry(content_type)
                .or_default()
                .merge(focus.media);
        }
    }

    fn finalize_action(&mut self) {
        self.finalize_response();
        self.finalize_request();
        self.parameters = None;

        let Some(action) = self.action.take() else {
            return;
        };
        let item: &mut PathItem = self
            .document
            .paths
            .entry(path_key(&action.template))
            .or_default();
        let slot = item.slot_mut(action.method);
        if slot.is_some() {
            debug!(method = %action.method, path = %action.template, "replacing duplicate operation");
        }
        *slot = Some(action.operation);
    }
}

/// Path key for a URI template: query expansions (`{?a,b}`, `{&c}`) removed
pub fn path_key(template: &str) -> String {
    let mut key = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        key.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = tail.find('}').map_or(tail.len(), |e| e + 1);
        let expression = &tail[..end];
        if !(expression.starts_with("{?") || expression.starts_with("{&")) {
            key.push_str(expression);
        }
        rest = &tail[end..];
    }
    key.push_str(rest);

    if key.is_empty() {
        "/".to_string()
    } else {
        key
    }
}

/// `path` when `{name}` occurs literally in the template, `query` otherwise
pub fn infer_location(name: &str, template: &str) -> ParameterLocation {
    if template.contains(&format!("{{{}}}", name)) {
        ParameterLocation::Path
    } else {
        ParameterLocation::Query
    }
}

fn reason_phrase(status: &str) -> &'static str {
    match status {
        "200" => "OK",
        "201" => "Created",
        "202" => "Accepted",
        "204" => "No Content",
        "301" => "Moved Permanently",
        "302" => "Found",
        "304" => "Not Modified",
        "400" => "Bad Request",
        "401" => "Unauthorized",
        "403" => "Forbidden",
        "404" => "Not Found",
        "405" => "Method Not Allowed",
        "409" => "Conflict",
        "415" => "Unsupported Media Type",
        "422" => "Unprocessable Entity",
        "429" => "Too Many Requests",
        "500" => "Internal Server Error",
        "502" => "Bad Gateway",
        "503" => "Service Unavailable",
        _ => "Response",
    }
}

fn is_html_comment(content: &str) -> bool {
    content.starts_with("<!--") && content.ends_with("-->")
}

fn strip_ticks(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('`')
        .and_then(|t| t.strip_suffix('`'))
        .unwrap_or(text)
}

fn append_text(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *slot = Some(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_key_strips_query_expansions() {
        assert_eq!(path_key("/users/{id}"), "/users/{id}");
        assert_eq!(path_key("/users{?limit,offset}"), "/users");
        assert_eq!(path_key("/search{?q}{&page}"), "/search");
        assert_eq!(path_key(""), "/");
    }

    #[test]
    fn test_infer_location() {
        assert_eq!(infer_location("id", "/users/{id}"), ParameterLocation::Path);
        assert_eq!(infer_location("limit", "/users{?limit}"), ParameterLocation::Query);
        assert_eq!(infer_location("i", "/users/{id}"), ParameterLocation::Query);
    }

    #[test]
    fn test_reason_phrase() {
        assert_eq!(reason_phrase("404"), "Not Found");
        assert_eq!(reason_phrase("299"), "Response");
    }

    #[test]
    fn test_html_comment() {
        assert!(is_html_comment("<!-- hidden -->"));
        assert!(!is_html_comment("<b>bold</b>"));
    }
}
