//! HCL rendering of discovered resources.

use crate::discovery::references::ReferenceMap;
use crate::discovery::resource::DiscoveredResource;
use crate::discovery::schema::{AttributeKind, AttributeSchema, Presence, ResourceSchema};
use crate::discovery::value::{AttributeMap, Value};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const PLACEHOLDER: &str = "<placeholder for missing required attribute>";
const PLACEHOLDER_COMMENT: &str =
    "#Required attribute not found in discovery, placeholder value set to avoid plan failure";
const OPTIONAL_MISSING: &str = "<<Optional value not found in discovery>>";

/// A required attribute that had to be filled with a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingAttribute {
    pub address: String,
    /// Attribute path as written in `ignore_changes`
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct RenderedResource {
    pub text: String,
    pub missing: Vec<MissingAttribute>,
    /// Root variables substituted into the block
    pub variables: BTreeSet<String>,
}

/// Attribute whose value does not fit the schema-driven rendering.
pub trait SpecialAttribute: Send + Sync {
    fn name(&self) -> &'static str;

    /// Right-hand side of the assignment, or `None` to fall back to the
    /// generic rendering.
    fn render(&self, value: &Value) -> Option<String>;
}

/// `delivery_policy` of notification subscriptions is a JSON document in a
/// string attribute. The API hands it back as a nested object with
/// snake_case keys; the provider expects the camelCase JSON text.
pub struct DeliveryPolicy;

impl SpecialAttribute for DeliveryPolicy {
    fn name(&self) -> &'static str {
        "delivery_policy"
    }

    fn render(&self, value: &Value) -> Option<String> {
        match value {
            Value::String(text) => Some(quote(text)),
            Value::Map(_) => Some(quote(&camel_case_json(value).to_string())),
            _ => None,
        }
    }
}

fn camel_case_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Map(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(key, v)| (snake_to_camel(key), camel_case_json(v)))
                .collect(),
        ),
        Value::List(items) => serde_json::Value::Array(items.iter().map(camel_case_json).collect()),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Number(n) => serde_json::Value::Number(n.clone()),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Reference(r) => serde_json::Value::String(r.expression.clone()),
    }
}

fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Quote and escape a string literal, including template sequences.
pub fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

pub struct HclEmitter<'a> {
    references: &'a ReferenceMap,
    special: Vec<Box<dyn SpecialAttribute>>,
}

impl<'a> HclEmitter<'a> {
    pub fn new(references: &'a ReferenceMap) -> Self {
        Self {
            references,
            special: vec![Box::new(DeliveryPolicy)],
        }
    }

    /// Render `resource` with `attributes` (already customized) against its schema.
    pub fn render(
        &self,
        resource: &DiscoveredResource,
        attributes: &AttributeMap,
        schema: &ResourceSchema,
    ) -> RenderedResource {
        let mut body = BodyWriter {
            emitter: self,
            self_id: &resource.id,
            out: String::new(),
            ignore: Vec::new(),
            variables: BTreeSet::new(),
        };
        body.write_body(attributes, schema, 1, "");

        let mut text = format!(
            "resource {} {} {{\n",
            quote(&resource.resource_type),
            quote(&resource.terraform_name)
        );
        text.push_str(&body.out);
        if !body.ignore.is_empty() {
            text.push_str("  lifecycle {\n");
            text.push_str(&format!("    ignore_changes = [{}]\n", body.ignore.join(", ")));
            text.push_str("  }\n");
        }
        text.push_str("}\n");

        let address = resource.address();
        RenderedResource {
            text,
            missing: body
                .ignore
                .into_iter()
                .map(|path| MissingAttribute {
                    address: address.clone(),
                    path,
                })
                .collect(),
            variables: body.variables,
        }
    }

    fn special(&self, name: &str) -> Option<&dyn SpecialAttribute> {
        self.special
            .iter()
            .find(|s| s.name() == name)
            .map(|s| &**s)
    }
}

struct BodyWriter<'e, 'a> {
    emitter: &'e HclEmitter<'a>,
    self_id: &'e str,
    out: String,
    /// Placeholdered attribute paths
    ignore: Vec<String>,
    variables: BTreeSet<String>,
}

impl BodyWriter<'_, '_> {
    fn write_body(
        &mut self,
        attributes: &BTreeMap<String, Value>,
        schema: &ResourceSchema,
        depth: usize,
        prefix: &str,
    ) {
        let emitter = self.emitter;
        let indent = "  ".repeat(depth);
        for (name, attr) in &schema.attributes {
            if !attr.is_emitted() {
                continue;
            }
            let path = format!("{}{}", prefix, name);

            let Some(value) = attributes.get(name) else {
                self.write_missing(name, attr, depth, &path);
                continue;
            };

            if let Some(rendered) = emitter
                .special(name)
                .and_then(|special| special.render(value))
            {
                self.line(&indent, &format!("{} = {}", name, rendered));
                continue;
            }

            match &attr.kind {
                AttributeKind::Block(nested) => {
                    let items = block_items(value);
                    if items.is_empty() {
                        self.write_missing(name, attr, depth, &path);
                    }
                    for (i, item) in items.into_iter().enumerate() {
                        self.line(&indent, &format!("{} {{", name));
                        self.write_body(item, nested, depth + 1, &format!("{}[{}].", path, i));
                        self.line(&indent, "}");
                    }
                }
                _ => match value {
                    Value::Map(entries) => self.write_map(name, entries, depth),
                    _ => {
                        let rendered = self.render_value(value);
                        self.line(&indent, &format!("{} = {}", name, rendered));
                    }
                },
            }
        }
    }

    fn write_missing(&mut self, name: &str, attr: &AttributeSchema, depth: usize, path: &str) {
        let indent = "  ".repeat(depth);
        match (attr.presence, &attr.kind) {
            (Presence::Required, AttributeKind::Block(nested)) => {
                self.line(&indent, &format!("{} {{", name));
                self.write_body(&BTreeMap::new(), nested, depth + 1, &format!("{}[0].", path));
                self.line(&indent, "}");
            }
            (Presence::Required, _) => {
                let placeholder = format!("{} = {} {}", name, quote(PLACEHOLDER), PLACEHOLDER_COMMENT);
                self.line(&indent, &placeholder);
                self.ignore.push(path.to_string());
            }
            _ => {
                self.line(&indent, &format!("#{} = {}", name, OPTIONAL_MISSING));
            }
        }
    }

    fn write_map(&mut self, name: &str, entries: &BTreeMap<String, Value>, depth: usize) {
        let indent = "  ".repeat(depth);
        self.line(&indent, &format!("{} = {{", name));
        for (key, value) in entries {
            let rendered = match value {
                Value::String(s) => quote(s),
                other => self.render_value(other),
            };
            self.line(&indent, &format!("  {} = {}", quote(key), rendered));
        }
        self.line(&indent, "}");
    }

    fn line(&mut self, indent: &str, content: &str) {
        self.out.push_str(indent);
        self.out.push_str(content);
        self.out.push('\n');
    }

    fn render_value(&mut self, value: &Value) -> String {
        let references = self.emitter.references;
        match value {
            Value::String(s) => match references.resolve(s, self.self_id) {
                Some(expression) => self.substitute(expression),
                None => quote(s),
            },
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Reference(r) => self.substitute(&r.expression),
            Value::List(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(|item| self.render_value(item))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Value::Map(entries) => format!(
                "{{ {} }}",
                entries
                    .iter()
                    .map(|(k, v)| format!("{} = {}", quote(k), self.render_value(v)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Emit `expression` unquoted, noting the root variable it reads, if any.
    fn substitute(&mut self, expression: &str) -> String {
        if let Some(name) = variable_name(expression) {
            self.variables.insert(name.to_string());
        }
        expression.to_string()
    }
}

/// `compartment_ocid` for `var.compartment_ocid`.
fn variable_name(expression: &str) -> Option<&str> {
    let rest = expression.strip_prefix("var.")?;
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// Nested block values arrive either as a list of objects or a single object.
fn block_items(value: &Value) -> Vec<&BTreeMap<String, Value>> {
    match value {
        Value::List(items) => items.iter().filter_map(Value::as_map).collect(),
        Value::Map(map) => vec![map],
        _ => Vec::new(),
    }
}
