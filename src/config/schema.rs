//! Explicit schema description for typed configuration.
//!
//! A [`Schema`] is built once through [`SchemaBuilder`] and is immutable
//! afterwards. Building checks every default literal and rule expression, so
//! authoring mistakes surface before any file is read.

use super::validator::{Rule, parse_rules};
use crate::error::{ConfigError, Result};
use heck::ToUpperCamelCase;
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::fmt;

/// Scalar kind of a leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Int,
    Uint,
    Bool,
    Float,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Int => "int",
            FieldKind::Uint => "uint",
            FieldKind::Bool => "bool",
            FieldKind::Float => "float",
        }
    }

    /// Parse a textual literal (a default, or an environment variable) into
    /// a typed tree value.
    pub fn parse_literal(&self, literal: &str) -> std::result::Result<Value, String> {
        match self {
            FieldKind::String => Ok(Value::String(literal.to_string())),
            FieldKind::Int => literal
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| format!("invalid int {:?}: {}", literal, e)),
            FieldKind::Uint => literal
                .trim()
                .parse::<u64>()
                .map(Value::from)
                .map_err(|e| format!("invalid uint {:?}: {}", literal, e)),
            FieldKind::Bool => parse_bool(literal.trim())
                .map(Value::Bool)
                .ok_or_else(|| format!("invalid bool {:?}", literal)),
            FieldKind::Float => {
                let parsed = literal
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid float {:?}: {}", literal, e))?;
                Number::from_f64(parsed)
                    .map(Value::Number)
                    .ok_or_else(|| format!("invalid float {:?}: not a finite number", literal))
            }
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `1`, `t`, `true` (also `T`, `TRUE`, `True`) and `0`, `f`, `false` (also
/// `F`, `FALSE`, `False`).
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Declaration of a single leaf field.
#[derive(Debug, Clone)]
pub struct Field {
    key: String,
    name: Option<String>,
    kind: FieldKind,
    default: Option<String>,
    example: Option<String>,
    description: Option<String>,
    validate: Option<String>,
}

impl Field {
    pub fn new(key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            name: None,
            kind,
            default: None,
            example: None,
            description: None,
            validate: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn string(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::String)
    }

    pub fn int(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Int)
    }

    pub fn uint(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Uint)
    }

    pub fn bool(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Bool)
    }

    pub fn float(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Float)
    }

    /// Display name used in validation messages (defaults to the key in
    /// UpperCamelCase).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    pub fn example(mut self, literal: impl Into<String>) -> Self {
        self.example = Some(literal.into());
        self
    }

    pub fn doc(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(mut self, rules: impl Into<String>) -> Self {
        self.validate = Some(rules.into());
        self
    }
}

/// One node of the declared schema: a leaf or a nested record.
#[derive(Debug, Clone)]
pub enum Node {
    Leaf(Field),
    Record { key: String, children: Vec<Node> },
}

impl Node {
    fn key(&self) -> &str {
        match self {
            Node::Leaf(field) => &field.key,
            Node::Record { key, .. } => key,
        }
    }
}

/// Flattened documentation for one leaf field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDoc {
    /// Dot-joined key, e.g. `app.name`.
    pub path: String,
    /// Display name, e.g. `Name`.
    pub name: String,
    pub kind: FieldKind,
    pub default: String,
    pub example: String,
    pub description: String,
    pub validation: String,
}

impl FieldDoc {
    /// Last path segment.
    pub fn key(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

/// Walk declared nodes and emit one [`FieldDoc`] per leaf, in declaration order.
///
/// Records contribute their key to the path prefix but emit nothing
/// themselves. Nodes with an empty key are not part of the configurable
/// surface and are skipped along with everything beneath them.
pub fn describe(nodes: &[Node]) -> Vec<FieldDoc> {
    let mut docs = Vec::new();
    collect_docs("", nodes, &mut docs);
    docs
}

fn collect_docs(prefix: &str, nodes: &[Node], docs: &mut Vec<FieldDoc>) {
    for node in nodes {
        let key = node.key();
        if key.is_empty() {
            continue;
        }
        let path = join_path(prefix, key);

        match node {
            Node::Record { children, .. } => collect_docs(&path, children, docs),
            Node::Leaf(field) => docs.push(FieldDoc {
                name: field
                    .name
                    .clone()
                    .unwrap_or_else(|| field.key.to_upper_camel_case()),
                kind: field.kind,
                default: field.default.clone().unwrap_or_default(),
                example: field.example.clone().unwrap_or_default(),
                description: field.description.clone().unwrap_or_default(),
                validation: field.validate.clone().unwrap_or_default(),
                path,
            }),
        }
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Builder for a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    nodes: Vec<Node>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a leaf at the current level.
    pub fn field(mut self, field: Field) -> Self {
        self.nodes.push(Node::Leaf(field));
        self
    }

    /// Declare a nested record under `key`.
    pub fn section(
        mut self,
        key: impl Into<String>,
        build: impl FnOnce(SchemaBuilder) -> SchemaBuilder,
    ) -> Self {
        let children = build(SchemaBuilder::new()).nodes;
        self.nodes.push(Node::Record {
            key: key.into(),
            children,
        });
        self
    }

    /// Check every declaration and freeze the schema.
    pub fn build(self) -> Result<Schema> {
        check_keys(&self.nodes)?;

        let mut seen = HashSet::new();
        let mut leaves = Vec::new();
        for doc in describe(&self.nodes) {
            if !seen.insert(doc.path.clone()) {
                return Err(ConfigError::schema(&doc.path, "duplicate field path"));
            }
            if !doc.default.is_empty() {
                doc.kind
                    .parse_literal(&doc.default)
                    .map_err(|e| ConfigError::schema(&doc.path, format!("bad default: {}", e)))?;
            }
            let rules = parse_rules(&doc.validation)
                .map_err(|e| ConfigError::schema(&doc.path, format!("bad rule: {}", e)))?;
            leaves.push(Leaf { doc, rules });
        }

        for leaf in &leaves {
            let path = &leaf.doc.path;
            for (idx, _) in path.match_indices('.') {
                let parent = &path[..idx];
                if seen.contains(parent) {
                    return Err(ConfigError::schema(
                        parent,
                        "declared both as a field and as a section",
                    ));
                }
            }
        }

        Ok(Schema {
            nodes: self.nodes,
            leaves,
        })
    }
}

fn check_keys(nodes: &[Node]) -> Result<()> {
    for node in nodes {
        let key = node.key();
        if key.contains('.') {
            return Err(ConfigError::schema(key, "keys must not contain '.'"));
        }
        if key != key.to_lowercase() {
            return Err(ConfigError::schema(key, "keys must be lower-case"));
        }
        if let Node::Record { children, .. } = node {
            check_keys(children)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct Leaf {
    doc: FieldDoc,
    rules: Vec<Rule>,
}

/// Immutable description of a configuration surface.
#[derive(Debug, Clone)]
pub struct Schema {
    nodes: Vec<Node>,
    leaves: Vec<Leaf>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Declared nodes, for consumers that need the nesting (docs).
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Leaf documentation in declaration order.
    pub fn describe(&self) -> Vec<FieldDoc> {
        self.fields().cloned().collect()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDoc> {
        self.leaves.iter().map(|leaf| &leaf.doc)
    }

    pub fn field(&self, path: &str) -> Option<&FieldDoc> {
        self.fields().find(|doc| doc.path == path)
    }

    /// Leaves paired with their parsed rules.
    pub(crate) fn rules(&self) -> impl Iterator<Item = (&FieldDoc, &[Rule])> {
        self.leaves
            .iter()
            .map(|leaf| (&leaf.doc, leaf.rules.as_slice()))
    }
}
