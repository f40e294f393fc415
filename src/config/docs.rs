//! Documentation generated from schema metadata.

use super::schema::{FieldDoc, FieldKind, Node, Schema};
use serde_json::Value;
use std::fmt::Write;

/// A commented `config.yaml` skeleton in declaration order.
///
/// Each leaf is written with its default (or example when it has none),
/// normalized through its kind so the file reads back to the same typed
/// values. Strings are double-quoted.
pub fn generate_yaml_example(schema: &Schema) -> String {
    let mut out = String::new();
    out.push_str("# Application Configuration\n");
    out.push_str("# Generated from schema metadata\n\n");
    write_nodes(&mut out, schema, schema.nodes(), "", 0);
    out
}

fn write_nodes(out: &mut String, schema: &Schema, nodes: &[Node], prefix: &str, depth: usize) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            Node::Record { key, children } if !key.is_empty() => {
                let _ = writeln!(out, "{}{}:", indent, key);
                write_nodes(out, schema, children, &join(prefix, key), depth + 1);
                if depth == 0 {
                    out.push('\n');
                }
            }
            Node::Leaf(field) if !field.key().is_empty() => {
                if let Some(doc) = schema.field(&join(prefix, field.key())) {
                    write_leaf(out, doc, &indent);
                }
            }
            _ => {}
        }
    }
}

fn write_leaf(out: &mut String, doc: &FieldDoc, indent: &str) {
    if !doc.description.is_empty() {
        let _ = writeln!(out, "{}# {}", indent, doc.description);
    }
    if !doc.validation.is_empty() {
        let _ = writeln!(out, "{}# Validation: {}", indent, doc.validation);
    }
    if !doc.example.is_empty() {
        let _ = writeln!(out, "{}# Example: {}", indent, doc.example);
    }
    if !doc.default.is_empty() {
        let _ = writeln!(out, "{}# Default: {}", indent, doc.default);
    }

    let value = if doc.default.is_empty() {
        &doc.example
    } else {
        &doc.default
    };
    if value.is_empty() {
        let _ = writeln!(out, "{}{}:", indent, doc.key());
    } else {
        let _ = writeln!(out, "{}{}: {}", indent, doc.key(), render(doc.kind, value));
    }
}

/// JSON scalar syntax is valid YAML. An example that does not parse under
/// its kind is written quoted, as-is.
fn render(kind: FieldKind, literal: &str) -> String {
    kind.parse_literal(literal)
        .unwrap_or_else(|_| Value::String(literal.to_string()))
        .to_string()
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Markdown reference table, one row per leaf.
pub fn generate_markdown_docs(schema: &Schema) -> String {
    let mut out = String::new();
    out.push_str("# Configuration Reference\n\n");
    out.push_str("| Field | Type | Default | Example | Description | Validation |\n");
    out.push_str("|-------|------|---------|---------|-------------|------------|\n");
    for doc in schema.fields() {
        let _ = writeln!(
            out,
            "| `{}` | {} | `{}` | `{}` | {} | {} |",
            doc.path,
            doc.kind,
            doc.default,
            doc.example,
            escape_cell(&doc.description),
            escape_cell(&doc.validation),
        );
    }
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Human-readable listing of every field.
pub fn config_help(schema: &Schema) -> String {
    let mut out = String::new();
    out.push_str("Configuration Fields:\n");
    out.push_str(&"=".repeat(80));
    out.push('\n');

    for doc in schema.fields() {
        let _ = writeln!(out, "\n{}", doc.path);
        let _ = writeln!(out, "{}", "-".repeat(doc.path.len()));
        if !doc.description.is_empty() {
            let _ = writeln!(out, "Description: {}", doc.description);
        }
        let _ = writeln!(out, "Type: {}", doc.kind);
        if !doc.default.is_empty() {
            let _ = writeln!(out, "Default: {}", doc.default);
        }
        if !doc.example.is_empty() {
            let _ = writeln!(out, "Example: {}", doc.example);
        }
        if !doc.validation.is_empty() {
            let _ = writeln!(out, "Validation: {}", doc.validation);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::decode::Decoder;
    use crate::config::schema::Field;

    fn schema() -> Schema {
        Schema::builder()
            .section("app", |s| {
                s.field(
                    Field::string("name")
                        .default("demo")
                        .example("my-app")
                        .doc("Application name")
                        .validate("required"),
                )
                .field(Field::string("token").example("abc"))
            })
            .section("server", |s| {
                s.field(Field::uint("port").default("8080"))
                    .section("tls", |s| s.field(Field::bool("enabled")))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_yaml_example_nests_and_quotes() {
        let yaml = generate_yaml_example(&schema());
        let expected = "\
app:
  # Application name
  # Validation: required
  # Example: my-app
  # Default: demo
  name: \"demo\"
  # Example: abc
  token: \"abc\"

server:
  port: 8080
  tls:
    enabled:

";
        assert!(yaml.ends_with(expected), "{yaml}");
    }

    #[test]
    fn test_yaml_example_normalizes_literals() {
        let schema = Schema::builder()
            .field(Field::bool("debug").default("1"))
            .field(Field::bool("quiet").default("F"))
            .field(Field::float("ratio").default("2"))
            .field(Field::int("offset").default(" -3"))
            .build()
            .unwrap();
        let yaml = generate_yaml_example(&schema);
        assert!(yaml.contains("\ndebug: true\n"), "{yaml}");
        assert!(yaml.contains("\nquiet: false\n"), "{yaml}");
        assert!(yaml.contains("\nratio: 2.0\n"), "{yaml}");
        assert!(yaml.contains("\noffset: -3\n"), "{yaml}");

        let tree: Value = serde_yaml::from_str(&yaml).unwrap();
        let tree = tree.as_object().cloned().unwrap();
        let decoder = Decoder::new(&schema, &tree);
        decoder.check().unwrap();
        assert!(decoder.bool("debug").unwrap());
        assert!(!decoder.bool("quiet").unwrap());
        assert_eq!(decoder.float("ratio").unwrap(), 2.0);
        assert_eq!(decoder.int("offset").unwrap(), -3);
    }

    #[test]
    fn test_bad_example_is_quoted() {
        let schema = Schema::builder()
            .field(Field::uint("port").example("auto"))
            .build()
            .unwrap();
        assert!(generate_yaml_example(&schema).ends_with("port: \"auto\"\n"));
    }

    #[test]
    fn test_markdown_rows_in_order() {
        let md = generate_markdown_docs(&schema());
        let rows: Vec<&str> = md.lines().filter(|l| l.starts_with("| `")).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0],
            "| `app.name` | string | `demo` | `my-app` | Application name | required |"
        );
        assert!(rows[3].starts_with("| `server.tls.enabled` | bool |"));
    }

    #[test]
    fn test_help_lists_every_path() {
        let help = config_help(&schema());
        for path in ["app.name", "app.token", "server.port", "server.tls.enabled"] {
            assert!(help.contains(&format!("\n{}\n", path)), "missing {path}");
        }
        assert!(help.contains("Type: uint"));
    }
}
