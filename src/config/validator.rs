//! Per-field rule validation.
//!
//! Rule expressions are conjunctive and separated by commas or whitespace:
//! `required`, `min=N`, `max=N`, `oneof=<space separated literals>`, `semver`.
//! A `oneof` list consumes the rest of its comma-delimited chunk, so
//! `required,oneof=debug info warn` reads as two rules.
//!
//! Every rule on every field is evaluated; the result is the complete list of
//! violations, never just the first.

use super::decode::Configurable;
use super::schema::{FieldDoc, FieldKind, Schema};
use super::tree::{ConfigTree, get_path};
use crate::error::{ConfigError, Result, ValidationErrors};
use serde_json::Value;

/// A numeric bound, keeping the literal for messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub literal: String,
}

/// One parsed validation rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Value must be non-zero / non-empty.
    Required,
    /// Numeric lower bound, or minimum string length.
    Min(Bound),
    /// Numeric upper bound, or maximum string length.
    Max(Bound),
    /// Value must equal one of the literals.
    OneOf(Vec<String>),
    /// Value must be `MAJOR.MINOR.PATCH[-prerelease][+build]`.
    Semver,
}

/// Parse a rule expression. An empty expression yields no rules.
pub fn parse_rules(expr: &str) -> std::result::Result<Vec<Rule>, String> {
    let mut rules = Vec::new();
    for chunk in expr.split(',') {
        let mut tokens = chunk.split_whitespace();
        while let Some(token) = tokens.next() {
            if let Some(first) = token.strip_prefix("oneof=") {
                let literals: Vec<String> = std::iter::once(first)
                    .chain(tokens.by_ref())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if literals.is_empty() {
                    return Err("oneof requires at least one value".to_string());
                }
                rules.push(Rule::OneOf(literals));
                break;
            }
            rules.push(parse_rule(token)?);
        }
    }
    Ok(rules)
}

fn parse_rule(token: &str) -> std::result::Result<Rule, String> {
    match token.split_once('=') {
        None => match token {
            "required" => Ok(Rule::Required),
            "semver" => Ok(Rule::Semver),
            other => Err(format!("unknown rule `{}`", other)),
        },
        Some(("min", param)) => parse_bound(param).map(Rule::Min),
        Some(("max", param)) => parse_bound(param).map(Rule::Max),
        Some((name, _)) => Err(format!("unknown rule `{}`", name)),
    }
}

fn parse_bound(param: &str) -> std::result::Result<Bound, String> {
    let value = param
        .parse::<f64>()
        .map_err(|_| format!("bound `{}` is not a number", param))?;
    Ok(Bound {
        value,
        literal: param.to_string(),
    })
}

/// Check a tree against every rule in the schema.
///
/// Missing and null values are judged as the zero value of their kind.
pub fn check_tree(schema: &Schema, tree: &ConfigTree) -> Vec<String> {
    let mut violations = Vec::new();
    for (doc, rules) in schema.rules() {
        let value = get_path(tree, &doc.path).filter(|v| !v.is_null());
        for rule in rules {
            if let Some(reason) = check_rule(doc, rule, value) {
                violations.push(format!("{} {}", doc.name, reason));
            }
        }
    }
    violations
}

fn check_rule(doc: &FieldDoc, rule: &Rule, value: Option<&Value>) -> Option<String> {
    match rule {
        Rule::Required => (!is_set(doc.kind, value)).then(|| "is required".to_string()),
        Rule::Min(bound) => measure(doc.kind, value)
            .filter(|m| *m < bound.value)
            .map(|_| format!("must be at least {}", bound.literal)),
        Rule::Max(bound) => measure(doc.kind, value)
            .filter(|m| *m > bound.value)
            .map(|_| format!("must be at most {}", bound.literal)),
        Rule::OneOf(allowed) => {
            let actual = render(doc.kind, value);
            (!allowed.iter().any(|a| *a == actual))
                .then(|| format!("must be one of: {}", allowed.join(", ")))
        }
        Rule::Semver => {
            let text = value.and_then(Value::as_str).unwrap_or_default();
            semver::Version::parse(text)
                .is_err()
                .then(|| "must be valid semantic version".to_string())
        }
    }
}

fn is_set(kind: FieldKind, value: Option<&Value>) -> bool {
    match (kind, value) {
        (_, None) => false,
        (FieldKind::String, Some(v)) => v.as_str().is_some_and(|s| !s.is_empty()),
        (FieldKind::Bool, Some(v)) => v.as_bool().unwrap_or(false),
        (_, Some(v)) => v.as_f64().is_some_and(|n| n != 0.0),
    }
}

/// Numeric value, or character count for strings. Bools have no measure.
fn measure(kind: FieldKind, value: Option<&Value>) -> Option<f64> {
    match kind {
        FieldKind::Bool => None,
        FieldKind::String => Some(
            value
                .and_then(Value::as_str)
                .map_or(0, |s| s.chars().count()) as f64,
        ),
        _ => Some(value.and_then(Value::as_f64).unwrap_or(0.0)),
    }
}

fn render(kind: FieldKind, value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => match kind {
            FieldKind::String => String::new(),
            FieldKind::Bool => "false".to_string(),
            FieldKind::Int | FieldKind::Uint | FieldKind::Float => "0".to_string(),
        },
    }
}

/// Every violation message for a typed config. Empty means valid.
///
/// A schema that fails to build, or a value that cannot be inspected, is
/// reported as a single message.
pub fn validate_with_details<T: Configurable>(cfg: &T) -> Vec<String> {
    let checked = T::schema().and_then(|schema| Ok(check_tree(&schema, &cfg.to_tree()?)));
    match checked {
        Ok(violations) => violations,
        Err(e) => vec![e.to_string()],
    }
}

/// Validate a typed config, failing with the complete violation list.
pub fn validate<T: Configurable>(cfg: &T) -> Result<()> {
    let schema = T::schema()?;
    validate_tree(&schema, &cfg.to_tree()?)
}

/// Validate an already-encoded tree against a schema.
pub fn validate_tree(schema: &Schema, tree: &ConfigTree) -> Result<()> {
    let violations = check_tree(schema, tree);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(ValidationErrors::new(violations)))
    }
}
