//! Caller-side validation of evaluated values.
//!
//! Evaluation never rejects anything: enum values outside their choice set,
//! numbers that fell back to text and unresolved references all survive as
//! data. These walks report them after the fact.

use crate::document::Document;
use crate::error::{SchemaError, ValidationError};
use crate::literal::DATE_RE;
use crate::schema::{MemberDef, MemberKind};
use crate::value::{Entity, Value};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Entities already walked, so shared or cyclic entities are visited once.
type Visited = HashSet<*const Entity>;

// ── Schema validation ───────────────────────────────────────────────

/// Check every declared member of a typed entity against its kind, then
/// recurse into nested entities and lists. Untyped entities only recurse.
///
/// Returns an empty vec when everything conforms.
pub fn validate_entity(entity: &Entity) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut path = Vec::new();
    walk_entity(entity, &mut path, &mut Visited::new(), &mut errors);
    errors
}

/// [`validate_entity`] over every entity reachable from the document's
/// publics and locals. Paths start with `#name` or `@name`.
pub fn validate_document(doc: &Document) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut visited = Visited::new();
    for (sigil, table) in [("#", doc.publics()), ("@", doc.locals())] {
        for (name, value) in table {
            let mut path = vec![format!("{}{}", sigil, name)];
            walk_value(value, &mut path, &mut visited, &mut errors);
        }
    }
    errors
}

fn walk_entity(
    entity: &Entity,
    path: &mut Vec<String>,
    visited: &mut Visited,
    errors: &mut Vec<SchemaError>,
) {
    if !visited.insert(entity as *const Entity) {
        return;
    }

    let members = entity.schema.as_ref().map(|td| td.members()).unwrap_or(&[]);
    for member in members {
        path.push(member.name.clone());
        let value = entity.field(&member.name).unwrap_or(&Value::Empty);
        validate_member(value, member, path, errors);
        walk_value(value, path, visited, errors);
        path.pop();
    }

    // Undeclared fields and props are not checked, only walked.
    let extra = entity
        .fields()
        .iter()
        .filter(|(k, _)| !members.iter().any(|m| &m.name == *k))
        .chain(entity.props());
    for (key, value) in extra {
        path.push(key.clone());
        walk_value(value, path, visited, errors);
        path.pop();
    }
}

fn walk_value(
    value: &Value,
    path: &mut Vec<String>,
    visited: &mut Visited,
    errors: &mut Vec<SchemaError>,
) {
    match value {
        Value::Entity(e) => walk_entity(&e.borrow(), path, visited, errors),
        Value::List(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(format!("[{}]", i));
                walk_value(item, path, visited, errors);
                path.pop();
            }
        }
        _ => {}
    }
}

fn validate_member(value: &Value, member: &MemberDef, path: &[String], errors: &mut Vec<SchemaError>) {
    if value.is_empty() {
        errors.push(SchemaError::new(
            "missing-required",
            format!("Missing value for member \"{}\"", member.name),
            path,
        ));
        return;
    }

    if !member.multi {
        validate_kind(value, member, path, errors);
        return;
    }

    match value {
        Value::List(items) => {
            let mut item_path = path.to_vec();
            for (i, item) in items.iter().enumerate() {
                item_path.push(format!("[{}]", i));
                validate_kind(item, member, &item_path, errors);
                item_path.pop();
            }
        }
        other => errors.push(SchemaError::new(
            "wrong-type",
            format!(
                "Expected a list of \"{}\" but found {}",
                member.kind.as_str(),
                other.tag()
            ),
            path,
        )),
    }
}

fn validate_kind(value: &Value, member: &MemberDef, path: &[String], errors: &mut Vec<SchemaError>) {
    // Placeholders are the business of validate_references.
    if matches!(value, Value::Ref(_) | Value::Empty) {
        return;
    }

    let ok = match (&member.kind, value) {
        // Text members take whatever the literal classified as.
        (MemberKind::Text, _) => true,
        (MemberKind::Number | MemberKind::Float, Value::Number(_)) => true,
        (MemberKind::Date, Value::Date(s)) => {
            if !DATE_RE.is_match(s) {
                errors.push(SchemaError::new(
                    "pattern-mismatch",
                    format!("Value \"{}\" does not match pattern \"YYYY-MM-DD\"", s),
                    path,
                ));
            }
            true
        }
        (MemberKind::DateTime, Value::Date(_)) => true,
        (MemberKind::Bool, Value::Bool(_)) => true,
        (MemberKind::Enum, Value::Enum { value, choices }) => {
            if !choices.is_empty() && !choices.contains(value) {
                errors.push(SchemaError::new(
                    "invalid-enum-value",
                    format!(
                        "Value \"{}\" does not match any allowed enum value. Allowed: [{}]",
                        value,
                        choices.join(", ")
                    ),
                    path,
                ));
            }
            true
        }
        (MemberKind::SObject, Value::Entity(_)) => true,
        (MemberKind::Named(name), Value::Entity(e)) => {
            e.borrow().type_name.as_deref() == Some(name.as_str())
        }
        _ => false,
    };

    if !ok {
        errors.push(SchemaError::new(
            "wrong-type",
            format!(
                "Expected type \"{}\" but found {}",
                member.kind.as_str(),
                value.tag()
            ),
            path,
        ));
    }
}

// ── Reference validation ────────────────────────────────────────────

/// Report every `Ref` placeholder still reachable from the document's
/// publics and locals.
///
/// Returns an empty vec when every reference resolved.
pub fn validate_references(doc: &Document) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut visited = Visited::new();
    for (sigil, table) in [("#", doc.publics()), ("@", doc.locals())] {
        for (name, value) in table {
            let mut path = vec![format!("{}{}", sigil, name)];
            walk_refs(value, &mut path, &mut visited, &mut errors);
        }
    }
    errors
}

fn walk_refs(
    value: &Value,
    path: &mut Vec<String>,
    visited: &mut Visited,
    errors: &mut Vec<ValidationError>,
) {
    match value {
        Value::Ref(name) => errors.push(ValidationError::unresolved_reference(name, path)),
        Value::List(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(format!("[{}]", i));
                walk_refs(item, path, visited, errors);
                path.pop();
            }
        }
        Value::Entity(e) => {
            let entity = e.borrow();
            if !visited.insert(&*entity as *const Entity) {
                return;
            }
            walk_ref_table(entity.fields(), path, visited, errors);
            walk_ref_table(entity.props(), path, visited, errors);
        }
        _ => {}
    }
}

fn walk_ref_table(
    table: &IndexMap<String, Value>,
    path: &mut Vec<String>,
    visited: &mut Visited,
    errors: &mut Vec<ValidationError>,
) {
    for (key, value) in table {
        path.push(key.clone());
        walk_refs(value, path, visited, errors);
        path.pop();
    }
}
