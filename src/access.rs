//! Getter and setter resolution against a single value.

use crate::args::{node_entries, Element};
use crate::eval::Builder;
use crate::literal::unwrap_literal;
use crate::syntax::Node;
use crate::value::{Entity, Value};
use tracing::trace;

/// One step of the entity lookup chain.
type Lookup = fn(&Entity, &str) -> Option<Value>;

fn by_field(entity: &Entity, name: &str) -> Option<Value> {
    entity.field(name).cloned()
}

fn by_prop(entity: &Entity, name: &str) -> Option<Value> {
    entity.prop(name).cloned()
}

fn by_reserved(entity: &Entity, name: &str) -> Option<Value> {
    entity.reserved().get(name).cloned()
}

fn by_position(entity: &Entity, name: &str) -> Option<Value> {
    let index = one_based(name)?;
    Some(
        entity
            .fields()
            .get_index(index)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Empty),
    )
}

/// Entity lookups, in precedence order. Fields shadow props of the same
/// name; the positional fallback only runs when no name matched.
pub const ENTITY_LOOKUP_CHAIN: &[Lookup] = &[by_field, by_prop, by_reserved, by_position];

/// Parse a positive 1-based index into a 0-based one.
fn one_based(accessor: &str) -> Option<usize> {
    match accessor.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n - 1),
        _ => None,
    }
}

/// Resolve `value.accessor`.
pub fn apply_getter(value: &Value, accessor: &str) -> Value {
    match value {
        Value::Entity(entity) => {
            let entity = entity.borrow();
            ENTITY_LOOKUP_CHAIN
                .iter()
                .find_map(|lookup| lookup(&entity, accessor))
                .unwrap_or(Value::Empty)
        }
        Value::List(items) => one_based(accessor)
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(Value::Empty),
        _ => Value::Empty,
    }
}

/// Apply `!name(args)`: the first unnamed argument is written through the
/// set-field-or-prop rule. Anything that is not an entity passes through.
pub fn apply_setter(
    value: Value,
    field_name: &str,
    args: Option<&Node>,
    builder: &Builder<'_>,
) -> Value {
    let Value::Entity(entity) = &value else {
        return value;
    };
    let Some(args) = args else {
        return value;
    };

    let entries = node_entries(args);
    let first = entries
        .iter()
        .find(|e| e.key.is_none())
        .and_then(|e| e.values.first());
    let Some(element) = first else {
        trace!(field = field_name, "setter without an unnamed argument");
        return value;
    };

    let new_value = builder.element_value(element, None);
    entity.borrow_mut().set(field_name, new_value);
    value
}

/// Apply `!+(args)`. Takes `:key value` pairs and flat `key value key value`
/// runs in the same list; each pair goes through the set-field-or-prop rule
/// in order.
pub fn apply_batch_setter(value: Value, args: Option<&Node>, builder: &Builder<'_>) -> Value {
    let Value::Entity(entity) = &value else {
        return value;
    };
    let Some(args) = args else {
        return value;
    };

    let mut pairs: Vec<(String, Value)> = Vec::new();
    // Key half of a flat pair; `Some(None)` when that key was not a name.
    let mut pending: Option<Option<String>> = None;

    for entry in node_entries(args) {
        match entry.key {
            Some(key) => {
                pending = None;
                pairs.push((key.to_string(), builder.entry_value(&entry.values, None)));
            }
            None => {
                let Some(element) = entry.values.first() else {
                    continue;
                };
                match pending.take() {
                    Some(Some(key)) => pairs.push((key, builder.element_value(element, None))),
                    Some(None) => {}
                    None => {
                        pending = Some(match element {
                            Element::Literal(raw) => Some(unwrap_literal(raw)),
                            other => {
                                trace!(?other, "batch setter key is not a name");
                                None
                            }
                        });
                    }
                }
            }
        }
    }

    {
        let mut entity = entity.borrow_mut();
        for (key, v) in pairs {
            entity.set(&key, v);
        }
    }
    value
}
