use crate::schema::TypeDef;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// An entity shared between the environment, results and the chain that
/// mutates it.
pub type EntityRef = Rc<RefCell<Entity>>;

/// A resolved value.
///
/// Setters can make an entity reach itself, so equality tracks the entity
/// pairs it is already comparing and `Debug` prints entities shallowly.
#[derive(Debug, Clone, Default)]
pub enum Value {
    Text(String),
    Number(f64),
    /// ISO 8601 date string, kept as written.
    Date(String),
    Bool(bool),
    /// A selected choice and the choice set it was built against.
    Enum { value: String, choices: Vec<String> },
    List(Vec<Value>),
    Entity(EntityRef),
    /// A name that did not resolve when it was read.
    Ref(String),
    #[default]
    Empty,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Value {
        Value::Text(s.into())
    }

    pub fn entity(entity: Entity) -> Value {
        Value::Entity(Rc::new(RefCell::new(entity)))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// A short tag name, used in logs and validation messages.
    pub fn tag(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Number(_) => "number",
            Value::Date(_) => "date",
            Value::Bool(_) => "bool",
            Value::Enum { .. } => "enum",
            Value::List(_) => "list",
            Value::Entity(_) => "entity",
            Value::Ref(_) => "ref",
            Value::Empty => "empty",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Date(s) | Value::Ref(s) => Some(s),
            Value::Enum { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_eq(self, other, &mut Vec::new())
    }
}

/// Entity pairs under comparison. Meeting a pair again closes a cycle and
/// counts as equal.
type Seen = Vec<(*const Entity, *const Entity)>;

fn values_eq(a: &Value, b: &Value, seen: &mut Seen) -> bool {
    match (a, b) {
        (Value::Text(x), Value::Text(y))
        | (Value::Date(x), Value::Date(y))
        | (Value::Ref(x), Value::Ref(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (
            Value::Enum { value, choices },
            Value::Enum {
                value: other_value,
                choices: other_choices,
            },
        ) => value == other_value && choices == other_choices,
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_eq(x, y, seen))
        }
        (Value::Entity(x), Value::Entity(y)) => entity_refs_eq(x, y, seen),
        (Value::Empty, Value::Empty) => true,
        _ => false,
    }
}

fn entity_refs_eq(a: &EntityRef, b: &EntityRef, seen: &mut Seen) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }
    let pair = (a.as_ptr() as *const Entity, b.as_ptr() as *const Entity);
    if seen.contains(&pair) {
        return true;
    }
    seen.push(pair);
    let equal = entities_eq(&a.borrow(), &b.borrow(), seen);
    seen.pop();
    equal
}

fn entities_eq(a: &Entity, b: &Entity, seen: &mut Seen) -> bool {
    a.type_name == b.type_name
        && same_schema(a.schema.as_ref(), b.schema.as_ref())
        && maps_eq(&a.fields, &b.fields, seen)
        && maps_eq(&a.props, &b.props, seen)
        && maps_eq(&a.reserved, &b.reserved, seen)
}

// Reserved metadata is compared on the entity itself, never through the schema.
fn same_schema(a: Option<&Rc<TypeDef>>, b: Option<&Rc<TypeDef>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => {
            Rc::ptr_eq(x, y) || (x.name == y.name && x.members() == y.members())
        }
        _ => false,
    }
}

fn maps_eq(a: &IndexMap<String, Value>, b: &IndexMap<String, Value>, seen: &mut Seen) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, x)| b.get(key).is_some_and(|y| values_eq(x, y, seen)))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) | Value::Date(s) => f.write_str(s),
            Value::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < (1u64 << 53) as f64 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Enum { value, .. } => f.write_str(value),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Entity(e) => match &e.borrow().type_name {
                Some(name) => write!(f, "Entity({})", name),
                None => f.write_str("Entity"),
            },
            Value::Ref(name) => write!(f, "Ref({})", name),
            Value::Empty => f.write_str("Empty"),
        }
    }
}

/// A record instance.
///
/// `fields` hold schema-declared members, `props` hold names introduced by
/// setters. A key never lives in both. `reserved` is copied from the schema
/// when the entity is built and has no mutator.
#[derive(Clone, Default)]
pub struct Entity {
    pub schema: Option<Rc<TypeDef>>,
    pub type_name: Option<String>,
    fields: IndexMap<String, Value>,
    props: IndexMap<String, Value>,
    reserved: IndexMap<String, Value>,
}

impl Entity {
    /// An ad hoc record with no schema.
    pub fn untyped(type_name: Option<String>) -> Self {
        Entity {
            type_name,
            ..Entity::default()
        }
    }

    /// A record built from `schema`, inheriting its reserved metadata.
    pub fn typed(schema: Rc<TypeDef>) -> Self {
        let reserved = schema.reserved().clone();
        let type_name = (!schema.name.is_empty()).then(|| schema.name.clone());
        Entity {
            schema: Some(schema),
            type_name,
            fields: IndexMap::new(),
            props: IndexMap::new(),
            reserved,
        }
    }

    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    pub fn props(&self) -> &IndexMap<String, Value> {
        &self.props
    }

    pub fn reserved(&self) -> &IndexMap<String, Value> {
        &self.reserved
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Declare a field while the entity is being built.
    pub(crate) fn insert_field(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.props.shift_remove(&name);
        self.fields.insert(name, value);
    }

    /// Write through the set-field-or-prop rule: overwrite an existing
    /// field, else an existing prop, else create a prop.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.fields.get_mut(name) {
            *slot = value;
        } else if let Some(slot) = self.props.get_mut(name) {
            *slot = value;
        } else {
            self.props.insert(name.to_string(), value);
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        entities_eq(self, other, &mut Vec::new())
    }
}

/// Shallow: member values can lead back to this entity.
impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("props", &self.props.keys().collect::<Vec<_>>())
            .field("reserved", &self.reserved.keys().collect::<Vec<_>>())
            .finish()
    }
}
