//! The two-pass evaluator.
//!
//! Pass 1 registers every schema definition so that instantiations can see
//! schemas declared further down. Pass 2 walks the statements in order,
//! storing definitions and collecting expression results.

use crate::access::{apply_batch_setter, apply_getter, apply_setter};
use crate::args::{elements, entries, has_keys, literal_atoms, node_entries, Element};
use crate::document::Document;
use crate::env::{Environment, DATA_LOCAL};
use crate::literal::{atom_to_value, coerce, unwrap_literal};
use crate::reader::{read_statements, Leader, Statement, Unit};
use crate::schema::{MemberDef, MemberKind, TypeDef, RESERVED_KEY};
use crate::syntax::{Node, Parsed};
use crate::value::{Entity, Value};
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// Evaluate a parsed source into a fresh document.
pub fn evaluate(parsed: &Parsed) -> Document {
    let mut doc = Document::new();
    doc.merge(parsed);
    doc
}

/// Run both passes over `root` against `env`, returning the expression
/// results in source order.
pub(crate) fn run(env: &mut Environment, root: &Node) -> Vec<Value> {
    let statements = read_statements(root);
    debug!(statements = statements.len(), "evaluating");

    for stmt in statements.iter().filter(|s| is_schema_definition(s)) {
        register_schema(env, stmt);
    }

    let mut results = Vec::new();
    for stmt in &statements {
        if stmt.units.is_empty() {
            continue;
        }
        if stmt.is_define {
            define(env, stmt);
        } else {
            let value = Builder::new(env).eval_chain(&stmt.units);
            trace!(tag = value.tag(), "expression evaluated");
            results.push(value);
        }
    }

    debug!(results = results.len(), "evaluation finished");
    results
}

/// Store the data block as the `_DATA` local.
pub(crate) fn load_data_block(env: &mut Environment, data: &IndexMap<String, String>) {
    if data.is_empty() {
        return;
    }
    let mut entity = Entity::untyped(Some(DATA_LOCAL.to_string()));
    for (name, content) in data {
        entity.insert_field(name.as_str(), Value::Text(content.clone()));
    }
    debug!(sections = data.len(), "data block loaded");
    env.set_local(DATA_LOCAL, Value::entity(entity));
}

fn is_schema_definition(stmt: &Statement<'_>) -> bool {
    stmt.is_define && stmt.leads_with(Leader::TypeCall)
}

fn register_schema(env: &mut Environment, stmt: &Statement<'_>) {
    let Some(head) = stmt.first() else {
        return;
    };
    let name = head.operand.clone().unwrap_or_default();
    let td = Builder::new(env).schema(name, head.child);
    debug!(name = %td.name, members = td.members().len(), "schema registered");
    env.register_typedef(td);
}

fn define(env: &mut Environment, stmt: &Statement<'_>) {
    let Some((head, rest)) = stmt.units.split_first() else {
        return;
    };
    let Some(name) = head.operand.clone() else {
        return;
    };
    match head.leader {
        Leader::GlobalRef => {
            let value = Builder::new(env).definition_value(head, rest);
            debug!(name = %name, tag = value.tag(), "public defined");
            env.set_public(name, value);
        }
        Leader::LocalRef => {
            let value = Builder::new(env).definition_value(head, rest);
            debug!(name = %name, tag = value.tag(), "local defined");
            env.set_local(name, value);
        }
        // Schemas were registered in pass 1.
        _ => {}
    }
}

/// Builds values from units and argument lists against a read-only view
/// of the environment.
pub struct Builder<'e> {
    env: &'e Environment,
}

impl<'e> Builder<'e> {
    pub fn new(env: &'e Environment) -> Self {
        Builder { env }
    }

    // ── Unit chains ─────────────────────────────────────────────────

    pub fn eval_chain(&self, units: &[Unit<'_>]) -> Value {
        let Some((head, rest)) = units.split_first() else {
            return Value::Empty;
        };
        let base = self.eval_head(head);
        self.apply_units(base, rest)
    }

    /// The value stored by `@name (...)` / `@#name ...`: the group the first
    /// unit owns, or else the rest of the chain.
    pub fn definition_value(&self, head: &Unit<'_>, rest: &[Unit<'_>]) -> Value {
        match head.child {
            Some(node) => self.apply_units(self.group_value(node), rest),
            None => self.eval_chain(rest),
        }
    }

    fn eval_head(&self, unit: &Unit<'_>) -> Value {
        let operand = unit.operand.as_deref();
        match unit.leader {
            Leader::GlobalRef => operand.map_or(Value::Empty, |n| self.env.public(n)),
            Leader::LocalRef => operand.map_or(Value::Empty, |n| self.env.local(n)),
            Leader::TypeCall => self.instantiate(operand, unit.child),
            Leader::Key => Value::Text(operand.unwrap_or_default().to_string()),
            Leader::Getter | Leader::Setter => self.apply_unit(Value::Empty, unit),
        }
    }

    pub fn apply_units(&self, base: Value, units: &[Unit<'_>]) -> Value {
        units
            .iter()
            .fold(base, |value, unit| self.apply_unit(value, unit))
    }

    fn apply_unit(&self, value: Value, unit: &Unit<'_>) -> Value {
        trace!(leader = unit.leader.sigil(), operand = ?unit.operand, "apply unit");
        match unit.leader {
            Leader::Getter => match &unit.operand {
                Some(accessor) => apply_getter(&value, accessor),
                None => Value::Empty,
            },
            Leader::Setter if unit.is_batch_setter() => {
                apply_batch_setter(value, unit.child, self)
            }
            Leader::Setter => match &unit.operand {
                Some(name) => apply_setter(value, name, unit.child, self),
                None => value,
            },
            // A reference or type call mid-chain stands on its own.
            Leader::TypeCall | Leader::GlobalRef | Leader::LocalRef => self.eval_head(unit),
            Leader::Key => value,
        }
    }

    // ── Schemas ─────────────────────────────────────────────────────

    /// Build a schema from its body. `:name annotation...` pairs declare
    /// members; a body without keys declares one text member per word.
    pub fn schema(&self, name: String, body: Option<&Node>) -> TypeDef {
        let mut td = TypeDef::new(name);
        let Some(body) = body else {
            return td;
        };

        let elements = elements(body);
        if !elements.iter().any(|e| matches!(e, Element::Key(_))) {
            for element in &elements {
                if let Element::Literal(raw) = element {
                    td.push_member(MemberDef::text(unwrap_literal(raw)));
                }
            }
            return td;
        }

        for entry in entries(elements) {
            let Some(key) = entry.key else {
                continue;
            };
            if key == RESERVED_KEY {
                td.set_reserved(RESERVED_KEY, self.entry_value(&entry.values, None));
            } else {
                td.push_member(member_def(key, &entry.values));
            }
        }
        td
    }

    // ── Instantiation ───────────────────────────────────────────────

    /// `%Name(args)`. An unknown schema gives an untyped entity that still
    /// carries the name.
    pub fn instantiate(&self, type_name: Option<&str>, args: Option<&Node>) -> Value {
        let schema = type_name.and_then(|n| self.env.typedef(n));
        if schema.is_none() {
            if let Some(name) = type_name {
                trace!(name, "instantiating without a schema");
            }
        }
        Value::entity(self.build_entity(schema, type_name.map(str::to_string), args))
    }

    fn build_entity(
        &self,
        schema: Option<Rc<TypeDef>>,
        type_name: Option<String>,
        args: Option<&Node>,
    ) -> Entity {
        let mut entity = match &schema {
            Some(td) => Entity::typed(Rc::clone(td)),
            None => Entity::untyped(type_name),
        };
        let entries = args.map(node_entries).unwrap_or_default();

        if has_keys(&entries) {
            if let Some(td) = &schema {
                for member in td.members() {
                    entity.insert_field(member.name.as_str(), Value::Empty);
                }
            }
            let mut unnamed = 0;
            for entry in &entries {
                match entry.key {
                    Some(RESERVED_KEY) => {
                        let ignored = self.entry_value(&entry.values, None);
                        trace!(tag = ignored.tag(), "reserved key in arguments ignored");
                    }
                    Some(key) => {
                        let member = schema.as_ref().and_then(|td| td.member(key));
                        entity.insert_field(key, self.entry_value(&entry.values, member));
                    }
                    None => {
                        for element in &entry.values {
                            entity.insert_field(
                                format!("_{}", unnamed),
                                self.element_value(element, None),
                            );
                            unnamed += 1;
                        }
                    }
                }
            }
        } else if let Some(td) = &schema {
            for (i, member) in td.members().iter().enumerate() {
                let value = match entries.get(i).and_then(|e| e.values.first()) {
                    Some(element) => self.entry_value(std::slice::from_ref(element), Some(member)),
                    None => Value::Empty,
                };
                entity.insert_field(member.name.as_str(), value);
            }
        } else {
            for (i, entry) in entries.iter().enumerate() {
                let value = entry
                    .values
                    .first()
                    .map_or(Value::Empty, |e| self.element_value(e, None));
                entity.insert_field(format!("_{}", i), value);
            }
        }

        entity
    }

    // ── Argument values ─────────────────────────────────────────────

    /// A bare group: keyed groups become anonymous entities, otherwise a
    /// single element is itself and several make a list.
    pub fn group_value(&self, node: &Node) -> Value {
        let entries = node_entries(node);
        if has_keys(&entries) {
            return Value::entity(self.build_entity(None, None, Some(node)));
        }
        let mut values: Vec<Value> = entries
            .iter()
            .filter_map(|e| e.values.first())
            .map(|e| self.element_value(e, None))
            .collect();
        match values.len() {
            0 => Value::Empty,
            1 => values.remove(0),
            _ => Value::List(values),
        }
    }

    /// The value of everything that follows one key.
    pub fn entry_value(&self, values: &[Element<'_>], member: Option<&MemberDef>) -> Value {
        if let Some(member) = member.filter(|m| m.multi) {
            let items = multi_items(values)
                .into_iter()
                .map(|e| self.element_value(&e, Some(member)))
                .collect();
            return Value::List(items);
        }
        match values {
            [] => self.literal_value("", member),
            [single] => self.element_value(single, member),
            many => Value::List(
                many.iter()
                    .map(|e| self.element_value(e, member))
                    .collect(),
            ),
        }
    }

    /// One argument element, coerced to `member` when one is known.
    /// References resolve now or stay behind as `Ref` placeholders.
    pub fn element_value(&self, element: &Element<'_>, member: Option<&MemberDef>) -> Value {
        match element {
            Element::Literal(raw) => self.literal_value(raw, member),
            Element::Reference { scope, name } => {
                let value = self.env.lookup(*scope, name);
                if value.is_empty() {
                    trace!(name, "unresolved reference kept as placeholder");
                    Value::Ref(name.to_string())
                } else {
                    value
                }
            }
            Element::Group(node) => match member.map(|m| &m.kind) {
                Some(MemberKind::Named(type_name)) => {
                    self.instantiate(Some(type_name.as_str()), Some(node))
                }
                Some(MemberKind::SObject) => {
                    Value::entity(self.build_entity(None, None, Some(node)))
                }
                _ => self.group_value(node),
            },
            Element::TypeCall { name, args } => self.instantiate(*name, *args),
            Element::Key(_) => Value::Empty,
        }
    }

    fn literal_value(&self, raw: &str, member: Option<&MemberDef>) -> Value {
        match member {
            Some(m) => coerce(raw, Some(&m.kind), &m.choices),
            None => atom_to_value(raw),
        }
    }
}

/// Elements of a multi-valued member. A single group holding only groups
/// is unpacked, so `:items ((a) (b))` and `:items (a) (b)` agree.
fn multi_items<'a>(values: &[Element<'a>]) -> Vec<Element<'a>> {
    if let [Element::Group(node)] = values {
        let inner = node_entries(node);
        let all_groups = !inner.is_empty()
            && inner
                .iter()
                .all(|e| e.key.is_none() && matches!(e.values.as_slice(), [Element::Group(_)]));
        if all_groups {
            return inner.into_iter().flat_map(|e| e.values).collect();
        }
    }
    values.to_vec()
}

/// Read a member annotation: `[*] % [shorthand | (choices) | (...)]`.
fn member_def(name: &str, annotation: &[Element<'_>]) -> MemberDef {
    let (multi, rest) = match annotation {
        [Element::Literal("*"), tail @ ..] if starts_with_percent(tail) => (true, tail),
        _ => (false, annotation),
    };

    let (kind, choices) = match rest {
        [Element::Literal("%"), ..] => (MemberKind::Number, Vec::new()),
        [Element::TypeCall {
            name: Some(shorthand),
            args,
        }, ..] => match MemberKind::from_shorthand(shorthand) {
            MemberKind::Enum => (MemberKind::Enum, args.map(literal_atoms).unwrap_or_default()),
            kind => (kind, Vec::new()),
        },
        [Element::TypeCall { name: None, .. }, ..] => (MemberKind::SObject, Vec::new()),
        _ => (MemberKind::Text, Vec::new()),
    };

    MemberDef {
        name: name.to_string(),
        kind,
        choices,
        multi,
    }
}

fn starts_with_percent(elements: &[Element<'_>]) -> bool {
    matches!(
        elements.first(),
        Some(Element::Literal("%") | Element::TypeCall { .. })
    )
}
