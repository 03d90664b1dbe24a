use crate::args::Scope;
use crate::schema::TypeDef;
use crate::value::Value;
use indexmap::IndexMap;
use std::rc::Rc;

/// Name of the local that holds the data block.
pub const DATA_LOCAL: &str = "_DATA";

/// The scope tables of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub typedefs: IndexMap<String, Rc<TypeDef>>,
    /// `@name`
    pub locals: IndexMap<String, Value>,
    /// `#name` and `@#name`
    pub publics: IndexMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, replacing any schema of the same name.
    pub fn register_typedef(&mut self, td: TypeDef) -> Rc<TypeDef> {
        let td = Rc::new(td);
        self.typedefs.insert(td.name.clone(), Rc::clone(&td));
        td
    }

    pub fn typedef(&self, name: &str) -> Option<Rc<TypeDef>> {
        self.typedefs.get(name).cloned()
    }

    pub fn set_local(&mut self, name: impl Into<String>, value: Value) {
        self.locals.insert(name.into(), value);
    }

    pub fn set_public(&mut self, name: impl Into<String>, value: Value) {
        self.publics.insert(name.into(), value);
    }

    /// A local, or Empty.
    pub fn local(&self, name: &str) -> Value {
        self.locals.get(name).cloned().unwrap_or(Value::Empty)
    }

    /// A public, or Empty.
    pub fn public(&self, name: &str) -> Value {
        self.publics.get(name).cloned().unwrap_or(Value::Empty)
    }

    pub fn lookup(&self, scope: Scope, name: &str) -> Value {
        match scope {
            Scope::Global => self.public(name),
            Scope::Local => self.local(name),
        }
    }
}
