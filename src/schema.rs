use crate::value::Value;
use indexmap::IndexMap;

/// The reserved member name. It never appears in a member list.
pub const RESERVED_KEY: &str = "__";

/// The kind of a schema member.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    Text,
    Number,
    Float,
    Date,
    DateTime,
    Bool,
    Enum,
    /// An anonymous structured object: `%(...)`.
    SObject,
    /// Another schema, by name.
    Named(String),
}

impl MemberKind {
    /// Map a `%` shorthand (`%d`, `%b`, ...) to its kind. Unknown
    /// shorthands name another schema.
    pub fn from_shorthand(s: &str) -> MemberKind {
        match s {
            "i" | "int" | "n" | "num" | "number" => MemberKind::Number,
            "f" => MemberKind::Float,
            "d" => MemberKind::Date,
            "dt" | "datetime" => MemberKind::DateTime,
            "b" => MemberKind::Bool,
            "e" => MemberKind::Enum,
            other => MemberKind::Named(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MemberKind::Text => "text",
            MemberKind::Number => "number",
            MemberKind::Float => "float",
            MemberKind::Date => "date",
            MemberKind::DateTime => "datetime",
            MemberKind::Bool => "bool",
            MemberKind::Enum => "enum",
            MemberKind::SObject => "sobject",
            MemberKind::Named(name) => name,
        }
    }
}

/// One typed slot of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDef {
    pub name: String,
    pub kind: MemberKind,
    /// Only meaningful for [`MemberKind::Enum`].
    pub choices: Vec<String>,
    /// `*`: zero or more values, built as a list.
    pub multi: bool,
}

impl MemberDef {
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        MemberDef {
            name: name.into(),
            kind,
            choices: Vec::new(),
            multi: false,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        MemberDef::new(name, MemberKind::Text)
    }
}

/// A named schema. Member order defines positional binding order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDef {
    pub name: String,
    members: Vec<MemberDef>,
    reserved: IndexMap<String, Value>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        TypeDef {
            name: name.into(),
            members: Vec::new(),
            reserved: IndexMap::new(),
        }
    }

    pub fn with_members(name: impl Into<String>, members: Vec<MemberDef>) -> Self {
        let mut td = TypeDef::new(name);
        for m in members {
            td.push_member(m);
        }
        td
    }

    /// Append a member. A member with an existing name replaces it in place;
    /// the reserved name is dropped.
    pub fn push_member(&mut self, member: MemberDef) {
        if member.name == RESERVED_KEY {
            return;
        }
        match self.members.iter_mut().find(|m| m.name == member.name) {
            Some(existing) => *existing = member,
            None => self.members.push(member),
        }
    }

    pub fn set_reserved(&mut self, key: impl Into<String>, value: Value) {
        self.reserved.insert(key.into(), value);
    }

    pub fn members(&self) -> &[MemberDef] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberDef> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn reserved(&self) -> &IndexMap<String, Value> {
        &self.reserved
    }
}
