pub mod access;
pub mod args;
pub mod document;
pub mod env;
pub mod error;
pub mod eval;
pub mod literal;
pub mod reader;
pub mod schema;
pub mod syntax;
pub mod validate;
pub mod value;

pub use document::Document;
pub use env::Environment;
pub use error::{SchemaError, ValidationError};
pub use eval::evaluate;
pub use schema::{MemberDef, MemberKind, TypeDef};
pub use syntax::{Atom, AtomKind, Item, Node, Parsed};
pub use validate::{validate_document, validate_entity, validate_references};
pub use value::{Entity, EntityRef, Value};

// ── Core API ───────────────────────────────────────────────────────

/// Evaluate a bare lexer tree with no data block.
pub fn evaluate_node(root: Node) -> Document {
    evaluate(&Parsed::from(root))
}
