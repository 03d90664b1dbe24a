//! Argument lists: the contents of a nested group, read as elements and
//! grouped into keyed or unnamed entries.
//!
//! Gluing decides structure here. `:name` is a key only when the colon and
//! the name touch; `#name`/`@name` is a reference only when glued; `%Type`
//! and `%(...)` are type calls only when glued.

use crate::syntax::{AtomKind, Item, Node};

/// Which table a reference reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local,
}

/// One element of an argument list.
#[derive(Debug, Clone, PartialEq)]
pub enum Element<'a> {
    /// `:name`
    Key(&'a str),
    /// A raw atom, brackets still on.
    Literal(&'a str),
    /// `#name` or `@name`
    Reference { scope: Scope, name: &'a str },
    /// `%Name`, `%Name(...)` or `%(...)`
    TypeCall {
        name: Option<&'a str>,
        args: Option<&'a Node>,
    },
    /// A nested group.
    Group(&'a Node),
}

/// A key (or none) and the elements that belong to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<'a> {
    pub key: Option<&'a str>,
    pub values: Vec<Element<'a>>,
}

/// Read the flattened items of `node` as elements.
pub fn elements(node: &Node) -> Vec<Element<'_>> {
    let items: Vec<&Item> = node.items().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < items.len() {
        let atom = match items[i] {
            Item::Node(n) => {
                out.push(Element::Group(n));
                i += 1;
                continue;
            }
            Item::Atom(a) => a,
        };

        // A name-like atom glued on to this one.
        let glued_name = match items.get(i + 1).copied() {
            Some(Item::Atom(next))
                if atom.glued_after
                    && next.glued_before
                    && matches!(next.kind, AtomKind::Word | AtomKind::Number) =>
            {
                Some(next.text.as_str())
            }
            _ => None,
        };

        if atom.kind == AtomKind::Symbol {
            match (atom.text.as_str(), glued_name) {
                (":", Some(name)) => {
                    out.push(Element::Key(name));
                    i += 2;
                    continue;
                }
                ("#", Some(name)) => {
                    out.push(Element::Reference {
                        scope: Scope::Global,
                        name,
                    });
                    i += 2;
                    continue;
                }
                ("@", Some(name)) => {
                    out.push(Element::Reference {
                        scope: Scope::Local,
                        name,
                    });
                    i += 2;
                    continue;
                }
                ("%", Some(name)) => {
                    i += 2;
                    let args = match items.get(i).copied() {
                        Some(Item::Node(n)) if n.glued_before => {
                            i += 1;
                            Some(n)
                        }
                        _ => None,
                    };
                    out.push(Element::TypeCall {
                        name: Some(name),
                        args,
                    });
                    continue;
                }
                ("%", None) if atom.glued_after => {
                    if let Some(Item::Node(n)) = items.get(i + 1).copied() {
                        if n.glued_before {
                            out.push(Element::TypeCall {
                                name: None,
                                args: Some(n),
                            });
                            i += 2;
                            continue;
                        }
                    }
                }
                _ => {}
            }
        }

        out.push(Element::Literal(&atom.text));
        i += 1;
    }

    out
}

/// Group elements into entries. Elements before the first key are one
/// unnamed entry each; after a key, everything up to the next key belongs
/// to it.
pub fn entries<'a>(elements: Vec<Element<'a>>) -> Vec<Entry<'a>> {
    let mut out: Vec<Entry<'a>> = Vec::new();
    let mut keyed = false;

    for element in elements {
        match element {
            Element::Key(name) => {
                keyed = true;
                out.push(Entry {
                    key: Some(name),
                    values: Vec::new(),
                });
            }
            other if keyed => {
                if let Some(last) = out.last_mut() {
                    last.values.push(other);
                }
            }
            other => out.push(Entry {
                key: None,
                values: vec![other],
            }),
        }
    }

    out
}

/// Entries of a group, keyed or not.
pub fn node_entries(node: &Node) -> Vec<Entry<'_>> {
    entries(elements(node))
}

pub fn has_keys(entries: &[Entry<'_>]) -> bool {
    entries.iter().any(|e| e.key.is_some())
}

/// The literal atoms of a group, brackets removed. Used for enum choices.
pub fn literal_atoms(node: &Node) -> Vec<String> {
    node.items()
        .filter_map(|item| match item {
            Item::Atom(a) if a.kind != AtomKind::Symbol => {
                Some(crate::literal::unwrap_literal(&a.text))
            }
            _ => None,
        })
        .collect()
}
