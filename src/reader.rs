//! Statement reconstruction.
//!
//! The lexer splits chunks on `;` but also on `%`, `:` and some `@`/`#`
//! positions, so chunk boundaries are not statement boundaries. This module
//! regroups chunks into statements and rebuilds each one as a chain of
//! [`Unit`]s, handing out the root's nested groups left to right.

use crate::syntax::{Atom, AtomKind, Node};
use tracing::trace;

/// The role a sigil gives to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leader {
    /// `#`
    GlobalRef,
    /// `@`
    LocalRef,
    /// `.`
    Getter,
    /// `!`
    Setter,
    /// `:`
    Key,
    /// `%`
    TypeCall,
}

impl Leader {
    pub fn from_sigil(s: &str) -> Option<Leader> {
        match s {
            "#" => Some(Leader::GlobalRef),
            "@" => Some(Leader::LocalRef),
            "." => Some(Leader::Getter),
            "!" => Some(Leader::Setter),
            ":" => Some(Leader::Key),
            "%" => Some(Leader::TypeCall),
            _ => None,
        }
    }

    pub fn sigil(self) -> &'static str {
        match self {
            Leader::GlobalRef => "#",
            Leader::LocalRef => "@",
            Leader::Getter => ".",
            Leader::Setter => "!",
            Leader::Key => ":",
            Leader::TypeCall => "%",
        }
    }
}

/// Operand of the batch setter form `!+(...)`.
pub const BATCH_OPERAND: &str = "+";

/// A leader with its operand and the group it consumed, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit<'a> {
    pub leader: Leader,
    pub operand: Option<String>,
    pub child: Option<&'a Node>,
}

impl Unit<'_> {
    pub fn is_batch_setter(&self) -> bool {
        self.leader == Leader::Setter && self.operand.as_deref() == Some(BATCH_OPERAND)
    }
}

/// A unit chain. Definitions introduce a schema or a variable; everything
/// else is an expression evaluated for its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement<'a> {
    pub units: Vec<Unit<'a>>,
    pub is_define: bool,
}

impl<'a> Statement<'a> {
    pub fn first(&self) -> Option<&Unit<'a>> {
        self.units.first()
    }

    pub fn leads_with(&self, leader: Leader) -> bool {
        self.first().is_some_and(|u| u.leader == leader)
    }
}

fn sigil_of(atom: &Atom) -> Option<Leader> {
    if atom.kind != AtomKind::Symbol {
        return None;
    }
    Leader::from_sigil(&atom.text)
}

fn is_sigil(atom: &Atom) -> bool {
    sigil_of(atom).is_some()
}

/// Rebuild the statements of a root node.
pub fn read_statements(root: &Node) -> Vec<Statement<'_>> {
    let nodes = root.children();
    let (statements, cursor) = reconstruct(root, &nodes, 0);
    trace!(
        statements = statements.len(),
        nodes = nodes.len(),
        cursor,
        "statements reconstructed"
    );
    statements
}

/// Regroup chunks into statements, threading one node cursor through all
/// of them. Returns the statements and the final cursor position.
pub fn reconstruct<'a>(
    root: &Node,
    nodes: &[&'a Node],
    mut cursor: usize,
) -> (Vec<Statement<'a>>, usize) {
    let chunk_atoms: Vec<Vec<&Atom>> = (0..root.chunks.len())
        .map(|i| root.chunk_atoms(i))
        .collect();
    let starts = statement_starts(&chunk_atoms);

    let mut statements = Vec::with_capacity(starts.len());
    for (si, &start) in starts.iter().enumerate() {
        let end = starts.get(si + 1).copied().unwrap_or(chunk_atoms.len());
        let atoms: Vec<&Atom> = chunk_atoms[start..end]
            .iter()
            .flat_map(|c| c.iter().copied())
            .collect();

        // A group no unit claims stays available to the next consumer,
        // even one in a later statement.
        let (stmt, next) = parse_statement(&atoms, nodes, cursor);
        statements.push(stmt);
        cursor = next;
    }

    (statements, cursor)
}

/// Which chunks open a new statement.
fn statement_starts(chunk_atoms: &[Vec<&Atom>]) -> Vec<usize> {
    let mut starts = Vec::new();
    for (ci, atoms) in chunk_atoms.iter().enumerate() {
        if ci == 0 {
            starts.push(ci);
            continue;
        }
        let Some(first) = atoms.first() else {
            continue;
        };
        if first.is_symbol("@") {
            starts.push(ci);
        } else if first.is_symbol("#") {
            let prev_complete = chunk_atoms[ci - 1]
                .last()
                .map_or(true, |last| !is_sigil(last));
            if prev_complete {
                starts.push(ci);
            }
        }
    }
    starts
}

fn parse_statement<'a>(
    atoms: &[&Atom],
    nodes: &[&'a Node],
    mut cursor: usize,
) -> (Statement<'a>, usize) {
    let mut units: Vec<Unit<'a>> = Vec::new();
    let mut is_define = false;
    let mut local_candidate = false;
    let mut i = 0;

    let take_node = |cursor: &mut usize| -> Option<&'a Node> {
        let node = nodes.get(*cursor).copied()?;
        *cursor += 1;
        Some(node)
    };

    if atoms.first().is_some_and(|a| a.is_symbol("@")) {
        match atoms.get(1) {
            Some(next)
                if matches!(
                    sigil_of(next),
                    Some(Leader::GlobalRef | Leader::TypeCall | Leader::LocalRef)
                ) =>
            {
                is_define = true;
                i = 1;
            }
            Some(next) if !is_sigil(next) => {
                // `@name`: a definition only if it ends up owning a group.
                local_candidate = true;
                is_define = true;
            }
            _ => {}
        }
    }

    while i < atoms.len() {
        let atom = atoms[i];
        let Some(leader) = sigil_of(atom) else {
            trace!(atom = %atom.text, "bare atom ignored");
            i += 1;
            continue;
        };

        if leader == Leader::Setter
            && atoms.get(i + 1).is_some_and(|a| a.text == BATCH_OPERAND)
        {
            i += 2;
            units.push(Unit {
                leader,
                operand: Some(BATCH_OPERAND.to_string()),
                child: take_node(&mut cursor),
            });
            continue;
        }

        let operand = match atoms.get(i + 1) {
            Some(next) if !is_sigil(next) => {
                i += 2;
                Some(next.text.clone())
            }
            _ => {
                i += 1;
                None
            }
        };

        let consumes = operand.is_some()
            && match leader {
                Leader::TypeCall | Leader::Setter => true,
                Leader::GlobalRef | Leader::LocalRef => {
                    is_define && units.is_empty() && atoms.get(i).map_or(true, |a| !is_sigil(a))
                }
                Leader::Getter | Leader::Key => false,
            };
        let child = if consumes { take_node(&mut cursor) } else { None };

        units.push(Unit {
            leader,
            operand,
            child,
        });
    }

    if local_candidate && units.first().map_or(true, |u| u.child.is_none()) {
        is_define = false;
    }

    (Statement { units, is_define }, cursor)
}
