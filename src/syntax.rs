//! The tree handed over by the external lexer.
//!
//! The lexer groups characters into atoms, splits runs of atoms into chunks
//! on `;` and on some sigils, and turns every parenthesized group into a
//! nested [`Node`]. Groups stay inline in the chunk they appeared in so that
//! argument parsing can see where they sit; [`Node::children`] exposes them as
//! the ordered list the statement reader consumes.

use indexmap::IndexMap;

/// Lexical category assigned by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
    /// Sigils and other punctuation (`@ # . ! : % * +`).
    Symbol,
    /// Names and bracketed literals.
    Word,
    Number,
}

/// A single token with its adjacency flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub text: String,
    pub kind: AtomKind,
    /// No whitespace between this atom and the previous item.
    pub glued_before: bool,
    /// No whitespace between this atom and the next item.
    pub glued_after: bool,
}

impl Atom {
    pub fn new(text: impl Into<String>, kind: AtomKind) -> Self {
        Atom {
            text: text.into(),
            kind,
            glued_before: false,
            glued_after: false,
        }
    }

    pub fn glued(mut self, before: bool, after: bool) -> Self {
        self.glued_before = before;
        self.glued_after = after;
        self
    }

    pub fn is_symbol(&self, s: &str) -> bool {
        self.kind == AtomKind::Symbol && self.text == s
    }
}

/// One position in a chunk: an atom or a nested group.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Atom(Atom),
    Node(Node),
}

pub type Chunk = Vec<Item>;

/// A parenthesized group (or the document root).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub chunks: Vec<Chunk>,
    pub glued_before: bool,
    pub glued_after: bool,
}

impl Node {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Node {
            chunks,
            glued_before: false,
            glued_after: false,
        }
    }

    /// All items of every chunk, in source order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.chunks.iter().flatten()
    }

    /// The nested groups, in the order the reader consumes them.
    pub fn children(&self) -> Vec<&Node> {
        self.items()
            .filter_map(|item| match item {
                Item::Node(n) => Some(n),
                Item::Atom(_) => None,
            })
            .collect()
    }

    /// The atoms of one chunk, groups skipped.
    pub fn chunk_atoms(&self, index: usize) -> Vec<&Atom> {
        self.chunks
            .get(index)
            .map(|chunk| {
                chunk
                    .iter()
                    .filter_map(|item| match item {
                        Item::Atom(a) => Some(a),
                        Item::Node(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(|c| c.is_empty())
    }
}

/// A parsed source: the root node plus the raw data-block sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed {
    pub root: Node,
    /// Named raw text sections, stored under the `_DATA` local.
    pub data: IndexMap<String, String>,
}

impl From<Node> for Parsed {
    fn from(root: Node) -> Self {
        Parsed {
            root,
            data: IndexMap::new(),
        }
    }
}
