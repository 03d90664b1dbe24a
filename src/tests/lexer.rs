//! A small character lexer so tests can be written as notation text.
//!
//! It produces the tree shape the evaluator expects from the real lexer:
//! `;` ends a chunk, `@ # % :` start a new chunk unless glued to a sigil
//! right before them, and every parenthesized group becomes a nested node
//! that stays inline in its chunk.

use crate::syntax::{Atom, AtomKind, Chunk, Item, Node, Parsed};
use indexmap::IndexMap;

const DATA_MARKER: &str = "====data====";
const SECTION_PREFIX: &str = "---- @";

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

/// Lex a whole source, including an optional trailing data block.
pub fn lex(source: &str) -> Parsed {
    let (code, data) = split_data_block(source);
    let mut lexer = Lexer { input: code, pos: 0 };
    let chunks = lexer.group();
    Parsed {
        root: Node::new(chunks),
        data,
    }
}

fn split_data_block(source: &str) -> (&str, IndexMap<String, String>) {
    let mut data = IndexMap::new();
    let Some(at) = source.find(DATA_MARKER) else {
        return (source, data);
    };

    let mut current: Option<(String, Vec<&str>)> = None;
    for line in source[at + DATA_MARKER.len()..].lines() {
        if let Some(name) = line.strip_prefix(SECTION_PREFIX) {
            if let Some((name, lines)) = current.take() {
                data.insert(name, lines.join("\n").trim().to_string());
            }
            current = Some((name.trim().to_string(), Vec::new()));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some((name, lines)) = current {
        data.insert(name, lines.join("\n").trim().to_string());
    }

    (&source[..at], data)
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-'
}

fn is_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let frac_ok = parts
        .next()
        .map_or(true, |f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()));
    !whole.is_empty() && whole.chars().all(|c| c.is_ascii_digit()) && frac_ok
}

impl<'a> Lexer<'a> {
    // ── Helpers ──────────────────────────────────────────────────────

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.advance(ch.len_utf8());
        }
    }

    fn glued_before(&self, start: usize) -> bool {
        self.input[..start]
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_whitespace() && c != '(' && c != ';')
    }

    fn glued_after(&self, end: usize) -> bool {
        self.input[end..]
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace() && c != ')' && c != ';')
    }

    fn atom(&self, start: usize, kind: AtomKind) -> Item {
        let text = &self.input[start..self.pos];
        Item::Atom(
            Atom::new(text, kind).glued(self.glued_before(start), self.glued_after(self.pos)),
        )
    }

    // ── Groups ───────────────────────────────────────────────────────

    /// Read chunks up to the closing `)` or the end of input.
    fn group(&mut self) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut chunk: Chunk = Vec::new();

        loop {
            self.skip_ws();
            let Some(ch) = self.peek_char() else {
                break;
            };
            let start = self.pos;

            match ch {
                ')' => {
                    self.advance(1);
                    break;
                }
                ';' => {
                    self.advance(1);
                    if !chunk.is_empty() {
                        chunks.push(std::mem::take(&mut chunk));
                    }
                }
                '(' => {
                    self.advance(1);
                    let inner = self.group();
                    let mut node = Node::new(inner);
                    node.glued_before = self.glued_before(start);
                    node.glued_after = self.glued_after(self.pos);
                    chunk.push(Item::Node(node));
                }
                '@' | '#' | '%' | ':' => {
                    let after_glued_sigil = matches!(
                        chunk.last(),
                        Some(Item::Atom(prev)) if prev.kind == AtomKind::Symbol && prev.glued_after
                    );
                    if !chunk.is_empty() && !after_glued_sigil {
                        chunks.push(std::mem::take(&mut chunk));
                    }
                    self.advance(1);
                    chunk.push(self.atom(start, AtomKind::Symbol));
                }
                '[' => {
                    self.bracket_literal();
                    chunk.push(self.atom(start, AtomKind::Word));
                }
                '-' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                    self.advance(1);
                    let item = self.word(start, &chunk);
                    chunk.push(item);
                }
                c if is_word_char(c) => {
                    let item = self.word(start, &chunk);
                    chunk.push(item);
                }
                c => {
                    self.advance(c.len_utf8());
                    chunk.push(self.atom(start, AtomKind::Symbol));
                }
            }
        }

        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        chunks
    }

    /// A name or number. Numbers take a `.digits` fraction unless they are
    /// themselves a getter accessor (`#list.2`).
    fn word(&mut self, start: usize, chunk: &Chunk) -> Item {
        while let Some(ch) = self.peek_char() {
            if !is_word_char(ch) {
                break;
            }
            self.advance(ch.len_utf8());
        }

        let after_getter = matches!(
            chunk.last(),
            Some(Item::Atom(prev)) if prev.is_symbol(".") && prev.glued_after
        );
        if !after_getter
            && is_number(&self.input[start..self.pos])
            && self.peek_char() == Some('.')
            && self.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            self.advance(1);
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance(1);
            }
        }

        let kind = if is_number(&self.input[start..self.pos]) {
            AtomKind::Number
        } else {
            AtomKind::Word
        };
        self.atom(start, kind)
    }

    /// `[...]` with `\]` escapes, brackets kept.
    fn bracket_literal(&mut self) {
        self.advance(1);
        while let Some(ch) = self.peek_char() {
            if ch == '\\' && self.peek_second() == Some(']') {
                self.advance(2);
                continue;
            }
            self.advance(ch.len_utf8());
            if ch == ']' {
                break;
            }
        }
    }
}
