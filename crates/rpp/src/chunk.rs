//! Chunk tree: the nested block structure of project text.
//!
//! A block opens with a line starting with `<` and closes with a line that is
//! exactly `>`. Everything else is a plain line belonging to the innermost
//! open block. Lines are stored trimmed and re-indented on render.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::feedback::{Feedback, FeedbackCode};
use crate::token::{self, Token};

/// A child of a chunk: either a plain line or a nested chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Line(String),
    Block(Chunk),
}

/// A `<KIND args ... >` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Opening line without the leading `<`, e.g. `TRACK {GUID}`.
    pub header: String,
    pub children: Vec<Node>,
}

impl Chunk {
    pub fn new(header: impl Into<String>) -> Self {
        Chunk {
            header: header.into(),
            children: Vec::new(),
        }
    }

    /// Block type keyword (`TRACK`, `ITEM`, `VOLENV2`, ...).
    pub fn kind(&self) -> &str {
        token::field_name(&self.header).unwrap_or("")
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind() == kind
    }

    /// Direct child lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|n| match n {
            Node::Line(l) => Some(l.as_str()),
            Node::Block(_) => None,
        })
    }

    /// Direct child blocks.
    pub fn blocks(&self) -> impl Iterator<Item = &Chunk> {
        self.children.iter().filter_map(|n| match n {
            Node::Block(b) => Some(b),
            Node::Line(_) => None,
        })
    }

    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Block(b) => Some(b),
            Node::Line(_) => None,
        })
    }

    /// Direct child blocks of one kind.
    pub fn blocks_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Chunk> + 'a {
        self.blocks().filter(move |b| b.is(kind))
    }

    /// First direct child line for `name`, whole line.
    pub fn field_line(&self, name: &str) -> Option<&str> {
        self.lines()
            .find(|l| token::field_name(l) == Some(name))
    }

    /// Tokens of the first direct child line for `name`, field name excluded.
    pub fn field(&self, name: &str) -> Option<Vec<Token<'_>>> {
        self.field_line(name)
            .map(|l| token::tokenize(l).into_iter().skip(1).collect())
    }

    /// First numeric argument of field `name`.
    pub fn field_f64(&self, name: &str) -> Option<f64> {
        self.field(name)?.first()?.as_f64()
    }

    pub fn field_i64(&self, name: &str) -> Option<i64> {
        self.field(name)?.first()?.as_i64()
    }

    /// Replace the first line of field `name`, or append one.
    pub fn set_field(&mut self, name: &str, args: &str) {
        let line = if args.is_empty() {
            name.to_string()
        } else {
            format!("{name} {args}")
        };
        for node in self.children.iter_mut() {
            if let Node::Line(l) = node {
                if token::field_name(l) == Some(name) {
                    *l = line;
                    return;
                }
            }
        }
        self.insert_line_before_blocks(line);
    }

    /// Insert a line after the last leading plain line, before nested blocks.
    pub fn insert_line_before_blocks(&mut self, line: String) {
        let at = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Block(_)))
            .unwrap_or(self.children.len());
        self.children.insert(at, Node::Line(line));
    }

    /// Remove every direct child line for `name`; returns how many went.
    pub fn remove_fields(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, Node::Line(l) if token::field_name(l) == Some(name)));
        before - self.children.len()
    }

    /// Remove direct child blocks matching `pred`, returning them in order.
    pub fn take_blocks(&mut self, mut pred: impl FnMut(&Chunk) -> bool) -> Vec<Chunk> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.children.len());
        for node in std::mem::take(&mut self.children) {
            match node {
                Node::Block(b) if pred(&b) => taken.push(b),
                other => kept.push(other),
            }
        }
        self.children = kept;
        taken
    }

    /// Visit every line in this chunk and all nested chunks.
    pub fn walk_lines(&self, f: &mut impl FnMut(&str)) {
        for node in &self.children {
            match node {
                Node::Line(l) => f(l),
                Node::Block(b) => b.walk_lines(f),
            }
        }
    }

    /// Render with two-space indentation starting at `depth`.
    pub fn render_into(&self, out: &mut String, depth: usize) {
        indent(out, depth);
        out.push('<');
        out.push_str(&self.header);
        out.push('\n');
        for node in &self.children {
            match node {
                Node::Line(l) => {
                    indent(out, depth + 1);
                    out.push_str(l);
                    out.push('\n');
                }
                Node::Block(b) => b.render_into(out, depth + 1),
            }
        }
        indent(out, depth);
        out.push_str(">\n");
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }
}

/// Braced uppercase GUID as written in project files.
pub fn fresh_guid() -> String {
    format!("{{{}}}", Uuid::new_v4().to_string().to_uppercase())
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Split raw text into top-level nodes.
///
/// Depth is tracked per open line; a block is complete only when the `>`
/// that balances its own open line is reached. A block still open at end of
/// text is dropped with a `BlockUnterminated` error, except a
/// `REAPER_PROJECT` root, whose completed children are kept.
pub fn split(text: &str) -> (Vec<Node>, Vec<Feedback>) {
    let mut top: Vec<Node> = Vec::new();
    let mut stack: Vec<(Chunk, usize)> = Vec::new();
    let mut feedback = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(header) = trimmed.strip_prefix('<') {
            stack.push((Chunk::new(header.trim()), line_no));
        } else if trimmed == ">" {
            match stack.pop() {
                Some((done, _)) => match stack.last_mut() {
                    Some((parent, _)) => parent.children.push(Node::Block(done)),
                    None => top.push(Node::Block(done)),
                },
                None => feedback.push(Feedback::warning(
                    FeedbackCode::StrayClose,
                    "closing '>' without an open block",
                    line_no,
                )),
            }
        } else {
            match stack.last_mut() {
                Some((parent, _)) => parent.children.push(Node::Line(trimmed.to_string())),
                None => top.push(Node::Line(trimmed.to_string())),
            }
        }
    }

    // Unwind whatever is still open, innermost first
    while let Some((open, line_no)) = stack.pop() {
        let is_root = stack.is_empty() && open.is("REAPER_PROJECT");
        if is_root {
            feedback.push(Feedback::warning(
                FeedbackCode::BlockUnterminated,
                "project block is not closed, keeping its complete children",
                line_no,
            ));
            top.push(Node::Block(open));
        } else {
            feedback.push(Feedback::error(
                FeedbackCode::BlockUnterminated,
                format!("<{} is never closed, block skipped", open.kind()),
                line_no,
            ));
        }
    }

    (top, feedback)
}
