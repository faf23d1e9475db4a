//! Folding several imported tracks into one.

use rpp::token::{self, tokenize};
use rpp::{Chunk, Node};

/// Track-level automation blocks: `VOLENV2`, `PANENV2`, `MUTEENV`, ...
pub fn is_envelope(block: &Chunk) -> bool {
    let kind = block.kind();
    kind.contains("ENV") && kind != "POOLEDENV"
}

/// Merge `imports` into the first one.
///
/// Items of the other tracks are moved over. Their envelope points are
/// copied into the master's envelope of the same kind, or the whole envelope
/// is added when the master has none. Anything else on the other tracks is
/// dropped along with them.
pub fn merge_imports(imports: Vec<Chunk>) -> Option<Chunk> {
    let mut imports = imports.into_iter();
    let mut master = imports.next()?;

    for mut extra in imports {
        for block in extra.take_blocks(|_| true) {
            if block.is("ITEM") {
                master.children.push(Node::Block(block));
            } else if is_envelope(&block) {
                merge_envelope(&mut master, block);
            }
        }
    }
    Some(master)
}

fn merge_envelope(master: &mut Chunk, envelope: Chunk) {
    let Some(target) = master
        .blocks_mut()
        .find(|b| b.kind() == envelope.kind())
    else {
        let at = master
            .children
            .iter()
            .position(|n| matches!(n, Node::Block(b) if b.is("ITEM")))
            .unwrap_or(master.children.len());
        master.children.insert(at, Node::Block(envelope));
        return;
    };

    for line in envelope.lines() {
        if matches!(token::field_name(line), Some("PT") | Some("POOLEDENVINST")) {
            let at = last_point_slot(target);
            target.children.insert(at, Node::Line(line.to_string()));
        }
    }
    sort_points(target);
}

/// Slot right after the last point line, or before the first block.
fn last_point_slot(envelope: &Chunk) -> usize {
    envelope
        .children
        .iter()
        .rposition(|n| {
            matches!(n, Node::Line(l)
                if matches!(token::field_name(l), Some("PT") | Some("POOLEDENVINST")))
        })
        .map(|i| i + 1)
        .unwrap_or_else(|| {
            envelope
                .children
                .iter()
                .position(|n| matches!(n, Node::Block(_)))
                .unwrap_or(envelope.children.len())
        })
}

/// Reorder `PT` lines by position within the slots they already occupy.
fn sort_points(envelope: &mut Chunk) {
    let slots: Vec<usize> = envelope
        .children
        .iter()
        .enumerate()
        .filter(|(_, n)| matches!(n, Node::Line(l) if token::field_name(l) == Some("PT")))
        .map(|(i, _)| i)
        .collect();

    let mut points: Vec<(f64, String)> = slots
        .iter()
        .filter_map(|&i| match &envelope.children[i] {
            Node::Line(l) => Some((point_time(l), l.clone())),
            Node::Block(_) => None,
        })
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (slot, (_, line)) in slots.into_iter().zip(points) {
        envelope.children[slot] = Node::Line(line);
    }
}

fn point_time(line: &str) -> f64 {
    tokenize(line)
        .get(1)
        .and_then(|t| t.as_f64())
        .unwrap_or(0.0)
}
