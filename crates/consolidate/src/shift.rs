//! Moving imported track content along the timeline.

use rpp::token::{self, rewrite_number};
use rpp::{Chunk, Node};

/// Shift a track's positions by `offset` seconds.
///
/// Moves item `POSITION`s, track and FX envelope `PT` points and
/// `POOLEDENVINST` positions. Everything inside an item (take envelopes,
/// source sections) is item-relative and stays put. Must run before pooled
/// envelope payloads are attached, whose points are instance-relative.
pub fn shift_track(track: &mut Chunk, offset: f64) {
    if offset == 0.0 {
        return;
    }
    for node in track.children.iter_mut() {
        if let Node::Block(block) = node {
            if block.is("ITEM") {
                shift_item(block, offset);
            } else {
                shift_envelopes(block, offset);
            }
        }
    }
}

fn shift_item(item: &mut Chunk, offset: f64) {
    for node in item.children.iter_mut() {
        if let Node::Line(line) = node {
            if token::field_name(line) == Some("POSITION") {
                if let Some(moved) = rewrite_number(line, 1, |v| v + offset) {
                    *line = moved;
                }
            }
        }
    }
}

fn shift_envelopes(block: &mut Chunk, offset: f64) {
    for node in block.children.iter_mut() {
        match node {
            Node::Block(inner) => shift_envelopes(inner, offset),
            Node::Line(line) => {
                let index = match token::field_name(line) {
                    Some("PT") => 1,
                    Some("POOLEDENVINST") => 2,
                    _ => continue,
                };
                if let Some(moved) = rewrite_number(line, index, |v| v + offset) {
                    *line = moved;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TRACK: &str = "<TRACK
NAME Kick
<VOLENV2
PT 0 1 0
PT 2.5 0.5 0
POOLEDENVINST 3 4 2 0 1
>
<FXCHAIN
<PARMENV 1 0 1 0.5
PT 1 0.2 0
>
>
<ITEM
POSITION 1.5
LENGTH 4
SNAPOFFS 0
<VOLENV
PT 0.5 1 0
>
>
>";

    fn track() -> Chunk {
        match rpp::chunk::split(TRACK).0.into_iter().next() {
            Some(Node::Block(b)) => b,
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_shift_moves_items_and_track_envelopes() {
        let mut t = track();
        shift_track(&mut t, 20.0);
        let rendered = t.render();

        assert!(rendered.contains("PT 20 1 0\n"));
        assert!(rendered.contains("PT 22.5 0.5 0\n"));
        assert!(rendered.contains("POOLEDENVINST 3 24 2 0 1\n"));
        assert!(rendered.contains("PT 21 0.2 0\n"));
        assert!(rendered.contains("POSITION 21.5\n"));
        assert!(rendered.contains("LENGTH 4\n"));
    }

    #[test]
    fn test_take_envelopes_untouched() {
        let mut t = track();
        shift_track(&mut t, 20.0);
        let item = t.blocks_of("ITEM").next().unwrap();
        let take_env = item.blocks_of("VOLENV").next().unwrap();
        assert_eq!(take_env.field_line("PT"), Some("PT 0.5 1 0"));
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let mut t = track();
        shift_track(&mut t, 0.0);
        assert_eq!(t, track());
    }
}
