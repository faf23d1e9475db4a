//! Destination track settings kept across consolidation.

use rpp::token;
use rpp::{Chunk, Node};

use crate::merge::is_envelope;

/// Lane layout fields, taken from the merged content.
const LANE_FIELDS: &[&str] = &["FIXEDLANES", "LANESOLO", "LANEREC", "LANENAME"];

/// A copy of a destination track taken before it is replaced.
///
/// The destination contributes its header, settings lines (name, volume,
/// `GROUP_FLAGS`, routing, `AUXRECV`), FX chain and other setup blocks. The
/// merged content contributes lanes, envelopes and items.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSnapshot {
    chunk: Chunk,
}

impl TrackSnapshot {
    pub fn capture(destination: &Chunk) -> Self {
        Self {
            chunk: destination.clone(),
        }
    }

    /// Build the replacement track from the merged `master`.
    pub fn apply(&self, master: Chunk) -> Chunk {
        let mut result = Chunk::new(self.chunk.header.clone());

        for line in self.chunk.lines() {
            if !is_lane_field(line) {
                result.children.push(Node::Line(line.to_string()));
            }
        }
        for line in master.lines() {
            if is_lane_field(line) {
                result.children.push(Node::Line(line.to_string()));
            }
        }

        let master_envelopes: Vec<&Chunk> = master.blocks().filter(|b| is_envelope(b)).collect();

        for block in self.chunk.blocks() {
            if block.is("ITEM") {
                continue;
            }
            if is_envelope(block) && master_envelopes.iter().any(|m| m.kind() == block.kind()) {
                continue;
            }
            result.children.push(Node::Block(block.clone()));
        }
        for envelope in master_envelopes {
            result.children.push(Node::Block(envelope.clone()));
        }
        for item in master.blocks_of("ITEM") {
            result.children.push(Node::Block(item.clone()));
        }
        result
    }
}

fn is_lane_field(line: &str) -> bool {
    token::field_name(line).is_some_and(|name| LANE_FIELDS.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(text: &str) -> Chunk {
        match rpp::chunk::split(text).0.into_iter().next() {
            Some(Node::Block(b)) => b,
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_destination_settings_survive() {
        let destination = chunk(
            "<TRACK {DEST}
NAME \"Kick\"
VOLPAN 0.5 0 -1 -1 1
GROUP_FLAGS 1 0 0 0
AUXRECV 3 0 1 0 0 0 0 0 0 -1:U 0 -1 ''
LANESOLO 1 0
<FXCHAIN
SHOW 0
>
<PANENV2
PT 0 0.2 0
>
<VOLENV2
PT 0 1 0
>
<ITEM
POSITION 99
>
>",
        );
        let master = chunk(
            "<TRACK {SRC}
NAME \"kick in\"
FIXEDLANES 2 0 0 0 0
LANESOLO 2 0
<VOLENV2
PT 20 0.7 0
>
<ITEM
POSITION 20
>
>",
        );

        let result = TrackSnapshot::capture(&destination).apply(master);
        let expected = "<TRACK {DEST}
  NAME \"Kick\"
  VOLPAN 0.5 0 -1 -1 1
  GROUP_FLAGS 1 0 0 0
  AUXRECV 3 0 1 0 0 0 0 0 0 -1:U 0 -1 ''
  FIXEDLANES 2 0 0 0 0
  LANESOLO 2 0
  <FXCHAIN
    SHOW 0
  >
  <PANENV2
    PT 0 0.2 0
  >
  <VOLENV2
    PT 20 0.7 0
  >
  <ITEM
    POSITION 20
  >
>
";
        assert_eq!(result.render(), expected);
    }
}
