//! `MARKER` lines and region pairing.

use std::collections::BTreeMap;

use crate::feedback::{FeedbackCode, FeedbackCollector};
use crate::model::{Marker, MarkerLine};
use crate::token::tokenize;

/// Parse `MARKER index position name flags [color ...]`.
pub fn parse_marker_line(line: &str, collector: &mut FeedbackCollector) -> Option<MarkerLine> {
    let toks = tokenize(line);
    let (Some(index), Some(pos)) = (
        toks.get(1).and_then(|t| t.as_i64()),
        toks.get(2).and_then(|t| t.as_f64()),
    ) else {
        collector.warning(FeedbackCode::BadNumber, format!("unreadable marker line '{line}'"));
        return None;
    };

    Some(MarkerLine {
        index: index.max(0) as u32,
        pos,
        name: toks.get(3).map(|t| t.text.to_string()).unwrap_or_default(),
        flags: toks.get(4).and_then(|t| t.as_i64()).unwrap_or(0),
        color: toks.get(5).and_then(|t| t.as_i64()).unwrap_or(0),
    })
}

/// Pair region start and end lines into single markers, sorted by position.
///
/// A region line opens a region unless one with the same index is already
/// open. Only a nameless line closes an open region; a named one is a
/// duplicate start and is dropped. Regions still open at the end are dropped.
pub fn pair_markers(lines: Vec<MarkerLine>, collector: &mut FeedbackCollector) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut open: BTreeMap<u32, MarkerLine> = BTreeMap::new();

    for line in lines {
        if !line.is_region() {
            markers.push(Marker {
                index: line.index,
                pos: line.pos,
                is_region: false,
                region_end: line.pos,
                name: line.name,
                color: line.color,
            });
            continue;
        }

        match open.remove(&line.index) {
            Some(start) if line.name.is_empty() => markers.push(Marker {
                index: start.index,
                pos: start.pos,
                is_region: true,
                region_end: line.pos.max(start.pos),
                name: start.name,
                color: start.color,
            }),
            Some(start) => {
                collector.warning(
                    FeedbackCode::RegionDuplicate,
                    format!(
                        "region {} '{}' at {} starts again while '{}' is open, dropped",
                        line.index, line.name, line.pos, start.name
                    ),
                );
                open.insert(start.index, start);
            }
            None => {
                open.insert(line.index, line);
            }
        }
    }

    for (index, start) in open {
        collector.warning(
            FeedbackCode::RegionUnpaired,
            format!("region {index} '{}' has no end, dropped", start.name),
        );
    }

    markers.sort_by(|a, b| a.pos.total_cmp(&b.pos).then(a.index.cmp(&b.index)));
    markers
}
