//! Track and pooled-envelope blocks.

use std::collections::BTreeSet;

use crate::chunk::Chunk;
use crate::feedback::{FeedbackCode, FeedbackCollector};
use crate::model::{PooledEnvelope, SourceTrack, UNNAMED_TRACK};
use crate::token::{self, tokenize};

/// Read a `<TRACK` block.
pub fn read_track(chunk: Chunk) -> SourceTrack {
    let name = track_name(&chunk);
    let item_count = chunk.blocks_of("ITEM").count();
    let content_end = chunk
        .blocks_of("ITEM")
        .map(item_end)
        .fold(0.0, f64::max);
    let is_folder = chunk
        .field("ISBUS")
        .and_then(|args| args.first().and_then(|t| t.as_i64()))
        == Some(1);

    let mut uses_pools = BTreeSet::new();
    chunk.walk_lines(&mut |line| {
        if token::field_name(line) == Some("POOLEDENVINST") {
            if let Some(id) = tokenize(line).get(1).and_then(|t| t.as_i64()) {
                uses_pools.insert(id as u32);
            }
        }
    });

    SourceTrack {
        name,
        chunk,
        has_media: item_count > 0,
        is_folder,
        item_count,
        content_end,
        uses_pools,
    }
}

/// Name of a track block.
///
/// The first direct `NAME` line wins. A quoted value is taken verbatim,
/// otherwise the rest of the line trimmed.
pub fn track_name(chunk: &Chunk) -> String {
    let Some(line) = chunk.field_line("NAME") else {
        return UNNAMED_TRACK.to_string();
    };
    let toks = tokenize(line);
    let name = match toks.get(1) {
        Some(t) if t.is_quoted() => t.text.to_string(),
        _ => line.trim_start()["NAME".len()..].trim().to_string(),
    };
    if name.is_empty() {
        UNNAMED_TRACK.to_string()
    } else {
        name
    }
}

/// End of an `<ITEM` block: `POSITION + LENGTH`.
pub fn item_end(item: &Chunk) -> f64 {
    item.field_f64("POSITION").unwrap_or(0.0) + item.field_f64("LENGTH").unwrap_or(0.0)
}

/// Read a `<POOLEDENV` block; it needs an `ID` line.
pub fn read_pooled_envelope(chunk: Chunk, collector: &mut FeedbackCollector) -> Option<PooledEnvelope> {
    match chunk.field_i64("ID") {
        Some(id) if id >= 0 => Some(PooledEnvelope {
            pool_id: id as u32,
            chunk,
        }),
        _ => {
            collector.warning(FeedbackCode::BadNumber, "pooled envelope without an ID, skipped");
            None
        }
    }
}
