//! Fixed-lane alignment across imports merged onto one destination.
//!
//! Each imported track plays one lane (the highest bit of its `LANESOLO`
//! mask, lane 0 when absent). Before the imports are merged, every track
//! playing a lower lane gets its playing items copied onto the highest lane
//! in use, so the merged track plays all of them from one lane.

use rpp::token::{tokenize, Token};
use rpp::{fresh_guid, Chunk, Node};
use tracing::debug;

/// Lane a track plays.
pub fn active_lane(track: &Chunk) -> u32 {
    track
        .field("LANESOLO")
        .and_then(|args| args.first().and_then(Token::as_i64))
        .filter(|mask| *mask > 0)
        .map(|mask| 63 - (mask as u64).leading_zeros())
        .unwrap_or(0)
}

fn item_lane(item: &Chunk) -> u32 {
    item.field_i64("FIXEDLANE")
        .map(|lane| lane.max(0) as u32)
        .unwrap_or(0)
}

/// Align all tracks to the highest active lane among them.
///
/// Returns the lane everything now plays.
pub fn align_lanes(tracks: &mut [Chunk]) -> u32 {
    let target = tracks.iter().map(active_lane).max().unwrap_or(0);
    if target == 0 {
        return 0;
    }

    for track in tracks.iter_mut() {
        let lane = active_lane(track);
        if lane < target {
            let copies: Vec<Chunk> = track
                .blocks_of("ITEM")
                .filter(|item| item_lane(item) == lane)
                .map(|item| copy_to_lane(item, target))
                .collect();
            debug!(from = lane, to = target, items = copies.len(), "duplicated items onto lane");
            track.children.extend(copies.into_iter().map(Node::Block));
        }
        set_lane_count(track, target + 1);
        set_active_lane(track, target);
    }
    target
}

fn copy_to_lane(item: &Chunk, lane: u32) -> Chunk {
    let mut copy = item.clone();
    copy.set_field("FIXEDLANE", &lane.to_string());
    for name in ["IGUID", "GUID"] {
        if copy.field_line(name).is_some() {
            copy.set_field(name, &fresh_guid());
        }
    }
    copy
}

/// Replace the first `LANESOLO` argument, keeping any others.
fn set_active_lane(track: &mut Chunk, lane: u32) {
    let mask = (1u64 << lane).to_string();
    let rest = rest_args(track, "LANESOLO");
    track.set_field("LANESOLO", &join_args(mask, rest));
}

/// Raise `FIXEDLANES` to at least `count`.
fn set_lane_count(track: &mut Chunk, count: u32) {
    let current = track.field_i64("FIXEDLANES").unwrap_or(0);
    if current >= i64::from(count) {
        return;
    }
    let rest = match rest_args(track, "FIXEDLANES") {
        rest if rest.is_empty() => vec!["0".to_string(); 4],
        rest => rest,
    };
    track.set_field("FIXEDLANES", &join_args(count.to_string(), rest));
}

fn rest_args(track: &Chunk, name: &str) -> Vec<String> {
    track
        .field_line(name)
        .map(|line| tokenize(line).iter().skip(2).map(Token::render).collect())
        .unwrap_or_default()
}

fn join_args(first: String, rest: Vec<String>) -> String {
    std::iter::once(first).chain(rest).collect::<Vec<_>>().join(" ")
}
