//! Tempo map and markers of the merged project.

use rpp::{Marker, Session, TempoPoint, TempoShape};

/// Concatenate the tempo maps of planned sessions.
///
/// Points move by each session's time offset. The first point of every
/// session carries that session's signature so the meter is restored where
/// the session starts, and the last point of every session steps so no ramp
/// runs across a session boundary.
pub fn merged_tempo_map(sessions: &[Session]) -> Vec<TempoPoint> {
    let mut merged: Vec<TempoPoint> = Vec::new();

    for session in sessions {
        let offset = session.offsets.time;
        let start = merged.len();
        merged.extend(session.tempo_map.iter().map(|p| TempoPoint {
            time: p.time + offset,
            ..*p
        }));

        if let Some(first) = merged.get_mut(start) {
            first.time_sig.get_or_insert(session.base_tempo.time_sig());
        }
        if let Some(last) = merged.last_mut() {
            last.shape = TempoShape::Square;
        }
    }

    merged
}

/// How merged marker names are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkerNaming {
    #[default]
    Keep,
    /// `"<session>: <name>"`
    SessionPrefix,
}

/// Markers and regions of all sessions, shifted and renumbered.
///
/// Markers and regions are numbered in two separate sequences starting at 1.
pub fn merged_markers(sessions: &[Session], naming: MarkerNaming) -> Vec<Marker> {
    let mut next_marker = 1;
    let mut next_region = 1;
    let mut merged = Vec::new();

    for session in sessions {
        let offset = session.offsets.time;
        let label = session.display_name();
        for m in &session.markers {
            let index = if m.is_region {
                next_region += 1;
                next_region - 1
            } else {
                next_marker += 1;
                next_marker - 1
            };
            let name = match naming {
                MarkerNaming::Keep => m.name.clone(),
                MarkerNaming::SessionPrefix if m.name.is_empty() => label.clone(),
                MarkerNaming::SessionPrefix => format!("{label}: {}", m.name),
            };
            merged.push(Marker {
                index,
                pos: m.pos + offset,
                is_region: m.is_region,
                region_end: m.region_end + offset,
                name,
                color: m.color,
            });
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::plan_offsets;
    use pretty_assertions::assert_eq;
    use rpp::{BaseTempo, SessionOffsets, TimeSignature};

    fn session(name: &str, base: BaseTempo, map: Vec<TempoPoint>, markers: Vec<Marker>) -> Session {
        Session {
            path: format!("{name}.rpp").into(),
            base_tempo: base,
            tempo_map: map,
            markers,
            tracks: Vec::new(),
            pools: Default::default(),
            duration: 16.0,
            offsets: SessionOffsets::default(),
        }
    }

    fn marker(index: u32, pos: f64, region_end: Option<f64>, name: &str) -> Marker {
        Marker {
            index,
            pos,
            is_region: region_end.is_some(),
            region_end: region_end.unwrap_or(pos),
            name: name.into(),
            color: 0,
        }
    }

    #[test]
    fn tempo_points_shift_and_restore_meter() {
        let ramp = vec![
            TempoPoint { time: 0.0, bpm: 120.0, shape: TempoShape::Linear, time_sig: None },
            TempoPoint { time: 8.0, bpm: 140.0, shape: TempoShape::Linear, time_sig: None },
        ];
        let waltz = BaseTempo { bpm: 120.0, num: 3, denom: 4 };
        let flat = vec![TempoPoint { time: 0.0, bpm: 120.0, shape: TempoShape::Square, time_sig: None }];

        let mut sessions = vec![
            session("a", BaseTempo::default(), ramp, vec![]),
            session("b", waltz, flat, vec![]),
        ];
        plan_offsets(&mut sessions, 2);
        let map = merged_tempo_map(&sessions);

        let summary: Vec<_> = map.iter().map(|p| (p.time, p.shape, p.time_sig)).collect();
        assert_eq!(
            summary,
            vec![
                (0.0, TempoShape::Linear, Some(TimeSignature { num: 4, denom: 4 })),
                (8.0, TempoShape::Square, None),
                (20.0, TempoShape::Square, Some(TimeSignature { num: 3, denom: 4 })),
            ]
        );
    }

    #[test]
    fn markers_renumbered_per_kind() {
        let mut sessions = vec![
            session("a", BaseTempo::default(), vec![], vec![
                marker(5, 0.0, None, "Count"),
                marker(5, 2.0, Some(10.0), "Verse"),
            ]),
            session("b", BaseTempo::default(), vec![], vec![
                marker(1, 1.0, None, ""),
                marker(3, 4.0, Some(6.0), "Chorus"),
            ]),
        ];
        plan_offsets(&mut sessions, 2);

        let merged = merged_markers(&sessions, MarkerNaming::Keep);
        let summary: Vec<_> = merged
            .iter()
            .map(|m| (m.index, m.is_region, m.pos, m.region_end, m.name.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, false, 0.0, 0.0, "Count"),
                (1, true, 2.0, 10.0, "Verse"),
                (2, false, 21.0, 21.0, ""),
                (2, true, 24.0, 26.0, "Chorus"),
            ]
        );

        let prefixed = merged_markers(&sessions, MarkerNaming::SessionPrefix);
        assert_eq!(prefixed[1].name, "a: Verse");
        assert_eq!(prefixed[2].name, "b");
    }
}
