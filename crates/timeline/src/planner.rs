//! Offsets of queued sessions on the merged timeline.
//!
//! Sessions are laid back to back in queue order with `gap` empty measures
//! between them. Every call recomputes every session from scratch.

use rpp::{Session, SessionOffsets};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tempo::{ceil_measures, session_length};

/// Default number of empty measures between sessions.
pub const DEFAULT_GAP_MEASURES: u32 = 2;

/// Running position on the merged timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub measure: u64,
    pub time: f64,
    pub qn: f64,
}

/// Assign offsets to every session; returns the position after the last one.
pub fn plan_offsets(sessions: &mut [Session], gap: u32) -> Cursor {
    let mut cursor = Cursor::default();
    let gap = gap as u64;

    for session in sessions.iter_mut() {
        let spm = session.base_tempo.seconds_per_measure();
        let qnpm = session.base_tempo.qn_per_measure();
        let length = session_length(&session.tempo_map, &session.base_tempo, session.duration);

        // An empty session still takes one measure
        let rounded = ceil_measures(session.duration / spm).max(1);
        let measure_length = length.measures.max(1);

        session.offsets = SessionOffsets {
            measure: cursor.measure,
            time: cursor.time,
            qn: cursor.qn,
            measure_length,
            qn_length: length.quarter_notes,
        };
        debug!(
            session = %session.display_name(),
            measure = cursor.measure,
            time = cursor.time,
            measure_length,
            "planned session offset"
        );

        // Rounding tolerates float noise; the next session must still start
        // after this one's content ends
        cursor.time += (rounded as f64 * spm).max(session.duration) + gap as f64 * spm;
        cursor.measure += measure_length + gap;
        cursor.qn += (rounded + gap) as f64 * qnpm;
    }

    cursor
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rpp::{BaseTempo, TempoPoint, TempoShape};

    fn session(name: &str, base: BaseTempo, duration: f64) -> Session {
        Session {
            path: format!("/takes/{name}.rpp").into(),
            base_tempo: base,
            tempo_map: vec![TempoPoint {
                time: 0.0,
                bpm: base.bpm,
                shape: TempoShape::Square,
                time_sig: Some(base.time_sig()),
            }],
            markers: Vec::new(),
            tracks: Vec::new(),
            pools: Default::default(),
            duration,
            offsets: SessionOffsets::default(),
        }
    }

    #[test]
    fn two_eight_measure_sessions_with_gap() {
        let mut sessions = vec![
            session("a", BaseTempo::default(), 16.0),
            session("b", BaseTempo::default(), 16.0),
        ];
        let end = plan_offsets(&mut sessions, 2);

        assert_eq!(sessions[0].offsets.measure, 0);
        assert_eq!(sessions[0].offsets.time, 0.0);
        assert_eq!(sessions[1].offsets.measure, 10);
        assert_eq!(sessions[1].offsets.time, 20.0);
        assert_eq!(sessions[1].offsets.qn, 40.0);
        assert_eq!(sessions[1].offsets.measure_length, 8);
        assert_eq!(end, Cursor { measure: 20, time: 40.0, qn: 80.0 });
    }

    #[test]
    fn partial_measure_is_rounded_up_before_gap() {
        let mut sessions = vec![
            session("a", BaseTempo::default(), 15.0),
            session("b", BaseTempo::default(), 4.0),
        ];
        plan_offsets(&mut sessions, 0);
        assert_eq!(sessions[1].offsets.time, 16.0);
        assert_eq!(sessions[1].offsets.measure, 8);
    }

    #[test]
    fn each_session_uses_its_own_meter() {
        let waltz = BaseTempo { bpm: 90.0, num: 3, denom: 4 };
        let mut sessions = vec![
            session("waltz", waltz, 10.0),
            session("four", BaseTempo::default(), 8.0),
        ];
        plan_offsets(&mut sessions, 1);

        // 10s at 2s per measure is 5 measures, plus one gap measure
        assert_eq!(sessions[1].offsets.measure, 6);
        assert_eq!(sessions[1].offsets.time, 12.0);
        assert_eq!(sessions[1].offsets.qn, 18.0);
    }

    #[test]
    fn offsets_strictly_increase_without_gap() {
        let mut sessions = vec![
            session("empty", BaseTempo::default(), 0.0),
            session("short", BaseTempo::default(), 0.5),
            session("long", BaseTempo::default(), 30.0),
            session("last", BaseTempo::default(), 1.0),
        ];
        plan_offsets(&mut sessions, 0);
        for pair in sessions.windows(2) {
            assert!(pair[1].offsets.measure > pair[0].offsets.measure);
            assert!(pair[1].offsets.time > pair[0].offsets.time);
        }
    }

    #[test]
    fn next_session_starts_after_previous_content() {
        let waltz = BaseTempo { bpm: 90.0, num: 3, denom: 4 };
        let slow = BaseTempo { bpm: 73.0, num: 7, denom: 8 };
        let queues = [
            vec![
                session("a", BaseTempo::default(), 16.000000001),
                session("b", BaseTempo::default(), 4.0),
            ],
            vec![
                session("a", waltz, 10.0000000004),
                session("b", slow, 3.3),
                session("c", BaseTempo::default(), 0.0),
                session("d", waltz, 7.25),
            ],
            vec![
                session("a", slow, 2.876712328767123),
                session("b", BaseTempo::default(), 2.0000000001),
                session("c", waltz, 1.0),
            ],
        ];

        for queue in queues {
            for gap in [0, 1, 2, 5] {
                let mut sessions = queue.clone();
                plan_offsets(&mut sessions, gap);
                for pair in sessions.windows(2) {
                    let (prev, next) = (&pair[0], &pair[1]);
                    assert!(
                        next.offsets.time >= prev.offsets.time + prev.duration,
                        "gap {gap}: {} starts at {} before {} ends at {}",
                        next.display_name(),
                        next.offsets.time,
                        prev.display_name(),
                        prev.offsets.time + prev.duration
                    );
                    assert!(next.offsets.measure > prev.offsets.measure);
                }
            }
        }
    }

    #[test]
    fn replanning_after_reorder_recomputes_everything() {
        let mut sessions = vec![
            session("a", BaseTempo::default(), 16.0),
            session("b", BaseTempo::default(), 8.0),
        ];
        plan_offsets(&mut sessions, 2);
        sessions.swap(0, 1);
        plan_offsets(&mut sessions, 2);

        assert_eq!(sessions[0].offsets.measure, 0);
        assert_eq!(sessions[1].offsets.measure, 6);
        assert_eq!(sessions[1].offsets.time, 12.0);
    }

    #[test]
    fn empty_queue_is_a_no_op() {
        assert_eq!(plan_offsets(&mut [], 2), Cursor::default());
    }
}
