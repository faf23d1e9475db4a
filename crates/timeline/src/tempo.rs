use rpp::{BaseTempo, TempoPoint, TempoShape, TimeSignature};
use serde::{Deserialize, Serialize};

/// Slack for float noise when rounding measure counts up.
const EPSILON: f64 = 1e-9;

/// Length of a session in musical time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionLength {
    /// Whole measures, rounded up.
    pub measures: u64,
    /// Exact quarter notes up to the content end.
    pub quarter_notes: f64,
}

/// Round a measure count up, ignoring float noise just above an integer.
pub fn ceil_measures(value: f64) -> u64 {
    if value <= EPSILON {
        return 0;
    }
    (value - EPSILON).ceil() as u64
}

/// Quarter notes covered by `dt` seconds from the start of a segment that
/// ramps from `bpm` to `next_bpm` over `span` seconds.
///
/// Ramps are linear in quarter notes, so tempo grows exponentially in time
/// and a ramp cut short ends at an interpolated tempo.
fn ramp_qn(bpm: f64, next_bpm: f64, span: f64, dt: f64) -> f64 {
    let ratio = (next_bpm / bpm).ln();
    if span <= 0.0 || ratio.abs() < EPSILON {
        return dt * bpm / 60.0;
    }
    let end_bpm = bpm * (next_bpm / bpm).powf(dt / span);
    span * (end_bpm - bpm) / (60.0 * ratio)
}

/// Quarter notes in `[point.time, point.time + dt)`.
fn segment_qn(point: &TempoPoint, next: Option<&TempoPoint>, dt: f64) -> f64 {
    match next {
        Some(next) if point.shape == TempoShape::Linear && next.bpm != point.bpm => {
            ramp_qn(point.bpm, next.bpm, next.time - point.time, dt)
        }
        _ => dt * point.bpm / 60.0,
    }
}

/// Walk the tempo map up to `end` seconds and accumulate quarter notes and
/// (fractional) measures under the signature in force per segment.
fn integrate(map: &[TempoPoint], base: &BaseTempo, end: f64) -> (f64, f64) {
    let mut sig = base.time_sig();
    let mut qn = 0.0;
    let mut measures = 0.0;

    for (i, point) in map.iter().enumerate() {
        if let Some(s) = point.time_sig {
            sig = s;
        }
        if point.time >= end {
            break;
        }
        let next = map.get(i + 1);
        let seg_end = next.map(|n| n.time.min(end)).unwrap_or(end);
        let dt = seg_end - point.time;
        if dt <= 0.0 {
            continue;
        }
        let seg_qn = segment_qn(point, next, dt);
        qn += seg_qn;
        measures += seg_qn / sig.qn_per_measure();
    }
    (qn, measures)
}

/// Length of `duration` seconds of content under a tempo map.
///
/// With fewer than two points the map is a single tempo and the length
/// comes straight from it (or the base tempo when the map is empty).
pub fn session_length(map: &[TempoPoint], base: &BaseTempo, duration: f64) -> SessionLength {
    if duration <= 0.0 {
        return SessionLength::default();
    }

    if map.len() < 2 {
        let bpm = map.first().map(|p| p.bpm).unwrap_or(base.bpm);
        let sig = map
            .first()
            .and_then(|p| p.time_sig)
            .unwrap_or_else(|| base.time_sig());
        let quarter_notes = duration * bpm / 60.0;
        return SessionLength {
            measures: ceil_measures(quarter_notes / sig.qn_per_measure()),
            quarter_notes,
        };
    }

    let (quarter_notes, measures) = integrate(map, base, duration);
    SessionLength {
        measures: ceil_measures(measures),
        quarter_notes,
    }
}

/// Quarter-note position of `time` seconds.
pub fn qn_at(map: &[TempoPoint], base: &BaseTempo, time: f64) -> f64 {
    if time <= 0.0 {
        return 0.0;
    }
    if map.is_empty() {
        return time * base.bpm / 60.0;
    }
    integrate(map, base, time).0
}

/// Signature in force at `time` seconds.
pub fn time_sig_at(map: &[TempoPoint], base: &BaseTempo, time: f64) -> TimeSignature {
    map.iter()
        .take_while(|p| p.time <= time)
        .filter_map(|p| p.time_sig)
        .last()
        .unwrap_or_else(|| base.time_sig())
}
