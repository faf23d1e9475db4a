//! `TEMPO` line and `<TEMPOENVEX` breakpoints.

use crate::chunk::Chunk;
use crate::feedback::{FeedbackCode, FeedbackCollector};
use crate::model::{BaseTempo, TempoPoint, TempoShape, TimeSignature};
use crate::token::{self, tokenize};

/// Parse `TEMPO bpm num denom`.
pub fn parse_tempo_line(line: &str, collector: &mut FeedbackCollector) -> Option<BaseTempo> {
    let toks = tokenize(line);
    let bpm = match toks.get(1).and_then(|t| t.as_f64()) {
        Some(bpm) if bpm > 0.0 => bpm,
        _ => {
            collector.warning(FeedbackCode::BadNumber, format!("unreadable tempo line '{line}'"));
            return None;
        }
    };
    let num = toks
        .get(2)
        .and_then(|t| t.as_i64())
        .filter(|n| *n > 0)
        .unwrap_or(4) as u32;
    let denom = toks
        .get(3)
        .and_then(|t| t.as_i64())
        .filter(|n| *n > 0)
        .unwrap_or(4) as u32;
    Some(BaseTempo { bpm, num, denom })
}

/// Read the `PT position bpm shape [timesig]` lines of a tempo envelope.
///
/// Points without a shape take the envelope's `DEFSHAPE`, or Square.
/// Returned points are sorted by time.
pub fn parse_tempo_envelope(chunk: &Chunk, collector: &mut FeedbackCollector) -> Vec<TempoPoint> {
    let default_shape = chunk
        .field_i64("DEFSHAPE")
        .map(TempoShape::from_code)
        .unwrap_or(TempoShape::Square);

    let mut points = Vec::new();
    for line in chunk.lines() {
        if token::field_name(line) != Some("PT") {
            continue;
        }
        let toks = tokenize(line);
        let (Some(time), Some(bpm)) = (
            toks.get(1).and_then(|t| t.as_f64()),
            toks.get(2).and_then(|t| t.as_f64()),
        ) else {
            collector.warning(FeedbackCode::BadNumber, format!("unreadable tempo point '{line}'"));
            continue;
        };
        if bpm <= 0.0 {
            collector.warning(FeedbackCode::BadNumber, format!("non-positive tempo in '{line}'"));
            continue;
        }
        let shape = toks
            .get(3)
            .and_then(|t| t.as_i64())
            .map(TempoShape::from_code)
            .unwrap_or(default_shape);
        let time_sig = toks
            .get(4)
            .and_then(|t| t.as_i64())
            .and_then(TimeSignature::unpack);

        points.push(TempoPoint {
            time,
            bpm,
            shape,
            time_sig,
        });
    }

    points.sort_by(|a, b| a.time.total_cmp(&b.time));
    points
}

/// Make a tempo map usable: a point at 0 always exists and the last point
/// always steps.
///
/// A missing leading point is synthesized from the base tempo as Square. The
/// last point is forced to Square even for a single session, since a
/// trailing ramp has nothing to ramp towards.
pub fn normalize_tempo_map(mut points: Vec<TempoPoint>, base: &BaseTempo) -> Vec<TempoPoint> {
    let starts_at_zero = points.first().is_some_and(|p| p.time.abs() < 1e-9);
    if !starts_at_zero {
        points.insert(
            0,
            TempoPoint {
                time: 0.0,
                bpm: base.bpm,
                shape: TempoShape::Square,
                time_sig: Some(base.time_sig()),
            },
        );
    }
    if let Some(last) = points.last_mut() {
        last.shape = TempoShape::Square;
    }
    points
}
