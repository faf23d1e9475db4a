//! Fixture-based tests for session parsing and template documents.
//!
//! Each .rpp file in tests/fixtures/ is loaded from disk.

use pretty_assertions::assert_eq;
use rpp::{load_session, FeedbackCode, LoadError, ProjectDocument, Session, TempoShape, TimeSignature};
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{}.rpp", name))
}

fn load_fixture(name: &str) -> (Session, Vec<rpp::Feedback>) {
    let result = load_session(fixture_path(name))
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", name, e));
    (result.value, result.feedback)
}

#[test]
fn test_fixture_drums_take1() {
    let (session, feedback) = load_fixture("drums_take1");
    assert!(feedback.is_empty(), "unexpected feedback: {:?}", feedback);

    let names: Vec<_> = session.tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Drums", "Kick In", "Snare Top", "Click"]);

    let media: Vec<_> = session.media_tracks().map(|(i, _)| i).collect();
    assert_eq!(media, vec![1, 2]);
    assert_eq!(session.duration, 16.0);

    assert_eq!(session.tempo_map.len(), 1);
    assert_eq!(session.tempo_map[0].time_sig, Some(TimeSignature { num: 4, denom: 4 }));

    assert_eq!(session.markers.len(), 2);
    assert_eq!(session.markers[0].name, "Count in");
    assert!(session.markers[1].is_region);
    assert_eq!(session.markers[1].region_end, 10.0);

    assert!(session.pool(1).is_some());
    assert!(session.tracks[1].uses_pools.contains(&1));
    assert!(session.tracks[0].is_folder);
}

#[test]
fn test_fixture_tempo_ramp() {
    let (session, feedback) = load_fixture("tempo_ramp");
    assert!(feedback.is_empty(), "unexpected feedback: {:?}", feedback);

    assert_eq!(session.tracks[0].name, "02_Gtrs_L");
    assert_eq!(session.duration, 30.0);

    let shapes: Vec<_> = session.tempo_map.iter().map(|p| p.shape).collect();
    assert_eq!(shapes, vec![TempoShape::Linear, TempoShape::Square, TempoShape::Square]);
    assert_eq!(session.tempo_map[2].time_sig, Some(TimeSignature { num: 3, denom: 4 }));
}

#[test]
fn test_fixture_truncated_keeps_complete_tracks() {
    let (session, feedback) = load_fixture("truncated");

    assert_eq!(session.tracks.len(), 1);
    assert_eq!(session.tracks[0].name, "Room L");
    assert_eq!(session.base_tempo.num, 3);
    assert!(session.markers.is_empty());

    let codes: Vec<_> = feedback.iter().map(|f| f.code).collect();
    assert!(codes.contains(&FeedbackCode::BlockUnterminated));
    assert!(codes.contains(&FeedbackCode::RegionUnpaired));
}

#[test]
fn test_missing_file_is_load_error() {
    let err = load_session(fixture_path("does_not_exist")).unwrap_err();
    let LoadError::FileUnreadable { path, .. } = err;
    assert!(path.ends_with("does_not_exist.rpp"));
}

#[test]
fn test_template_document_round_trip() {
    let doc = ProjectDocument::load(fixture_path("drums_take1"))
        .expect("fixture loads")
        .value;
    assert_eq!(doc.track_count(), 4);
    assert_eq!(doc.dir(), fixture_path("drums_take1").parent());

    // Rendering and re-reading keeps every track and the timeline
    let rendered = doc.render();
    let reparsed = rpp::parse_session(&rendered, "copy.rpp");
    assert!(reparsed.feedback.is_empty());
    assert_eq!(reparsed.value.tracks.len(), 4);
    assert_eq!(reparsed.value.markers.len(), 2);
    assert_eq!(reparsed.value.duration, 16.0);
}

#[test]
fn test_template_save() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.rpp");
    let doc = ProjectDocument::load(fixture_path("tempo_ramp")).unwrap().value;
    doc.save(&out).unwrap();

    let again = load_session(&out).unwrap();
    assert_eq!(again.value.tracks[0].name, "02_Gtrs_L");
}
