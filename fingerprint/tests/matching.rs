mod common;

use echomark_fingerprint::{
    extract_frames, FingerprintError, Matcher, MatchOutcome, COEF_COUNT,
};

use common::{catalog, clip, expected_frames};

#[test]
fn clip_matches_itself_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let a = clip(dir.path(), "a.wav", &[440.0, 660.0]);

    let cat = catalog();
    cat.add_context("music", None, false).unwrap();
    let record = cat.add_audio("music", &a).unwrap().record().clone();
    let matcher = Matcher::new(cat.database().clone());

    for coefs in [1, 5, COEF_COUNT] {
        for tolerance in [Some(0.0), None, Some(0.5)] {
            let outcome = matcher.match_file("music", &a, coefs, tolerance).unwrap();
            let m = outcome.found().unwrap();
            assert_eq!(m.record, record);
            assert_eq!(m.frame_count, expected_frames(4000));
            assert_eq!(m.match_count, m.frame_count);
        }
    }
}

#[test]
fn picks_the_right_clip_among_several() {
    let dir = tempfile::tempdir().unwrap();
    let clips = [
        clip(dir.path(), "low.wav", &[220.0]),
        clip(dir.path(), "mid.wav", &[880.0, 1320.0]),
        clip(dir.path(), "high.wav", &[2500.0]),
    ];

    let cat = catalog();
    cat.add_context("music", None, false).unwrap();
    let records: Vec<_> = clips
        .iter()
        .map(|p| cat.add_audio("music", p).unwrap().record().clone())
        .collect();

    let matcher = Matcher::new(cat.database().clone());
    for (path, record) in clips.iter().zip(&records) {
        let outcome = matcher.match_file("music", path, COEF_COUNT, None).unwrap();
        assert_eq!(&outcome.found().unwrap().record, record);
    }
}

#[test]
fn coefficient_count_out_of_range_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let a = clip(dir.path(), "a.wav", &[440.0]);
    let cat = catalog();
    cat.add_context("music", None, false).unwrap();
    let matcher = Matcher::new(cat.database().clone());

    for coefs in [0, COEF_COUNT + 1, 100] {
        assert!(matches!(
            matcher.match_file("music", &a, coefs, None),
            Err(FingerprintError::InvalidArgument(_))
        ));
    }
}

#[test]
fn empty_probe_is_no_match() {
    let cat = catalog();
    cat.add_context("music", None, false).unwrap();
    let matcher = Matcher::new(cat.database().clone());
    assert_eq!(
        matcher.match_frames("music", &[], 3, None).unwrap(),
        MatchOutcome::NotFound { frame_count: 0 }
    );
}

#[test]
fn unknown_clip_in_empty_context_is_no_match() {
    let dir = tempfile::tempdir().unwrap();
    let a = clip(dir.path(), "a.wav", &[440.0]);
    let cat = catalog();
    cat.add_context("music", None, false).unwrap();
    let matcher = Matcher::new(cat.database().clone());

    let probe = extract_frames(&a).unwrap();
    assert_eq!(
        matcher.match_frames("music", &probe, 1, None).unwrap(),
        MatchOutcome::NotFound {
            frame_count: probe.len()
        }
    );
}

#[test]
fn concurrent_matches_do_not_interfere() {
    let dir = tempfile::tempdir().unwrap();
    let paths = [
        clip(dir.path(), "a.wav", &[300.0]),
        clip(dir.path(), "b.wav", &[1700.0]),
    ];
    let cat = catalog();
    cat.add_context("music", None, false).unwrap();
    let uuids: Vec<String> = paths
        .iter()
        .map(|p| cat.add_audio("music", p).unwrap().record().uuid.clone())
        .collect();
    let matcher = Matcher::new(cat.database().clone());

    std::thread::scope(|s| {
        for _ in 0..4 {
            for (path, uuid) in paths.iter().zip(&uuids) {
                let matcher = matcher.clone();
                s.spawn(move || {
                    let outcome = matcher.match_file("music", path, COEF_COUNT, None).unwrap();
                    assert_eq!(&outcome.found().unwrap().record.uuid, uuid);
                });
            }
        }
    });
}

#[test]
fn end_to_end_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let a = clip(dir.path(), "a.wav", &[523.25, 784.0]);

    let cat = catalog();
    cat.add_context("music", None, false).unwrap();
    cat.add_context("prompts", None, false).unwrap();

    let music = cat.add_audio("music", &a).unwrap();
    assert_eq!(cat.list_audio(None).unwrap().len(), 1);
    cat.add_audio("music", &a).unwrap();
    assert_eq!(cat.list_audio(None).unwrap().len(), 1);
    let prompts = cat.add_audio("prompts", &a).unwrap();
    assert_eq!(cat.list_audio(None).unwrap().len(), 2);

    let matcher = Matcher::new(cat.database().clone());
    for (context, expected) in [("music", &music), ("prompts", &prompts)] {
        let outcome = matcher.match_file(context, &a, 1, None).unwrap();
        let m = outcome.found().unwrap();
        assert_eq!(&m.record, expected.record());
        assert_eq!(m.record.context, context);
        assert_eq!(m.match_count, m.frame_count);
    }
}
