use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;

use sign_translator::detect::{
    NearestCentroidClassifier, ReplayLandmarkSource, ScriptedLandmarkSource,
};
use sign_translator::pipeline::{spawn_worker, worker};
use sign_translator::{
    extract_features, DetectionState, Frame, FrameOutcome, Hand, HandFrame, Handedness,
    LabelCatalog, Landmark, LatestFrame, PipelineSettings, Prediction, RecognitionMode,
    StabilizerPolicy, Stabilizer, Translator,
};

fn hand_at(x: f32, y: f32, spread: f32) -> Hand {
    let landmarks = (0..21)
        .map(|i| {
            if i == 0 {
                Landmark::new(x, y)
            } else {
                let finger = (i - 1) / 4;
                let joint = (i - 1) % 4 + 1;
                Landmark::new(
                    x + (finger as f32 - 2.0) * spread,
                    y - joint as f32 * 0.04,
                )
            }
        })
        .collect();
    Hand::new(landmarks, Handedness::Right, 0.95).expect("21 landmarks")
}

fn two_sign_classifier() -> NearestCentroidClassifier {
    NearestCentroidClassifier::new(vec![
        (
            "hola".to_string(),
            extract_features(hand_at(0.5, 0.6, 0.02).landmarks()),
        ),
        (
            "gracias".to_string(),
            extract_features(hand_at(0.5, 0.6, 0.06).landmarks()),
        ),
    ])
    .expect("centroids")
}

fn settings(window: usize, support: usize, conf: f32) -> PipelineSettings {
    PipelineSettings {
        policy: StabilizerPolicy {
            window_size: window,
            min_support: support,
            min_avg_confidence: conf,
        },
        ..PipelineSettings::default()
    }
}

fn idle_translator(settings: PipelineSettings) -> Translator {
    Translator::new(
        settings,
        Box::new(ScriptedLandmarkSource::new(Vec::new())),
        Box::new(two_sign_classifier()),
        LabelCatalog::new(),
    )
}

fn hands(hand: Hand) -> FrameOutcome {
    FrameOutcome::Hands(HandFrame::with_hands(vec![hand], 640, 480))
}

fn feed(t: &mut Translator, spread: f32) -> Option<String> {
    let ticket = t.begin_frame().expect("detecting");
    t.complete(ticket, hands(hand_at(0.5, 0.6, spread)), None)
        .expect("current ticket")
        .label
}

#[test]
fn stabilizer_majority_scenario() {
    let mut stabilizer = Stabilizer::new(5);
    for (label, conf) in [("A", 0.9), ("A", 0.8), ("B", 0.95), ("A", 0.85), ("A", 0.4)] {
        stabilizer.push(Prediction::new(label, conf));
    }
    let policy = StabilizerPolicy {
        window_size: 5,
        min_support: 3,
        min_avg_confidence: 0.3,
    };
    let stable = stabilizer.stable(&policy).expect("stable");
    assert_eq!(stable.label, "A");
    assert!((stable.confidence - 0.78).abs() < 1e-5);

    let mut empty = Stabilizer::new(5);
    for _ in 0..5 {
        empty.push_empty();
    }
    assert!(empty.stable(&policy).is_none());
}

#[test]
fn signs_are_recognized_through_tickets() {
    let mut t = idle_translator(settings(5, 3, 0.3));
    let session = t.start();
    assert_eq!(t.state(), DetectionState::Detecting(session));

    let mut last = None;
    for _ in 0..3 {
        let ticket = t.begin_frame().expect("detecting");
        last = t.complete(ticket, hands(hand_at(0.3, 0.7, 0.061)), None);
    }
    let publication = last.expect("current ticket");
    assert_eq!(publication.label.as_deref(), Some("gracias"));
    assert_eq!(publication.session, Some(session));
    assert!(publication.confidence > 0.3);
}

#[test]
fn toggling_detection_discards_state_and_late_results() {
    let mut t = idle_translator(settings(5, 2, 0.3));
    let publisher = t.publisher();
    t.start();
    for _ in 0..3 {
        let ticket = t.begin_frame().unwrap();
        t.complete(ticket, hands(hand_at(0.5, 0.6, 0.02)), None);
    }
    assert!(publisher.latest().has_label());

    let in_flight = t.begin_frame().unwrap();
    t.stop();
    assert!(!publisher.latest().has_label());
    let second = t.start();
    assert!(t.stable().is_none());

    // The late callback from the first session must not repopulate anything.
    assert!(t
        .complete(in_flight, hands(hand_at(0.5, 0.6, 0.02)), None)
        .is_none());
    assert!(t.stable().is_none());
    assert_eq!(t.window_len(), 0);
    assert_eq!(publisher.latest().session, Some(second));
    assert_eq!(t.stats().stale_discarded, 1);
}

#[test]
fn hand_leaving_frame_clears_label() {
    let mut t = idle_translator(settings(5, 3, 0.3));
    t.start();
    for _ in 0..5 {
        let ticket = t.begin_frame().unwrap();
        t.complete(ticket, hands(hand_at(0.5, 0.6, 0.02)), None);
    }
    assert!(t.stable().is_some());

    for _ in 0..5 {
        let ticket = t.begin_frame().unwrap();
        t.complete(ticket, FrameOutcome::Hands(HandFrame::empty(640, 480)), None);
    }
    assert!(t.stable().is_none());
    assert_eq!(t.stats().frames_without_hands, 5);
}

#[test]
fn alphabet_mode_waits_for_still_hand() {
    let letters = NearestCentroidClassifier::new(vec![(
        "a-web".to_string(),
        extract_features(hand_at(0.5, 0.6, 0.02).landmarks()),
    )])
    .unwrap();
    let mut s = settings(5, 1, 0.0);
    s.mode = RecognitionMode::Alphabet;
    let mut t = Translator::new(
        s,
        Box::new(ScriptedLandmarkSource::new(Vec::new())),
        Box::new(letters),
        LabelCatalog::new(),
    );
    t.start();

    // Moving hand: every prediction is rejected.
    for i in 0..4 {
        let ticket = t.begin_frame().unwrap();
        let p = t
            .complete(ticket, hands(hand_at(0.2 + 0.05 * i as f32, 0.6, 0.02)), None)
            .unwrap();
        assert!(!p.has_label());
    }

    // Hand settles: one frame to arrive, then three consecutive still frames.
    let mut last = None;
    for _ in 0..4 {
        let ticket = t.begin_frame().unwrap();
        last = t.complete(ticket, hands(hand_at(0.4, 0.6, 0.02)), None);
    }
    assert_eq!(last.unwrap().label.as_deref(), Some("A"));
    assert_eq!(t.stats().gated_out, 7);
}

#[test]
fn worker_replays_trace_into_published_label() {
    let mut trace = NamedTempFile::new().expect("temp trace");
    let line = serde_json::to_string(&HandFrame::with_hands(
        vec![hand_at(0.5, 0.6, 0.02)],
        640,
        480,
    ))
    .unwrap();
    for _ in 0..8 {
        writeln!(trace, "{}", line).unwrap();
    }

    let mut catalog_file = NamedTempFile::new().expect("temp catalog");
    catalog_file
        .write_all(br#"[{ "label": "hola", "word": "Hola", "translation": "Hello" }]"#)
        .unwrap();

    let source = ReplayLandmarkSource::from_path(trace.path())
        .unwrap()
        .looping(true);
    let translator = Translator::new(
        settings(4, 2, 0.3),
        Box::new(source),
        Box::new(two_sign_classifier()),
        LabelCatalog::from_path(catalog_file.path()).unwrap(),
    )
    .into_shared();
    let publisher = worker::lock(&translator).publisher();
    worker::lock(&translator).start();

    let slot = Arc::new(LatestFrame::new());
    let handle = spawn_worker(translator.clone(), slot.clone()).unwrap();
    let mut seq = 0;
    let mut version = publisher.version();
    let mut recognized = None;
    while recognized.is_none() && seq < 200 {
        seq += 1;
        slot.offer(Frame::blank(16, 12, seq));
        if let Some((p, v)) = publisher.wait_for_change(version, Duration::from_millis(50)) {
            version = v;
            if p.has_label() {
                recognized = Some(p);
            }
        }
    }
    handle.stop().unwrap();

    let p = recognized.expect("label published");
    assert_eq!(p.label.as_deref(), Some("hola"));
    assert_eq!(p.word.as_deref(), Some("Hola"));
    assert_eq!(p.translation.as_deref(), Some("Hello"));

    worker::lock(&translator).close();
    assert!(!worker::lock(&translator).readiness().is_ready());
}

#[test]
fn published_label_follows_recent_stable_labels() {
    let mut t = idle_translator(settings(1, 1, 0.0));
    t.start();
    for _ in 0..3 {
        assert_eq!(feed(&mut t, 0.02).as_deref(), Some("hola"));
    }
    // The window flips at once; the display holds until the new sign dominates.
    for _ in 0..3 {
        assert_eq!(feed(&mut t, 0.06).as_deref(), Some("hola"));
    }
    assert_eq!(t.stable().map(|s| s.label).as_deref(), Some("gracias"));
    assert_eq!(feed(&mut t, 0.06).as_deref(), Some("gracias"));

    // A new session starts from an empty history.
    t.start();
    assert_eq!(feed(&mut t, 0.02).as_deref(), Some("hola"));
}

#[test]
fn whole_trace_reaches_the_landmark_source() {
    const TRACE_LEN: u64 = 12;
    let mut trace = NamedTempFile::new().expect("temp trace");
    let line = serde_json::to_string(&HandFrame::with_hands(
        vec![hand_at(0.5, 0.6, 0.02)],
        640,
        480,
    ))
    .unwrap();
    for _ in 0..TRACE_LEN {
        writeln!(trace, "{}", line).unwrap();
    }

    let source = ReplayLandmarkSource::from_path(trace.path()).unwrap();
    let translator = Translator::new(
        settings(4, 2, 0.3),
        Box::new(source),
        Box::new(two_sign_classifier()),
        LabelCatalog::new(),
    )
    .into_shared();
    worker::lock(&translator).start();

    let slot = Arc::new(LatestFrame::new());
    let handle = spawn_worker(translator.clone(), slot.clone()).unwrap();
    let mut seq = 0;
    while slot.stats().delivered() < TRACE_LEN {
        seq += 1;
        slot.offer(Frame::blank(16, 12, seq));
    }
    handle.stop().unwrap();

    let stats = worker::lock(&translator).stats();
    assert_eq!(stats.frames_applied, TRACE_LEN);
    assert_eq!(stats.frames_without_hands, 0);
}
