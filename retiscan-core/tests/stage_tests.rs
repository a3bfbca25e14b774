// retiscan-core/tests/stage_tests.rs
//
// Stages are plain functions over typed values and can be re-run in isolation.

mod common;

use common::{IndexedClassifier, StubExtractor, test_config};
use retiscan_core::error::CoreError;
use retiscan_core::frames::FrameExtractor;
use retiscan_core::pipeline::{
    CancellationToken, NoopObserver, build_store, classify_frames, preprocess_frames,
    score_frames,
};
use retiscan_core::preprocessing::Preprocessor;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn stages_are_repeatable_with_identical_inputs() {
    let workspace = tempdir().unwrap();
    let config = test_config(workspace.path());
    let frames = StubExtractor::valid(4)
        .extract(Path::new("unused.mp4"), &config.layout.frames_dir())
        .unwrap();
    let preprocessor = Preprocessor::new(config.tensor_shape, config.seed);
    let cancel = CancellationToken::new();

    let first = preprocess_frames(&preprocessor, &frames, 3, None, &cancel, &NoopObserver).unwrap();
    let second = preprocess_frames(&preprocessor, &frames, 1, None, &cancel, &NoopObserver).unwrap();
    let tensors = |out: &retiscan_core::pipeline::StageOutput<retiscan_core::pipeline::PreparedFrame>| {
        out.items.iter().map(|p| p.tensor.clone()).collect::<Vec<_>>()
    };
    assert_eq!(tensors(&first), tensors(&second));

    let classifier = IndexedClassifier::new(&[0.05, 0.5, 0.65, 0.99]);
    let scored = classify_frames(&classifier, first.items, 3, &cancel, &NoopObserver).unwrap();
    let verdicts = score_frames(&scored.items, &NoopObserver);
    assert!(verdicts.failures.is_empty());

    let store = build_store(verdicts.items, frames.len()).unwrap();
    assert!(store.is_finalized());
    assert_eq!(store.summary().unwrap().diseased_frames, 3);
}

#[test]
fn cancellation_stops_preprocessing() {
    let workspace = tempdir().unwrap();
    let config = test_config(workspace.path());
    let frames = StubExtractor::valid(3)
        .extract(Path::new("unused.mp4"), &config.layout.frames_dir())
        .unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = preprocess_frames(
        &Preprocessor::new(config.tensor_shape, config.seed),
        &frames,
        2,
        None,
        &cancel,
        &NoopObserver,
    );
    assert!(matches!(result, Err(CoreError::Cancelled)));
}

#[test]
fn empty_verdict_list_reports_extracted_count() {
    let err = build_store(Vec::new(), 7).unwrap_err();
    assert!(matches!(err, CoreError::EmptyRun { extracted: 7 }));
}
