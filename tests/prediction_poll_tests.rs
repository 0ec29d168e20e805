//! Single-prediction polling.

mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use modelrun::application::poll::{poll_interval, PredictionOutcome, PredictionPoller};
use modelrun::domain::PredictionStatus;
use modelrun::testkit::backend::{transport_failure, ScriptedBackend};
use modelrun::testkit::domain::result;
use modelrun::testkit::observer::{ObserverEvent, RecordingObserver};

#[test]
fn interval_backs_off_with_elapsed_time() {
    assert_eq!(poll_interval(Duration::from_millis(9_999)), Duration::from_millis(1_000));
    assert_eq!(poll_interval(Duration::from_millis(29_999)), Duration::from_millis(2_500));
    assert_eq!(poll_interval(Duration::from_millis(30_000)), Duration::from_millis(5_000));
}

#[tokio::test(start_paused = true)]
async fn reports_lifecycle_until_success() {
    let backend = Arc::new(ScriptedBackend::new().with_predictions(vec![
        Ok(PredictionStatus::Starting),
        Ok(PredictionStatus::Processing { progress: 40.0 }),
        Ok(PredictionStatus::Succeeded {
            results: vec![result("https://cdn.test/out.png")],
            remaining_credits: Some(95.0),
        }),
    ]));
    let observer = RecordingObserver::new();

    let outcome = PredictionPoller::new(backend.clone())
        .poll("pred-1", &observer, || false)
        .await;

    assert!(matches!(outcome, PredictionOutcome::Succeeded { .. }));
    assert_eq!(backend.prediction_calls(), 3);
    assert_eq!(observer.statuses(), ["starting", "processing", "succeeded"]);
    assert!(observer.events().contains(&ObserverEvent::Progress(40.0)));
    assert_eq!(
        observer.events().last(),
        Some(&ObserverEvent::Success(
            vec![result("https://cdn.test/out.png")],
            Some(95.0)
        ))
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_between_send_and_receive_fires_no_callbacks() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_prediction_delay(Duration::from_millis(500))
            .with_predictions(vec![Ok(PredictionStatus::Succeeded {
                results: vec![result("https://cdn.test/out.png")],
                remaining_credits: None,
            })]),
    );
    let observer = RecordingObserver::new();
    let canceled = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&canceled);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        flag.store(true, Ordering::SeqCst);
    });

    let outcome = PredictionPoller::new(backend.clone())
        .poll("pred-1", &observer, || canceled.load(Ordering::SeqCst))
        .await;

    assert_eq!(outcome, PredictionOutcome::Abandoned);
    assert_eq!(backend.prediction_calls(), 1);
    assert_eq!(observer.terminal_count(), 0);
    assert!(observer.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn server_failure_is_reported_once() {
    let backend = Arc::new(ScriptedBackend::new().with_predictions(vec![
        Ok(PredictionStatus::InitialProcessing),
        Ok(PredictionStatus::Failed {
            error: json!({"detail": "out of memory"}),
            remaining_credits: Some(12.0),
        }),
    ]));
    let observer = RecordingObserver::new();

    let outcome = PredictionPoller::new(backend)
        .poll("pred-1", &observer, || false)
        .await;

    let PredictionOutcome::Failed { message, .. } = outcome else {
        panic!("expected failure");
    };
    assert!(message.contains("out of memory"));
    assert_eq!(observer.terminal_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn transport_error_ends_tracking() {
    let backend = Arc::new(
        ScriptedBackend::new().with_predictions(vec![Err(transport_failure())]),
    );
    let observer = RecordingObserver::new();

    let outcome = PredictionPoller::new(backend.clone())
        .poll("pred-1", &observer, || false)
        .await;

    assert!(matches!(outcome, PredictionOutcome::Failed { remaining_credits: None, .. }));
    assert_eq!(backend.prediction_calls(), 1);
    assert!(matches!(
        observer.events().as_slice(),
        [ObserverEvent::Error(_, None)]
    ));
}

#[tokio::test(start_paused = true)]
async fn backend_cancel_is_terminal_without_error() {
    let backend = Arc::new(
        ScriptedBackend::new().with_predictions(vec![Ok(PredictionStatus::Canceled)]),
    );
    let observer = RecordingObserver::new();

    let outcome = PredictionPoller::new(backend)
        .poll("pred-1", &observer, || false)
        .await;

    assert_eq!(outcome, PredictionOutcome::Canceled);
    assert_eq!(observer.statuses(), ["canceled"]);
    assert_eq!(observer.terminal_count(), 0);
}
