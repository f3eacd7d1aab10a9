use image::{ImageBuffer, ImageFormat, Rgba};
use leaf_core::{
    CONNECTION_FAILURE, Detector, InferenceClient, Prediction, ScoredClass, SelectedImage, Stage,
    SubmissionState, SubmitError, Worker, WorkerEvent,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy)]
enum Reply {
    EarlyBlight,
    InvalidImage,
    Unreachable,
    Crash,
}

struct FakeClient {
    reply: Reply,
    calls: AtomicUsize,
    gate: Option<Mutex<Receiver<()>>>,
}

impl FakeClient {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    fn gated(reply: Reply) -> (Arc<Self>, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let client = Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            gate: Some(Mutex::new(rx)),
        });
        (client, tx)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl InferenceClient for FakeClient {
    fn predict(&self, _image: &SelectedImage) -> Result<Prediction, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _ = gate.lock().expect("gate lock").recv_timeout(WAIT);
        }
        match self.reply {
            Reply::EarlyBlight => Ok(Prediction {
                label: "Early Blight".into(),
                top_k: [("Early Blight", 0.82), ("Late Blight", 0.10), ("Healthy", 0.05)]
                    .into_iter()
                    .map(|(label, score)| ScoredClass {
                        label: label.into(),
                        score,
                    })
                    .collect(),
            }),
            Reply::InvalidImage => Err(SubmitError::Rejected {
                status: 400,
                message: Some("Invalid image".into()),
            }),
            Reply::Unreachable => Err(SubmitError::Transport("connection refused".into())),
            Reply::Crash => panic!("inference client crashed"),
        }
    }

    fn health(&self) -> Result<(), SubmitError> {
        Ok(())
    }
}

fn leaf_png() -> SelectedImage {
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(8, 8, Rgba([40, 140, 50, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("encode fixture");
    SelectedImage::from_bytes("leaf.png", None, out.into_inner())
}

fn next(worker: &Worker) -> WorkerEvent {
    worker.wait(WAIT).expect("worker event")
}

#[test]
fn preview_appears_once_decoding_completes() {
    let worker = Worker::new(FakeClient::new(Reply::EarlyBlight), || {});
    let mut detector = Detector::new();

    let ticket = detector.select_image(leaf_png());
    assert!(detector.preview().is_none());
    assert!(detector.prediction().is_none());

    worker.decode_preview(ticket);
    assert!(detector.handle(next(&worker)).is_none());
    let preview = detector.preview().expect("preview");
    assert!(preview.data_uri.starts_with("data:image/png;base64,"));
    assert_eq!(preview.size(), [8, 8]);
}

#[test]
fn undecodable_file_has_no_preview_but_can_submit() {
    let worker = Worker::new(FakeClient::new(Reply::EarlyBlight), || {});
    let mut detector = Detector::new();

    let ticket = detector.select_image(SelectedImage::from_bytes(
        "leaf.jpg",
        None,
        b"truncated".to_vec(),
    ));
    worker.decode_preview(ticket);
    detector.handle(next(&worker));
    assert!(detector.preview().is_none());
    assert!(detector.can_submit());
}

#[test]
fn success_populates_prediction_and_ranking() {
    let client = FakeClient::new(Reply::EarlyBlight);
    let worker = Worker::new(client.clone(), || {});
    let mut detector = Detector::new();
    detector.select_image(leaf_png());

    let ticket = detector.begin_submission().expect("ticket");
    assert!(detector.begin_submission().is_none());
    worker.submit(ticket);
    assert!(detector.handle(next(&worker)).is_none());

    assert_eq!(client.calls(), 1);
    assert_eq!(detector.stage(), Stage::Resulted);
    assert_eq!(detector.submission_state(), SubmissionState::Idle);
    let prediction = detector.prediction().expect("prediction");
    assert_eq!(prediction.label, "Early Blight");
    let labels: Vec<_> = prediction.top_k.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Early Blight", "Late Blight", "Healthy"]);
}

#[test]
fn rejection_notifies_with_service_message() {
    let worker = Worker::new(FakeClient::new(Reply::InvalidImage), || {});
    let mut detector = Detector::new();
    detector.select_image(leaf_png());

    worker.submit(detector.begin_submission().expect("ticket"));
    let note = detector.handle(next(&worker)).expect("notification");
    assert!(note.message.contains("Invalid image"));
    assert!(detector.prediction().is_none());
    assert_eq!(detector.submission_state(), SubmissionState::Idle);
    assert_eq!(detector.stage(), Stage::Selected);
}

#[test]
fn transport_failure_notifies_connectivity() {
    let worker = Worker::new(FakeClient::new(Reply::Unreachable), || {});
    let mut detector = Detector::new();
    detector.select_image(leaf_png());

    worker.submit(detector.begin_submission().expect("ticket"));
    let note = detector.handle(next(&worker)).expect("notification");
    assert_eq!(note.message, CONNECTION_FAILURE);
    assert_eq!(detector.submission_state(), SubmissionState::Idle);
}

#[test]
fn crashing_client_still_returns_to_idle() {
    let client = FakeClient::new(Reply::Crash);
    let worker = Worker::new(client.clone(), || {});
    let mut detector = Detector::new();
    detector.select_image(leaf_png());

    worker.submit(detector.begin_submission().expect("ticket"));
    let note = detector.handle(next(&worker)).expect("notification");
    assert_eq!(note.message, CONNECTION_FAILURE);
    assert_eq!(client.calls(), 1);
    assert_eq!(detector.submission_state(), SubmissionState::Idle);
    assert_eq!(detector.stage(), Stage::Selected);
    assert!(detector.can_submit());
}

#[test]
fn empty_submit_issues_no_request() {
    let client = FakeClient::new(Reply::EarlyBlight);
    let worker = Worker::new(client.clone(), || {});
    let mut detector = Detector::new();

    assert!(detector.begin_submission().is_none());
    assert!(worker.wait(Duration::from_millis(50)).is_none());
    assert_eq!(client.calls(), 0);
    assert_eq!(detector.submission_state(), SubmissionState::Idle);
}

#[test]
fn response_for_replaced_selection_is_not_shown() {
    let (client, release) = FakeClient::gated(Reply::EarlyBlight);
    let worker = Worker::new(client.clone(), || {});
    let mut detector = Detector::new();
    detector.select_image(leaf_png());
    worker.submit(detector.begin_submission().expect("ticket"));

    detector.select_image(leaf_png());
    assert_eq!(detector.stage(), Stage::Pending);
    release.send(()).expect("release request");

    assert!(detector.handle(next(&worker)).is_none());
    assert!(detector.prediction().is_none());
    assert_eq!(detector.stage(), Stage::Selected);
    assert!(detector.can_submit());
}

#[test]
fn clear_after_result_resets_all_state() {
    let worker = Worker::new(FakeClient::new(Reply::EarlyBlight), || {});
    let mut detector = Detector::new();
    let ticket = detector.select_image(leaf_png());
    worker.decode_preview(ticket);
    detector.handle(next(&worker));
    worker.submit(detector.begin_submission().expect("ticket"));
    detector.handle(next(&worker));
    assert_eq!(detector.stage(), Stage::Resulted);

    detector.clear_image();
    assert!(detector.selected().is_none());
    assert!(detector.preview().is_none());
    assert!(detector.prediction().is_none());
    assert_eq!(detector.stage(), Stage::Empty);
}

#[test]
fn waker_runs_for_each_completed_job() {
    let woken = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&woken);
    let worker = Worker::new(FakeClient::new(Reply::EarlyBlight), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    worker.check_health();
    assert!(matches!(next(&worker), WorkerEvent::HealthChecked(Ok(()))));
    // The waker fires right after the send, so give the job thread a moment.
    for _ in 0..100 {
        if woken.load(Ordering::SeqCst) == 1 {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(woken.load(Ordering::SeqCst), 1);
}
