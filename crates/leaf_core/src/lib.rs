//! Core of the leaf disease detector: selection, upload and result state,
//! independent of any GUI toolkit.

pub mod classes;
pub mod client;
pub mod config;
pub mod report;
pub mod selection;
pub mod worker;
pub mod workflow;

pub use classes::{CLASS_NAMES, is_known_class};
pub use client::{
    CONNECTION_FAILURE, GENERIC_FAILURE, HttpInferenceClient, InferenceClient, Prediction,
    ScoredClass, SubmitError, parse_response,
};
pub use config::{API_URL_ENV, ClientConfig, DEFAULT_API_URL};
pub use report::{ResultView, ScoreRow, format_percent};
pub use selection::{Preview, SelectedImage, pick_first};
pub use worker::{Worker, WorkerEvent};
pub use workflow::{
    Detector, Notification, PreviewTicket, Stage, SubmissionState, SubmissionTicket,
};
