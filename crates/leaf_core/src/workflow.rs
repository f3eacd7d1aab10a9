//! Selection and submission state for one detector view.
//!
//! All mutation happens on the UI thread. Asynchronous work is handed out as
//! tickets and its completion is fed back through [`Detector::preview_ready`]
//! and [`Detector::finish_submission`]; each carries the selection epoch it
//! was issued for so results for an outdated selection are dropped.

use crate::client::{Prediction, SubmitError};
use crate::report::ResultView;
use crate::selection::{Preview, SelectedImage};

/// Observable stage of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Empty,
    Selected,
    Pending,
    Resulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
}

/// Work order for decoding the preview of the current selection.
#[derive(Debug, Clone)]
pub struct PreviewTicket {
    pub epoch: u64,
    pub image: SelectedImage,
}

/// Work order for one upload.
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub token: u64,
    pub epoch: u64,
    pub image: SelectedImage,
}

/// Blocking notification for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Detector {
    selected: Option<SelectedImage>,
    preview: Option<Preview>,
    prediction: Option<Prediction>,
    /// Built once per applied prediction; cleared with it.
    view: Option<ResultView>,
    /// Bumped on every select/clear.
    epoch: u64,
    next_token: u64,
    in_flight: Option<u64>,
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.selected.as_ref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    /// Display model of the current prediction, if any.
    pub fn result_view(&self) -> Option<&ResultView> {
        self.view.as_ref()
    }

    /// Whether `epoch` still names the current selection.
    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    pub fn submission_state(&self) -> SubmissionState {
        if self.in_flight.is_some() {
            SubmissionState::InFlight
        } else {
            SubmissionState::Idle
        }
    }

    pub fn stage(&self) -> Stage {
        match (&self.selected, self.in_flight, &self.prediction) {
            (None, _, _) => Stage::Empty,
            (Some(_), Some(_), _) => Stage::Pending,
            (Some(_), None, Some(_)) => Stage::Resulted,
            (Some(_), None, None) => Stage::Selected,
        }
    }

    /// Whether a submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && self.in_flight.is_none()
    }

    /// Replaces the selection. Prior results and preview are cleared before
    /// the returned ticket is decoded, so no stale result is ever shown next
    /// to the new image.
    pub fn select_image(&mut self, image: SelectedImage) -> PreviewTicket {
        self.epoch += 1;
        tracing::info!("selected {} ({}, {} bytes)", image.name, image.mime, image.len());
        self.preview = None;
        self.clear_prediction();
        self.selected = Some(image.clone());
        PreviewTicket {
            epoch: self.epoch,
            image,
        }
    }

    /// Drops the selection with its preview and results. An outstanding
    /// submission keeps the detector busy until it reports back.
    pub fn clear_image(&mut self) {
        self.epoch += 1;
        self.selected = None;
        self.preview = None;
        self.clear_prediction();
    }

    fn clear_prediction(&mut self) {
        self.prediction = None;
        self.view = None;
    }

    /// Applies a decoded preview. A failed decode leaves the selection
    /// without a preview; it does not block submitting.
    pub fn preview_ready(&mut self, epoch: u64, preview: anyhow::Result<Preview>) {
        if !self.is_current(epoch) {
            tracing::debug!("discarding preview for stale selection {epoch}");
            return;
        }
        match preview {
            Ok(p) => self.preview = Some(p),
            Err(e) => {
                tracing::warn!("no preview available: {e:#}");
                self.preview = None;
            }
        }
    }

    /// Starts a submission, or returns `None` when nothing is selected or a
    /// request is already in flight.
    pub fn begin_submission(&mut self) -> Option<SubmissionTicket> {
        if self.in_flight.is_some() {
            tracing::debug!("submission already in flight");
            return None;
        }
        let image = self.selected.clone()?;
        self.next_token += 1;
        let token = self.next_token;
        self.in_flight = Some(token);
        self.clear_prediction();
        Some(SubmissionTicket {
            token,
            epoch: self.epoch,
            image,
        })
    }

    /// Completes the submission identified by `token`/`epoch`.
    ///
    /// The detector always returns to idle for the in-flight token. The
    /// outcome is applied only if the selection it was issued for is still
    /// current; a failure for a current selection yields a notification.
    pub fn finish_submission(
        &mut self,
        token: u64,
        epoch: u64,
        outcome: Result<Prediction, SubmitError>,
    ) -> Option<Notification> {
        if self.in_flight == Some(token) {
            self.in_flight = None;
        } else {
            tracing::debug!("ignoring completion for unknown submission {token}");
            return None;
        }
        if !self.is_current(epoch) {
            tracing::debug!("discarding result of submission {token}: selection changed");
            return None;
        }
        match outcome {
            Ok(prediction) => {
                tracing::info!("prediction: {}", prediction.label);
                self.view = ResultView::from_prediction(Some(&prediction));
                self.prediction = Some(prediction);
                None
            }
            Err(e) => {
                if e.is_transport() {
                    tracing::error!("submission {token} failed: {e}");
                } else {
                    tracing::warn!("submission {token} failed: {e}");
                }
                Some(Notification {
                    message: e.user_message(),
                })
            }
        }
    }
}
