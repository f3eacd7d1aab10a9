//! Background execution of preview decoding and uploads.
//!
//! Every job runs on its own short-lived thread and reports exactly one
//! [`WorkerEvent`] on the shared channel, then calls the waker so the UI
//! drains it on its next frame. A job that panics reports its fallback
//! event instead, so a submission can never stay in flight forever.

use crate::client::{InferenceClient, Prediction, SubmitError};
use crate::selection::Preview;
use crate::workflow::{Detector, Notification, PreviewTicket, SubmissionTicket};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

pub enum WorkerEvent {
    PreviewDecoded {
        epoch: u64,
        preview: anyhow::Result<Preview>,
    },
    SubmissionFinished {
        token: u64,
        epoch: u64,
        outcome: Result<Prediction, SubmitError>,
    },
    HealthChecked(Result<(), SubmitError>),
}

pub struct Worker {
    client: Arc<dyn InferenceClient>,
    tx: Sender<WorkerEvent>,
    rx: Receiver<WorkerEvent>,
    waker: Arc<dyn Fn() + Send + Sync>,
}

impl Worker {
    pub fn new(client: Arc<dyn InferenceClient>, waker: impl Fn() + Send + Sync + 'static) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client,
            tx,
            rx,
            waker: Arc::new(waker),
        }
    }

    pub fn decode_preview(&self, ticket: PreviewTicket) {
        let epoch = ticket.epoch;
        self.spawn(
            "preview",
            move || WorkerEvent::PreviewDecoded {
                epoch,
                preview: Preview::decode(&ticket.image),
            },
            move |msg| WorkerEvent::PreviewDecoded {
                epoch,
                preview: Err(anyhow::anyhow!("preview decoding panicked: {msg}")),
            },
        )
        .unwrap_or_else(|e| {
            self.deliver(WorkerEvent::PreviewDecoded {
                epoch,
                preview: Err(anyhow::Error::new(e).context("failed to start preview thread")),
            })
        });
    }

    pub fn submit(&self, ticket: SubmissionTicket) {
        let (token, epoch) = (ticket.token, ticket.epoch);
        let client = Arc::clone(&self.client);
        self.spawn(
            "submit",
            move || WorkerEvent::SubmissionFinished {
                token,
                epoch,
                outcome: client.predict(&ticket.image),
            },
            move |msg| WorkerEvent::SubmissionFinished {
                token,
                epoch,
                outcome: Err(SubmitError::Transport(msg.into())),
            },
        )
        .unwrap_or_else(|e| {
            self.deliver(WorkerEvent::SubmissionFinished {
                token,
                epoch,
                outcome: Err(SubmitError::Transport(Box::new(e))),
            })
        });
    }

    pub fn check_health(&self) {
        let client = Arc::clone(&self.client);
        self.spawn(
            "health",
            move || WorkerEvent::HealthChecked(client.health()),
            |msg| WorkerEvent::HealthChecked(Err(SubmitError::Transport(msg.into()))),
        )
        .unwrap_or_else(|e| {
            self.deliver(WorkerEvent::HealthChecked(Err(SubmitError::Transport(
                Box::new(e),
            ))))
        });
    }

    /// Drains everything that completed since the last call.
    pub fn poll(&self) -> Vec<WorkerEvent> {
        self.rx.try_iter().collect()
    }

    /// Blocks for the next event, up to `timeout`.
    pub fn wait(&self, timeout: Duration) -> Option<WorkerEvent> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Runs `job` on a named thread. `on_panic` builds the event reported
    /// when `job` unwinds instead of returning.
    fn spawn<F, P>(&self, name: &str, job: F, on_panic: P) -> std::io::Result<()>
    where
        F: FnOnce() -> WorkerEvent + Send + 'static,
        P: FnOnce(String) -> WorkerEvent + Send + 'static,
    {
        let tx = self.tx.clone();
        let waker = Arc::clone(&self.waker);
        let label = name.to_owned();
        thread::Builder::new().name(name.to_owned()).spawn(move || {
            let event = panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
                let msg = panic_message(payload.as_ref());
                tracing::error!("{label} job panicked: {msg}");
                on_panic(msg)
            });
            if tx.send(event).is_ok() {
                waker();
            }
        })?;
        Ok(())
    }

    fn deliver(&self, event: WorkerEvent) {
        if self.tx.send(event).is_ok() {
            (self.waker)();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Detector {
    /// Feeds a completed job back into the workflow. Health results carry no
    /// workflow state and are ignored here.
    pub fn handle(&mut self, event: WorkerEvent) -> Option<Notification> {
        match event {
            WorkerEvent::PreviewDecoded { epoch, preview } => {
                self.preview_ready(epoch, preview);
                None
            }
            WorkerEvent::SubmissionFinished {
                token,
                epoch,
                outcome,
            } => self.finish_submission(token, epoch, outcome),
            WorkerEvent::HealthChecked(_) => None,
        }
    }
}
