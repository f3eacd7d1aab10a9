//! HTTP contract with the inference service.

use crate::config::ClientConfig;
use crate::selection::SelectedImage;
use anyhow::Result;
use reqwest::blocking::{Client, multipart};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when the service fails without saying why.
pub const GENERIC_FAILURE: &str = "Something went wrong!";
/// Shown when no usable response arrived.
pub const CONNECTION_FAILURE: &str = "Error connecting to backend";

/// Multipart field carrying the image bytes.
pub const IMAGE_FIELD: &str = "image";

/// One `[label, score]` entry of the ranked breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredClass {
    pub label: String,
    /// Probability in [0,1] as reported by the service.
    pub score: f32,
}

/// Successful classification: top-1 label plus the ranked top-k, kept
/// together so neither can exist without the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub top_k: Vec<ScoredClass>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The service answered but did not produce a prediction.
    #[error("inference service rejected the request (HTTP {status})")]
    Rejected {
        status: u16,
        message: Option<String>,
    },
    /// The body was not the JSON we expect, e.g. a proxy's HTML error page.
    #[error("unreadable response from inference service (HTTP {status})")]
    MalformedResponse {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    /// No response: connect failure, timeout, reset.
    #[error("could not reach the inference service")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SubmitError {
    /// Text for the user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Rejected {
                message: Some(msg), ..
            } if !msg.trim().is_empty() => msg.clone(),
            SubmitError::Rejected { .. } => GENERIC_FAILURE.to_string(),
            // An unreadable body is reported like a missing one.
            SubmitError::MalformedResponse { .. } | SubmitError::Transport(_) => {
                CONNECTION_FAILURE.to_string()
            }
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SubmitError::Transport(_))
    }
}

/// Seam between the workflow and the network.
pub trait InferenceClient: Send + Sync {
    /// Uploads `image` and returns the service's classification.
    fn predict(&self, image: &SelectedImage) -> Result<Prediction, SubmitError>;

    /// Liveness check against the service.
    fn health(&self) -> Result<(), SubmitError>;
}

#[derive(Deserialize)]
struct PredictBody {
    prediction: Option<String>,
    top_3: Option<Vec<(String, f32)>>,
    error: Option<String>,
}

/// Maps a raw status and body onto a prediction or a typed failure.
/// Scores are taken as-is; ordering is the service's responsibility.
pub fn parse_response(status: u16, body: &[u8]) -> Result<Prediction, SubmitError> {
    let parsed: PredictBody = serde_json::from_slice(body)
        .map_err(|source| SubmitError::MalformedResponse { status, source })?;
    let success = (200..300).contains(&status);
    match parsed.prediction {
        Some(label) if success => Ok(Prediction {
            label,
            top_k: parsed
                .top_3
                .unwrap_or_default()
                .into_iter()
                .map(|(label, score)| ScoredClass { label, score })
                .collect(),
        }),
        _ => Err(SubmitError::Rejected {
            status,
            message: parsed.error,
        }),
    }
}

/// Blocking `reqwest` client for the real service.
pub struct HttpInferenceClient {
    config: ClientConfig,
    http: Client,
}

impl HttpInferenceClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn image_part(image: &SelectedImage) -> multipart::Part {
        let part = || multipart::Part::bytes(image.bytes.to_vec()).file_name(image.name.clone());
        match part().mime_str(&image.mime) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("ignoring unusable mime type {:?}: {e}", image.mime);
                part()
            }
        }
    }
}

fn transport(err: reqwest::Error) -> SubmitError {
    SubmitError::Transport(Box::new(err))
}

impl InferenceClient for HttpInferenceClient {
    fn predict(&self, image: &SelectedImage) -> Result<Prediction, SubmitError> {
        let url = self.config.predict_url();
        tracing::info!("POST {url} ({}, {} bytes)", image.name, image.len());
        let form = multipart::Form::new().part(IMAGE_FIELD, Self::image_part(image));
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(transport)?;
        parse_response(status, &body)
    }

    fn health(&self) -> Result<(), SubmitError> {
        let response = self
            .http
            .get(self.config.health_url())
            .send()
            .map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SubmitError::Rejected {
                status: status.as_u16(),
                message: None,
            })
        }
    }
}
