//! Capture submission flow used by the mobile scan page.
//!
//! 1. Send the photo to `capture_process`
//! 2. Poll `pipeline_status` (no server-side wait) until the pipeline is
//!    ready for review, gives up, or the attempt budget runs out
//! 3. Approve the creature exactly once
//!
//! Failures are surfaced once to the caller; nothing here is retried
//! automatically because `approve` mutates the roster.

use std::time::Duration;

use forest_types::{CreatureKind, PipelineState, PipelineStatus};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::{ApproveRequest, CaptureRequest, ForestApi, PipelineQuery};

/// Progress floor reported once the capture has been accepted.
const ACCEPTED_PROGRESS: u32 = 30;

/// Progress reported right before approving.
const APPROVING_PROGRESS: u32 = 90;

/// Attempts after which an idle pipeline at 0% counts as a failure.
const IDLE_GRACE_ATTEMPTS: u32 = 2;

/// Why a submission did not end with an approved creature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// The backend refused the capture (busy pipeline, bad kind, network).
    #[error("capture rejected: {0}")]
    Rejected(String),

    /// The pipeline went back to idle without producing a result.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The approve call failed.
    #[error("approve failed: {0}")]
    ApproveFailed(String),

    /// The pipeline never became ready within the attempt budget.
    #[error("timed out waiting for processing")]
    TimedOut,
}

/// What the visitor filled in on the scan page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    /// Kind chosen by the visitor, used when detection is inconclusive.
    pub kind: CreatureKind,
    /// Creature name; empty means `<kind>_creature`.
    pub name: String,
    /// Name of the visitor.
    pub drawer_name: String,
    /// Optional contact number.
    pub phone_number: Option<String>,
}

/// Polling cadence for the status wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionPolicy {
    /// Delay before each status poll.
    pub poll_interval: Duration,
    /// Maximum number of status polls.
    pub max_attempts: u32,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(800),
            max_attempts: 60,
        }
    }
}

/// A creature that made it into the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// Filename assigned by the backend.
    pub filename: String,
    /// Kind it was approved as.
    pub kind: CreatureKind,
}

#[derive(Debug, Deserialize)]
struct ApproveReply {
    #[serde(default)]
    filename: String,
}

/// Run the capture, wait, approve sequence.
///
/// `on_progress` receives a percentage and a status line as the pipeline
/// advances.
pub async fn submit_capture(
    api: &ForestApi,
    image_data: &str,
    request: &SubmissionRequest,
    policy: &SubmissionPolicy,
    mut on_progress: impl FnMut(u32, &str),
) -> Result<SubmissionOutcome, SubmissionError> {
    on_progress(10, "sending capture");
    let capture = CaptureRequest {
        image_data: image_data.to_owned(),
        kind: None,
    };
    let response = api.capture_process(&capture).await;
    if !response.ok {
        let reason = response
            .error_message()
            .unwrap_or("capture could not be sent")
            .to_owned();
        warn!(status = response.status, reason = reason, "capture rejected");
        return Err(SubmissionError::Rejected(reason));
    }
    on_progress(ACCEPTED_PROGRESS, "removing background");

    for attempt in 0..policy.max_attempts {
        tokio::time::sleep(policy.poll_interval).await;

        let response = api.pipeline_status(PipelineQuery::snapshot()).await;
        if !response.ok {
            debug!(attempt = attempt, status = response.status, "status poll failed");
            continue;
        }
        let Some(status) = response.decode::<PipelineStatus>() else {
            continue;
        };
        on_progress(status.progress.max(ACCEPTED_PROGRESS), &status.message);

        match status.state {
            PipelineState::ReadyForReview => {
                let kind = status.detected_kind().unwrap_or(request.kind);
                on_progress(APPROVING_PROGRESS, "saving creature to the forest");
                return approve(api, kind, request).await;
            }
            PipelineState::Idle if status.progress == 0 && attempt > IDLE_GRACE_ATTEMPTS => {
                let reason = if status.message.is_empty() {
                    "processing failed".to_owned()
                } else {
                    status.message
                };
                return Err(SubmissionError::ProcessingFailed(reason));
            }
            _ => {}
        }
    }

    Err(SubmissionError::TimedOut)
}

async fn approve(
    api: &ForestApi,
    kind: CreatureKind,
    request: &SubmissionRequest,
) -> Result<SubmissionOutcome, SubmissionError> {
    let name = if request.name.trim().is_empty() {
        format!("{}_creature", kind.as_str())
    } else {
        request.name.trim().to_owned()
    };
    let body = ApproveRequest {
        kind,
        name,
        drawer_name: request.drawer_name.clone(),
        phone_number: request.phone_number.clone(),
    };
    let response = api.approve(&body).await;
    if !response.ok {
        let reason = response.error_message().unwrap_or("approve failed").to_owned();
        return Err(SubmissionError::ApproveFailed(reason));
    }
    let filename = response
        .decode::<ApproveReply>()
        .map(|reply| reply.filename)
        .unwrap_or_default();
    info!(filename = filename, kind = kind.as_str(), "creature approved");
    Ok(SubmissionOutcome { filename, kind })
}
