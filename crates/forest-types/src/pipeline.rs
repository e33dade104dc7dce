//! Background-removal pipeline status.
//!
//! Served by `GET /api/pipeline_status`. The `version` counter increases on
//! every server-side state change; long-poll callers echo the last version
//! they saw as `since` and treat a non-increasing version as "no news".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::creature::CreatureKind;

/// Server-side pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// A frame is being captured.
    Capturing,
    /// Warp and background removal are running.
    Processing,
    /// A cleaned image is waiting for operator approval.
    ReadyForReview,
    /// An approved creature is being pushed to the forest.
    Syncing,
    /// A state this client does not know about.
    #[serde(other)]
    Unknown,
}

impl PipelineState {
    /// Whether a new capture would be rejected with `409 Conflict`.
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Capturing | Self::Processing | Self::Syncing)
    }
}

/// Long-poll status payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatus {
    /// Current phase.
    #[serde(default)]
    pub state: PipelineState,
    /// Progress percentage (0-100).
    #[serde(default)]
    pub progress: u32,
    /// Human-readable status line.
    #[serde(default)]
    pub message: String,
    /// Preview image of the last cleaned capture, if one exists.
    #[serde(default)]
    pub preview_url: Option<String>,
    /// Kind inferred by the pipeline for the last capture.
    #[serde(default)]
    pub detected_type: Option<String>,
    /// Number of creatures the server believes are live.
    #[serde(default)]
    pub active_entities: u32,
    /// `"forest"` when the count comes from a live viewer report.
    #[serde(default)]
    pub active_entities_source: Option<String>,
    /// Monotonically increasing change counter.
    #[serde(default)]
    pub version: u64,
    /// Any `queue_*` fields the backend adds.
    #[serde(flatten)]
    pub queue: BTreeMap<String, serde_json::Value>,
}

impl PipelineStatus {
    /// Detected kind, if the pipeline reported a placeable one.
    pub fn detected_kind(&self) -> Option<CreatureKind> {
        self.detected_type.as_deref().and_then(CreatureKind::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_status_with_queue_fields() {
        let json = serde_json::json!({
            "state": "READY_FOR_REVIEW",
            "progress": 100,
            "message": "Ready",
            "preview_url": "/static/rmbg_temp.png",
            "detected_type": "Water",
            "active_entities": 4,
            "active_entities_source": "forest",
            "version": 17,
            "queue_length": 2
        });
        let status: PipelineStatus = serde_json::from_value(json).unwrap_or_default();
        assert_eq!(status.state, PipelineState::ReadyForReview);
        assert_eq!(status.version, 17);
        assert_eq!(status.detected_kind(), Some(CreatureKind::Water));
        assert_eq!(status.queue.get("queue_length"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let status: PipelineStatus =
            serde_json::from_value(serde_json::json!({"state": "WARMING_UP"})).unwrap_or_default();
        assert_eq!(status.state, PipelineState::Unknown);
        assert_eq!(status.version, 0);
        assert!(status.detected_kind().is_none());
    }

    #[test]
    fn busy_states() {
        assert!(PipelineState::Processing.is_busy());
        assert!(!PipelineState::ReadyForReview.is_busy());
        assert!(!PipelineState::Idle.is_busy());
    }
}
