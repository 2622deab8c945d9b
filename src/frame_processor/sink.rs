// SPDX-License-Identifier: GPL-3.0-only

//! Result delivery for detection tasks

use super::types::MappedDetection;
use crate::errors::DetectionError;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

/// Receiver of detection task outcomes
///
/// A task that is not cancelled calls either
/// [`on_detection_error`](ResultSink::on_detection_error) once, or
/// [`on_detections_found`](ResultSink::on_detections_found) at most once
/// followed by [`on_detection_task_completed`](ResultSink::on_detection_task_completed).
/// A cancelled task calls nothing.
pub trait ResultSink: Send {
    fn on_detection_error(&mut self, error: DetectionError);

    /// Called only with a non-empty, ordered list
    fn on_detections_found(&mut self, detections: Vec<MappedDetection>);

    /// The task slot is free for the next frame
    fn on_detection_task_completed(&mut self);
}

/// One ResultSink callback as a value
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionEvent {
    Error(DetectionError),
    DetectionsFound(Vec<MappedDetection>),
    TaskCompleted,
}

impl DetectionEvent {
    /// JSON form used by the command-line front end
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            DetectionEvent::Error(error) => serde_json::json!({
                "event": "detectionError",
                "detector": error.detector(),
                "message": error.to_string(),
            }),
            DetectionEvent::DetectionsFound(detections) => serde_json::json!({
                "event": "detectionsFound",
                "detections": detections,
            }),
            DetectionEvent::TaskCompleted => serde_json::json!({
                "event": "detectionTaskCompleted",
            }),
        }
    }
}

/// Forward events to a channel drained on the caller's own context
///
/// If the receiver has been dropped the event is discarded.
impl ResultSink for UnboundedSender<DetectionEvent> {
    fn on_detection_error(&mut self, error: DetectionError) {
        if self.send(DetectionEvent::Error(error)).is_err() {
            warn!("Failed to deliver detection error - channel closed");
        }
    }

    fn on_detections_found(&mut self, detections: Vec<MappedDetection>) {
        if self
            .send(DetectionEvent::DetectionsFound(detections))
            .is_err()
        {
            warn!("Failed to deliver detections - channel closed");
        }
    }

    fn on_detection_task_completed(&mut self) {
        if self.send(DetectionEvent::TaskCompleted).is_err() {
            warn!("Failed to deliver task completion - channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_processor::types::{MappedBounds, MappedDetection};

    #[test]
    fn test_channel_sink_preserves_order() {
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let detection = MappedDetection {
            data: "a".to_string(),
            raw_data: "a".to_string(),
            format: "QR_CODE".to_string(),
            bounds: MappedBounds::default(),
        };

        tx.on_detections_found(vec![detection.clone()]);
        tx.on_detection_task_completed();

        assert_eq!(
            rx.try_recv().unwrap(),
            DetectionEvent::DetectionsFound(vec![detection])
        );
        assert_eq!(rx.try_recv().unwrap(), DetectionEvent::TaskCompleted);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_json() {
        let event = DetectionEvent::Error(DetectionError::DetectorUnavailable {
            detector: "qr".to_string(),
        });
        let json = event.to_json();
        assert_eq!(json["event"], "detectionError");
        assert_eq!(json["detector"], "qr");

        assert_eq!(
            DetectionEvent::TaskCompleted.to_json()["event"],
            "detectionTaskCompleted"
        );
    }

    #[test]
    fn test_closed_channel_does_not_panic() {
        let (mut tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        tx.on_detection_task_completed();
    }
}
