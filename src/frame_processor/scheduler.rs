// SPDX-License-Identifier: GPL-3.0-only

//! Single-flight frame sampling for one camera stream
//!
//! Detection tasks do not queue or reject work themselves. A stream that
//! feeds frames into detection keeps one [`AnalysisSlot`] and asks it before
//! building each task: only one task may be in flight, and frames are
//! sampled no more often than the configured interval.

use super::tasks::detection_task::TaskHandle;
use std::time::{Duration, Instant};
use tracing::debug;

/// Tracks the in-flight detection task for a stream
#[derive(Debug)]
pub struct AnalysisSlot {
    min_interval: Duration,
    in_flight: Option<TaskHandle>,
    last_submitted: Option<Instant>,
}

impl AnalysisSlot {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            in_flight: None,
            last_submitted: None,
        }
    }

    /// Whether a task is in flight and has not reached a terminal state
    pub fn is_busy(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|handle| !handle.state().is_terminal())
    }

    /// Claim the slot for a new frame captured at `now`
    ///
    /// Returns false while a task is in flight or when less than the minimum
    /// interval has passed since the last claim.
    pub fn try_begin(&mut self, now: Instant) -> bool {
        if self.is_busy() {
            return false;
        }
        if let Some(last) = self.last_submitted
            && now.saturating_duration_since(last) < self.min_interval
        {
            return false;
        }

        self.in_flight = None;
        self.last_submitted = Some(now);
        true
    }

    /// Remember the task started after a successful [`try_begin`](Self::try_begin)
    pub fn track(&mut self, handle: TaskHandle) {
        self.in_flight = Some(handle);
    }

    /// Replace the in-flight task with a newer one submitted at `now`,
    /// cancelling the old task
    pub fn supersede(&mut self, handle: TaskHandle, now: Instant) {
        if let Some(previous) = self.in_flight.replace(handle) {
            debug!("Superseding in-flight detection task");
            previous.cancel();
        }
        self.last_submitted = Some(now);
    }

    /// Free the slot once the task reported completion or an error
    pub fn release(&mut self) {
        self.in_flight = None;
    }

    /// Cancel the in-flight task, e.g. when the preview is torn down
    pub fn cancel(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            debug!("Cancelling in-flight detection task");
            handle.cancel();
        }
    }
}

impl Drop for AnalysisSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{CameraFacing, Frame};
    use crate::frame_processor::geometry::{ViewGeometry, ViewPadding};
    use crate::frame_processor::tasks::detection_task::{DetectionTask, TaskState};

    fn task() -> DetectionTask {
        let frame = Frame::uncropped(vec![0u8; 16], 4, 4, 0, CameraFacing::Back).unwrap();
        let view = ViewGeometry::new(4, 4, 1.0, ViewPadding::default()).unwrap();
        DetectionTask::new(frame, view, None)
    }

    #[test]
    fn test_single_flight() {
        let mut slot = AnalysisSlot::new(Duration::ZERO);
        let now = Instant::now();

        assert!(slot.try_begin(now));
        let task = task();
        slot.track(task.handle());
        assert!(slot.is_busy());
        assert!(!slot.try_begin(now));

        slot.release();
        assert!(slot.try_begin(now));
    }

    #[test]
    fn test_min_interval() {
        let mut slot = AnalysisSlot::new(Duration::from_secs(1));
        let now = Instant::now();

        assert!(slot.try_begin(now));
        assert!(!slot.try_begin(now + Duration::from_millis(500)));
        assert!(slot.try_begin(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_cancel_marks_task_cancelled() {
        let mut slot = AnalysisSlot::new(Duration::ZERO);
        let task = task();
        let handle = task.handle();

        assert!(slot.try_begin(Instant::now()));
        slot.track(task.handle());
        slot.cancel();

        assert!(handle.is_cancelled());
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_supersede_cancels_previous() {
        let mut slot = AnalysisSlot::new(Duration::ZERO);
        let older = task();
        let newer = task();

        slot.track(older.handle());
        slot.supersede(newer.handle(), Instant::now());

        assert!(older.handle().is_cancelled());
        assert!(!newer.handle().is_cancelled());
        assert!(slot.is_busy());
    }

    #[test]
    fn test_supersede_restarts_interval_at_given_time() {
        let mut slot = AnalysisSlot::new(Duration::from_secs(1));
        let start = Instant::now();
        let superseded_at = start + Duration::from_secs(5);

        assert!(slot.try_begin(start));
        slot.supersede(task().handle(), superseded_at);
        slot.release();

        assert!(!slot.try_begin(superseded_at + Duration::from_millis(999)));
        assert!(slot.try_begin(superseded_at + Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_terminal_task_frees_slot() {
        let mut slot = AnalysisSlot::new(Duration::ZERO);
        let task = task();
        assert!(slot.try_begin(Instant::now()));
        slot.track(task.handle());

        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        assert_eq!(task.run(tx).await, TaskState::Failed);

        assert!(!slot.is_busy());
        assert!(slot.try_begin(Instant::now()));
    }
}
