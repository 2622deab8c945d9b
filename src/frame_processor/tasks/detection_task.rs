// SPDX-License-Identifier: GPL-3.0-only

//! One-shot, cancellable detection task
//!
//! A [`DetectionTask`] owns one frame and the geometry of the view it will be
//! drawn into. Running it calls the detector on tokio's blocking pool, maps
//! every result into view space and hands the outcome to a [`ResultSink`].
//!
//! Cancellation is cooperative. The flag is checked right before the
//! detector is invoked and again before anything is delivered; a detector
//! call already in progress always runs to completion, but its results are
//! dropped if the task was cancelled in the meantime.

use crate::backends::camera::types::Frame;
use crate::errors::DetectionError;
use crate::frame_processor::bounds::{BoundsMapper, CropOffset};
use crate::frame_processor::detector::Detector;
use crate::frame_processor::geometry::{ImageDimensions, ScaleFactors, ViewGeometry};
use crate::frame_processor::sink::ResultSink;
use crate::frame_processor::types::MappedDetection;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Identity reported when a task was built without a detector
pub const MISSING_DETECTOR: &str = "<none>";

/// Lifecycle of a detection task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    Pending = 0,
    Running = 1,
    Cancelled = 2,
    Completed = 3,
    Failed = 4,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => TaskState::Pending,
            1 => TaskState::Running,
            2 => TaskState::Cancelled,
            3 => TaskState::Completed,
            _ => TaskState::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Cancelled | TaskState::Completed | TaskState::Failed
        )
    }
}

#[derive(Debug)]
struct TaskControl {
    cancelled: AtomicBool,
    state: AtomicU8,
}

impl TaskControl {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            state: AtomicU8::new(TaskState::Pending as u8),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Pending -> Running; false if the task may not start
    fn begin(&self) -> bool {
        self.state
            .compare_exchange(
                TaskState::Pending as u8,
                TaskState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    fn finish(&self, state: TaskState) -> TaskState {
        self.state.store(state as u8, Ordering::Release);
        state
    }

    /// Running -> Cancelled for a task whose future went away mid-flight
    fn abandon(&self) -> bool {
        let abandoned = self
            .state
            .compare_exchange(
                TaskState::Running as u8,
                TaskState::Cancelled as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if abandoned {
            self.cancelled.store(true, Ordering::Release);
        }
        abandoned
    }
}

/// Keeps a dropped `run` future from leaving the task in `Running`
struct RunGuard(Arc<TaskControl>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.0.abandon() {
            debug!("Detection task dropped while running");
        }
    }
}

/// Shared handle for observing and cancelling a task
#[derive(Debug, Clone)]
pub struct TaskHandle {
    control: Arc<TaskControl>,
}

impl TaskHandle {
    /// Request cancellation
    ///
    /// Idempotent. The flag is always set, but it does not change the state
    /// of a terminal task.
    pub fn cancel(&self) {
        if !self.control.cancelled.swap(true, Ordering::AcqRel) {
            debug!(state = ?self.control.state(), "Detection task cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.is_cancelled()
    }

    pub fn state(&self) -> TaskState {
        self.control.state()
    }
}

/// Result of the background part of a task
enum Outcome {
    Cancelled,
    Failed(DetectionError),
    Completed(Vec<MappedDetection>),
}

/// A single frame's detection, from detector invocation to delivery
pub struct DetectionTask {
    frame: Frame,
    view: ViewGeometry,
    detector: Option<Arc<dyn Detector>>,
    dimensions: ImageDimensions,
    mapper: BoundsMapper,
    control: Arc<TaskControl>,
}

impl DetectionTask {
    /// Build a task, deriving the per-frame geometry once
    pub fn new(frame: Frame, view: ViewGeometry, detector: Option<Arc<dyn Detector>>) -> Self {
        let dimensions =
            ImageDimensions::compute(frame.width(), frame.height(), frame.rotation(), frame.facing());
        let scale = ScaleFactors::new(&dimensions, &view);
        let mapper = BoundsMapper::new(
            CropOffset::from(frame.crop()),
            frame.rotation(),
            frame.width(),
            frame.height(),
            view.padding(),
            scale,
        );

        Self {
            frame,
            view,
            detector,
            dimensions,
            mapper,
            control: Arc::new(TaskControl::new()),
        }
    }

    pub fn handle(&self) -> TaskHandle {
        TaskHandle {
            control: Arc::clone(&self.control),
        }
    }

    pub fn image_dimensions(&self) -> ImageDimensions {
        self.dimensions
    }

    pub fn scale(&self) -> ScaleFactors {
        self.mapper.scale()
    }

    pub fn view(&self) -> ViewGeometry {
        self.view
    }

    /// Run the task on the current tokio runtime
    ///
    /// Returns a handle for cancellation together with the join handle that
    /// resolves to the terminal state.
    pub fn spawn<S>(self, sink: S) -> (TaskHandle, JoinHandle<TaskState>)
    where
        S: ResultSink + 'static,
    {
        let handle = self.handle();
        let join = tokio::spawn(self.run(sink));
        (handle, join)
    }

    /// Run the task to a terminal state, delivering at most one outcome
    pub async fn run<S: ResultSink>(self, mut sink: S) -> TaskState {
        let control = Arc::clone(&self.control);

        if control.is_cancelled() || !control.begin() {
            debug!("Detection task cancelled before start");
            return control.finish(TaskState::Cancelled);
        }
        let _guard = RunGuard(Arc::clone(&control));

        let outcome = self.execute().await;

        // Results of an abandoned task are never delivered
        if control.is_cancelled() {
            debug!("Detection task cancelled, dropping outcome");
            return control.finish(TaskState::Cancelled);
        }

        match outcome {
            Outcome::Cancelled => control.finish(TaskState::Cancelled),
            Outcome::Failed(error) => {
                warn!(detector = error.detector(), error = %error, "Detection task failed");
                sink.on_detection_error(error);
                control.finish(TaskState::Failed)
            }
            Outcome::Completed(detections) => {
                if !detections.is_empty() {
                    debug!(count = detections.len(), "Delivering detections");
                    sink.on_detections_found(detections);
                }
                sink.on_detection_task_completed();
                control.finish(TaskState::Completed)
            }
        }
    }

    async fn execute(self) -> Outcome {
        let DetectionTask {
            frame,
            detector,
            mapper,
            control,
            ..
        } = self;

        let identity = detector
            .as_ref()
            .map(|d| d.name().to_string())
            .unwrap_or_else(|| MISSING_DETECTOR.to_string());

        let joined = tokio::task::spawn_blocking(move || {
            if control.is_cancelled() {
                return Outcome::Cancelled;
            }

            let Some(detector) = detector else {
                return Outcome::Failed(DetectionError::DetectorUnavailable {
                    detector: MISSING_DETECTOR.to_string(),
                });
            };
            if !detector.is_operational() {
                return Outcome::Failed(DetectionError::DetectorUnavailable {
                    detector: detector.name().to_string(),
                });
            }

            let start = std::time::Instant::now();
            let raw = match detector.detect(&frame) {
                Ok(raw) => raw,
                Err(e) => {
                    return Outcome::Failed(DetectionError::DetectionFailed {
                        detector: detector.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            };

            debug!(
                detector = detector.name(),
                count = raw.len(),
                detect_ms = start.elapsed().as_millis(),
                frame_age_ms = frame.captured_at().elapsed().as_millis(),
                "Detector returned"
            );

            let mapped = raw
                .iter()
                .map(|detection| {
                    let mapped = mapper.map_detection(detection);
                    trace!(
                        left = detection.bounds.left,
                        top = detection.bounds.top,
                        x = mapped.bounds.origin.x,
                        y = mapped.bounds.origin.y,
                        width = mapped.bounds.size.width,
                        height = mapped.bounds.size.height,
                        "Mapped detection bounds"
                    );
                    mapped
                })
                .collect();

            Outcome::Completed(mapped)
        })
        .await;

        joined.unwrap_or_else(|e| {
            warn!(error = %e, "Detection worker panicked");
            Outcome::Failed(DetectionError::DetectionFailed {
                detector: identity,
                reason: format!("detector panicked: {}", e),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{CameraFacing, CropRect};
    use crate::errors::DetectorError;
    use crate::frame_processor::geometry::ViewPadding;
    use crate::frame_processor::scheduler::AnalysisSlot;
    use crate::frame_processor::sink::DetectionEvent;
    use crate::frame_processor::types::{
        BarcodeFormat, BoundingBox, DetectionPayload, RawDetection,
    };
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    struct FixedDetector {
        operational: bool,
        result: Result<Vec<RawDetection>, DetectorError>,
        calls: AtomicUsize,
    }

    impl FixedDetector {
        fn returning(detections: Vec<RawDetection>) -> Self {
            Self {
                operational: true,
                result: Ok(detections),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Detector for FixedDetector {
        fn name(&self) -> &str {
            "fixed"
        }

        fn is_operational(&self) -> bool {
            self.operational
        }

        fn detect(&self, _frame: &Frame) -> Result<Vec<RawDetection>, DetectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    /// Blocks inside `detect` until released by the test
    struct GatedDetector {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Detector for GatedDetector {
        fn name(&self) -> &str {
            "gated"
        }

        fn detect(&self, _frame: &Frame) -> Result<Vec<RawDetection>, DetectorError> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
            Ok(vec![qr(0, 0, 10, 10, "late")])
        }
    }

    struct PanickingDetector;

    impl Detector for PanickingDetector {
        fn name(&self) -> &str {
            "panicky"
        }

        fn detect(&self, _frame: &Frame) -> Result<Vec<RawDetection>, DetectorError> {
            panic!("engine crashed");
        }
    }

    fn qr(left: i32, top: i32, width: i32, height: i32, text: &str) -> RawDetection {
        RawDetection::new(
            BoundingBox::new(left, top, width, height),
            DetectionPayload::text(text, BarcodeFormat::QrCode),
        )
    }

    fn portrait_task(detector: Option<Arc<dyn Detector>>) -> DetectionTask {
        let frame = Frame::new(
            vec![0u8; 480 * 640],
            640,
            480,
            CropRect::new(0, 0, 480, 640),
            90,
            CameraFacing::Back,
        )
        .unwrap();
        let view = ViewGeometry::new(480, 640, 1.0, ViewPadding::default()).unwrap();
        DetectionTask::new(frame, view, detector)
    }

    fn drain(rx: &mut UnboundedReceiver<DetectionEvent>) -> Vec<DetectionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_geometry_derived_once() {
        let task = portrait_task(None);
        let dims = task.image_dimensions();
        assert_eq!((dims.width(), dims.height()), (480, 640));
        assert_eq!(task.scale(), ScaleFactors::identity());
    }

    #[tokio::test]
    async fn test_detections_then_completed() {
        let detector = Arc::new(FixedDetector::returning(vec![
            qr(10, 20, 30, 40, "first"),
            qr(300, 400, 5, 5, "second"),
        ]));
        let (tx, mut rx) = unbounded_channel();

        let state = portrait_task(Some(detector)).run(tx).await;

        assert_eq!(state, TaskState::Completed);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        match &events[0] {
            DetectionEvent::DetectionsFound(found) => {
                assert_eq!(found.len(), 2);
                assert_eq!(found[0].data, "first");
                assert_eq!(found[0].bounds.origin.x, 10.0);
                assert_eq!(found[0].bounds.origin.y, 20.0);
                assert_eq!(found[0].bounds.size.width, 30.0);
                assert_eq!(found[0].bounds.size.height, 40.0);
                assert_eq!(found[1].data, "second");
            }
            other => panic!("Expected detections, got {:?}", other),
        }
        assert_eq!(events[1], DetectionEvent::TaskCompleted);
    }

    #[tokio::test]
    async fn test_empty_result_only_completes() {
        let detector = Arc::new(FixedDetector::returning(Vec::new()));
        let (tx, mut rx) = unbounded_channel();

        let state = portrait_task(Some(detector)).run(tx).await;

        assert_eq!(state, TaskState::Completed);
        assert_eq!(drain(&mut rx), vec![DetectionEvent::TaskCompleted]);
    }

    #[tokio::test]
    async fn test_non_operational_detector_fails_once() {
        let detector = Arc::new(FixedDetector {
            operational: false,
            result: Ok(vec![qr(0, 0, 1, 1, "never")]),
            calls: AtomicUsize::new(0),
        });
        let (tx, mut rx) = unbounded_channel();

        let state = portrait_task(Some(detector.clone())).run(tx).await;

        assert_eq!(state, TaskState::Failed);
        assert_eq!(
            drain(&mut rx),
            vec![DetectionEvent::Error(DetectionError::DetectorUnavailable {
                detector: "fixed".to_string()
            })]
        );
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_detector_fails() {
        let (tx, mut rx) = unbounded_channel();

        let state = portrait_task(None).run(tx).await;

        assert_eq!(state, TaskState::Failed);
        assert_eq!(
            drain(&mut rx),
            vec![DetectionEvent::Error(DetectionError::DetectorUnavailable {
                detector: MISSING_DETECTOR.to_string()
            })]
        );
    }

    #[tokio::test]
    async fn test_detector_error_is_reported() {
        let detector = Arc::new(FixedDetector {
            operational: true,
            result: Err(DetectorError::Engine("model missing".to_string())),
            calls: AtomicUsize::new(0),
        });
        let (tx, mut rx) = unbounded_channel();

        let state = portrait_task(Some(detector)).run(tx).await;

        assert_eq!(state, TaskState::Failed);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            DetectionEvent::Error(DetectionError::DetectionFailed { detector, .. }) if detector == "fixed"
        ));
    }

    #[tokio::test]
    async fn test_panicking_detector_is_contained() {
        let (tx, mut rx) = unbounded_channel();

        let state = portrait_task(Some(Arc::new(PanickingDetector))).run(tx).await;

        assert_eq!(state, TaskState::Failed);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            DetectionEvent::Error(error) => assert_eq!(error.detector(), "panicky"),
            other => panic!("Expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancel_before_start_delivers_nothing() {
        let detector = Arc::new(FixedDetector::returning(vec![qr(0, 0, 1, 1, "x")]));
        let task = portrait_task(Some(detector.clone()));
        let handle = task.handle();
        assert_eq!(handle.state(), TaskState::Pending);
        handle.cancel();

        let (tx, mut rx) = unbounded_channel();
        let state = task.run(tx).await;

        assert_eq!(state, TaskState::Cancelled);
        assert_eq!(handle.state(), TaskState::Cancelled);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_during_detection_drops_results() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let detector = Arc::new(GatedDetector {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });

        let (tx, mut rx) = unbounded_channel();
        let (handle, join) = portrait_task(Some(detector)).spawn(tx);

        // Wait until the detector call is in flight
        tokio::task::spawn_blocking(move || entered_rx.recv().unwrap())
            .await
            .unwrap();
        assert_eq!(handle.state(), TaskState::Running);

        handle.cancel();
        release_tx.send(()).unwrap();

        let state = join.await.unwrap();
        assert_eq!(state, TaskState::Cancelled);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_aborted_task_frees_slot() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let detector = Arc::new(GatedDetector {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });

        let mut slot = AnalysisSlot::new(Duration::ZERO);
        assert!(slot.try_begin(Instant::now()));
        let (tx, mut rx) = unbounded_channel();
        let (handle, join) = portrait_task(Some(detector)).spawn(tx);
        slot.track(handle.clone());

        tokio::task::spawn_blocking(move || entered_rx.recv().unwrap())
            .await
            .unwrap();
        assert_eq!(handle.state(), TaskState::Running);
        assert!(slot.is_busy());

        join.abort();
        assert!(join.await.unwrap_err().is_cancelled());

        assert_eq!(handle.state(), TaskState::Cancelled);
        assert!(handle.is_cancelled());
        assert!(!slot.is_busy());
        assert!(slot.try_begin(Instant::now()));

        release_tx.send(()).unwrap();
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_cancel_after_completion_is_noop() {
        let detector = Arc::new(FixedDetector::returning(Vec::new()));
        let task = portrait_task(Some(detector));
        let handle = task.handle();
        let (tx, _rx) = unbounded_channel();

        assert_eq!(task.run(tx).await, TaskState::Completed);
        handle.cancel();
        assert_eq!(handle.state(), TaskState::Completed);
        assert!(handle.is_cancelled());
    }
}
