//! Drives generate cycles against a [`GenerationBackend`]: the
//! idle/generating/cancelling state machine, the consecutive-generation
//! loop, and the concurrent progress poller.
//!
//! The orchestrator owns the current image and the status flag; UI layers
//! subscribe to the event channel and never share mutable state with it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::RgbImage;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::backend::GenerationBackend;
use crate::compositor;
use crate::direction::Direction;
use crate::error::{OutpaintError, Result};
use crate::models::{
    ExpandOutcome, ExpansionEvent, ExpansionJob, GenerationOptions, GenerationStatus,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct ExpansionOrchestrator {
    backend: Arc<dyn GenerationBackend>,
    image: Mutex<Option<RgbImage>>,
    status_tx: watch::Sender<GenerationStatus>,
    status_rx: watch::Receiver<GenerationStatus>,
    events: mpsc::UnboundedSender<ExpansionEvent>,
    canvas_size: u32,
    poll_interval: Duration,
}

impl ExpansionOrchestrator {
    /// Builds an orchestrator over `backend` with the default 512px
    /// working canvas. Returns the receiving end of the event channel;
    /// dropping it is fine for headless use.
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
    ) -> (Self, mpsc::UnboundedReceiver<ExpansionEvent>) {
        Self::with_canvas_size(backend, crate::CANVAS_SIZE)
    }

    pub fn with_canvas_size(
        backend: Arc<dyn GenerationBackend>,
        canvas_size: u32,
    ) -> (Self, mpsc::UnboundedReceiver<ExpansionEvent>) {
        let (status_tx, status_rx) = watch::channel(GenerationStatus::Idle);
        let (events, receiver) = mpsc::unbounded_channel();
        let orchestrator = Self {
            backend,
            image: Mutex::new(None),
            status_tx,
            status_rx,
            events,
            canvas_size,
            poll_interval: DEFAULT_POLL_INTERVAL,
        };
        (orchestrator, receiver)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    pub fn status(&self) -> GenerationStatus {
        *self.status_rx.borrow()
    }

    /// Snapshot of the current canvas.
    pub fn image(&self) -> Option<RgbImage> {
        self.image.lock().ok().and_then(|guard| guard.clone())
    }

    /// Replaces the current canvas, e.g. after loading a file.
    pub fn set_image(&self, image: RgbImage) {
        self.publish_image(&image);
    }

    /// Runs one directional expansion. Invoked while a cycle is already
    /// in flight, this is reinterpreted as a cancellation request.
    pub async fn generate(
        &self,
        direction: Direction,
        generate_width: u32,
        options: &GenerationOptions,
    ) -> Result<ExpandOutcome> {
        self.run(direction, generate_width, options, None).await
    }

    /// Runs `iterations` expansions back to back, feeding each stitched
    /// result into the next step and publishing it as a partial result.
    pub async fn generate_consecutive(
        &self,
        direction: Direction,
        generate_width: u32,
        options: &GenerationOptions,
        iterations: u32,
    ) -> Result<ExpandOutcome> {
        self.run(direction, generate_width, options, Some(iterations))
            .await
    }

    async fn run(
        &self,
        direction: Direction,
        generate_width: u32,
        options: &GenerationOptions,
        iterations: Option<u32>,
    ) -> Result<ExpandOutcome> {
        if !self.try_begin() {
            return self.cancel().await;
        }

        let cycle = Uuid::new_v4();
        let result = self
            .drive(cycle, direction, generate_width, options, iterations)
            .await;
        // Whatever happened, the caller must never be left stuck in
        // generating/cancelling.
        self.set_status(GenerationStatus::Idle);
        match &result {
            Ok(ExpandOutcome::Completed(image)) => log::info!(
                "expansion cycle {} completed, canvas is now {}x{}",
                cycle,
                image.width(),
                image.height()
            ),
            Ok(ExpandOutcome::Cancelled) => log::info!("expansion cycle {} cancelled", cycle),
            Ok(ExpandOutcome::CancelRequested) => {}
            Err(e) => log::error!("expansion cycle {} failed: {}", cycle, e),
        }
        result
    }

    async fn drive(
        &self,
        cycle: Uuid,
        direction: Direction,
        generate_width: u32,
        options: &GenerationOptions,
        iterations: Option<u32>,
    ) -> Result<ExpandOutcome> {
        let mut current = self
            .image()
            .ok_or_else(|| OutpaintError::InvalidArgument("no image loaded".into()))?;

        // The non-growth axis must match the working canvas before any
        // cropping happens.
        if let Some(resized) = compositor::normalize_orthogonal(&current, direction, self.canvas_size)
        {
            log::debug!(
                "resized base image {}x{} -> {}x{}",
                current.width(),
                current.height(),
                resized.width(),
                resized.height()
            );
            current = resized;
            self.publish_image(&current);
        }

        let total = iterations.unwrap_or(1);
        log::info!(
            "expansion cycle {} started: direction={}, strip={}px, iterations={}",
            cycle,
            direction,
            generate_width,
            total
        );
        self.spawn_progress_poller();

        for iteration in 1..=total {
            if iterations.is_some() {
                let _ = self.events.send(ExpansionEvent::IterationStarted {
                    current: iteration,
                    total,
                });
            }
            let stitched = self
                .expand_once(&current, direction, generate_width, options)
                .await?;
            if self.status() == GenerationStatus::Cancelling {
                return Ok(ExpandOutcome::Cancelled);
            }
            current = stitched;
            self.publish_image(&current);
        }
        Ok(ExpandOutcome::Completed(current))
    }

    async fn expand_once(
        &self,
        current: &RgbImage,
        direction: Direction,
        generate_width: u32,
        options: &GenerationOptions,
    ) -> Result<RgbImage> {
        let source = compositor::crop_region(current, direction, self.canvas_size, generate_width)?;
        let job = ExpansionJob {
            source,
            generate_width,
            direction,
            canvas_size: self.canvas_size,
            options: options.clone(),
        };
        let generated = self.backend.submit(&job).await?;
        compositor::concat_images(current, &generated, generate_width, direction)
    }

    /// A generate request that arrived mid-cycle. Flips the status so the
    /// in-flight cycle finalizes as cancelled, then asks the backend to
    /// cut its job short.
    async fn cancel(&self) -> Result<ExpandOutcome> {
        let mut flipped = false;
        self.status_tx.send_if_modified(|status| {
            if *status == GenerationStatus::Generating {
                *status = GenerationStatus::Cancelling;
                flipped = true;
                return true;
            }
            false
        });
        if !flipped {
            // Already cancelling, or the cycle just finished on its own.
            return Ok(ExpandOutcome::CancelRequested);
        }
        let _ = self
            .events
            .send(ExpansionEvent::StatusChanged(GenerationStatus::Cancelling));
        log::info!("cancellation requested, interrupting the backend");
        self.backend.interrupt().await?;
        Ok(ExpandOutcome::CancelRequested)
    }

    /// Atomic idle -> generating transition; false when another cycle is
    /// already active.
    fn try_begin(&self) -> bool {
        let mut entered = false;
        self.status_tx.send_if_modified(|status| {
            if *status == GenerationStatus::Idle {
                *status = GenerationStatus::Generating;
                entered = true;
                return true;
            }
            false
        });
        if entered {
            let _ = self
                .events
                .send(ExpansionEvent::StatusChanged(GenerationStatus::Generating));
        }
        entered
    }

    fn set_status(&self, status: GenerationStatus) {
        let previous = self.status_tx.send_replace(status);
        if previous != status {
            let _ = self.events.send(ExpansionEvent::StatusChanged(status));
        }
    }

    fn publish_image(&self, image: &RgbImage) {
        if let Ok(mut guard) = self.image.lock() {
            *guard = Some(image.clone());
        }
        let _ = self.events.send(ExpansionEvent::ImageUpdated(image.clone()));
    }

    /// Concurrent task republishing backend progress until the status
    /// leaves `generating`.
    fn spawn_progress_poller(&self) {
        let backend = Arc::clone(&self.backend);
        let status = self.status_rx.clone();
        let events = self.events.clone();
        let interval = self.poll_interval;
        tokio::spawn(async move {
            while *status.borrow() == GenerationStatus::Generating {
                match backend.progress().await {
                    Ok(Some(fraction)) => {
                        let _ = events.send(ExpansionEvent::Progress(fraction));
                    }
                    Ok(None) => {}
                    Err(e) => log::debug!("progress poll failed: {}", e),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NameKind;
    use async_trait::async_trait;
    use image::Rgb;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    /// Backend that answers immediately with a solid canvas, or fails.
    struct StubBackend {
        fail: bool,
    }

    #[async_trait]
    impl GenerationBackend for StubBackend {
        async fn submit(&self, job: &ExpansionJob) -> Result<RgbImage> {
            if self.fail {
                return Err(OutpaintError::BackendError {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(RgbImage::from_pixel(
                job.canvas_size,
                job.canvas_size,
                Rgb([10, 20, 30]),
            ))
        }

        async fn interrupt(&self) -> Result<()> {
            Ok(())
        }

        async fn progress(&self) -> Result<Option<f64>> {
            Ok(None)
        }

        async fn option_names(&self, _kind: NameKind) -> Vec<String> {
            Vec::new()
        }
    }

    /// Backend whose submit blocks until `interrupt` (or `release`)
    /// lets it finish, for exercising the cancellation path.
    struct GatedBackend {
        started: Notify,
        release: Notify,
        submits: AtomicU32,
        interrupts: AtomicU32,
    }

    impl GatedBackend {
        fn new() -> Self {
            Self {
                started: Notify::new(),
                release: Notify::new(),
                submits: AtomicU32::new(0),
                interrupts: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerationBackend for GatedBackend {
        async fn submit(&self, job: &ExpansionJob) -> Result<RgbImage> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            Ok(RgbImage::from_pixel(
                job.canvas_size,
                job.canvas_size,
                Rgb([1, 1, 1]),
            ))
        }

        async fn interrupt(&self) -> Result<()> {
            self.interrupts.fetch_add(1, Ordering::SeqCst);
            self.release.notify_one();
            Ok(())
        }

        async fn progress(&self) -> Result<Option<f64>> {
            Ok(None)
        }

        async fn option_names(&self, _kind: NameKind) -> Vec<String> {
            Vec::new()
        }
    }

    fn drain(receiver: &mut mpsc::UnboundedReceiver<ExpansionEvent>) -> Vec<ExpansionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    fn count_image_updates(events: &[ExpansionEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, ExpansionEvent::ImageUpdated(_)))
            .count()
    }

    #[tokio::test]
    async fn completed_cycle_returns_to_idle() {
        let backend = Arc::new(StubBackend { fail: false });
        let (orchestrator, mut events) = ExpansionOrchestrator::new(backend);
        orchestrator.set_image(RgbImage::from_pixel(512, 512, Rgb([5, 5, 5])));
        drain(&mut events);

        let outcome = orchestrator
            .generate(Direction::Right, 192, &GenerationOptions::default())
            .await
            .unwrap();

        match outcome {
            ExpandOutcome::Completed(image) => assert_eq!(image.dimensions(), (704, 512)),
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(orchestrator.status(), GenerationStatus::Idle);

        let seen = drain(&mut events);
        assert_eq!(count_image_updates(&seen), 1);
        assert!(seen.iter().any(|e| matches!(
            e,
            ExpansionEvent::StatusChanged(GenerationStatus::Generating)
        )));
        assert!(seen
            .iter()
            .any(|e| matches!(e, ExpansionEvent::StatusChanged(GenerationStatus::Idle))));
    }

    #[tokio::test]
    async fn nonconforming_image_is_resized_first() {
        let backend = Arc::new(StubBackend { fail: false });
        let (orchestrator, mut events) = ExpansionOrchestrator::new(backend);
        orchestrator.set_image(RgbImage::from_pixel(600, 300, Rgb([5, 5, 5])));
        drain(&mut events);

        let outcome = orchestrator
            .generate(Direction::Right, 192, &GenerationOptions::default())
            .await
            .unwrap();

        // 600x300 -> 1024x512, then +192 along the growth axis.
        match outcome {
            ExpandOutcome::Completed(image) => assert_eq!(image.dimensions(), (1216, 512)),
            other => panic!("expected completion, got {:?}", other),
        }
        let seen = drain(&mut events);
        let first_update = seen
            .iter()
            .find_map(|e| match e {
                ExpansionEvent::ImageUpdated(image) => Some(image.dimensions()),
                _ => None,
            })
            .unwrap();
        assert_eq!(first_update, (1024, 512));
    }

    #[tokio::test]
    async fn failed_cycle_still_returns_to_idle() {
        let backend = Arc::new(StubBackend { fail: true });
        let (orchestrator, _events) = ExpansionOrchestrator::new(backend);
        orchestrator.set_image(RgbImage::from_pixel(512, 512, Rgb([5, 5, 5])));

        let result = orchestrator
            .generate(Direction::Down, 64, &GenerationOptions::default())
            .await;

        assert!(matches!(result, Err(OutpaintError::BackendError { .. })));
        assert_eq!(orchestrator.status(), GenerationStatus::Idle);
        // The failed cycle must not have replaced the visible image.
        assert_eq!(orchestrator.image().unwrap().dimensions(), (512, 512));
    }

    #[tokio::test]
    async fn generate_without_an_image_is_rejected() {
        let backend = Arc::new(StubBackend { fail: false });
        let (orchestrator, _events) = ExpansionOrchestrator::new(backend);

        let result = orchestrator
            .generate(Direction::Up, 64, &GenerationOptions::default())
            .await;

        assert!(matches!(result, Err(OutpaintError::InvalidArgument(_))));
        assert_eq!(orchestrator.status(), GenerationStatus::Idle);
    }

    #[tokio::test]
    async fn consecutive_publishes_one_update_per_iteration() {
        let backend = Arc::new(StubBackend { fail: false });
        let (orchestrator, mut events) = ExpansionOrchestrator::new(backend);
        orchestrator.set_image(RgbImage::from_pixel(512, 512, Rgb([5, 5, 5])));
        drain(&mut events);

        let outcome = orchestrator
            .generate_consecutive(Direction::Right, 64, &GenerationOptions::default(), 3)
            .await
            .unwrap();

        match outcome {
            ExpandOutcome::Completed(image) => assert_eq!(image.dimensions(), (704, 512)),
            other => panic!("expected completion, got {:?}", other),
        }
        let seen = drain(&mut events);
        assert_eq!(count_image_updates(&seen), 3);
        let iterations: Vec<_> = seen
            .iter()
            .filter_map(|e| match e {
                ExpansionEvent::IterationStarted { current, total } => Some((*current, *total)),
                _ => None,
            })
            .collect();
        assert_eq!(iterations, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn second_invocation_cancels_the_first() {
        let backend = Arc::new(GatedBackend::new());
        let (orchestrator, _events) = ExpansionOrchestrator::new(backend.clone());
        orchestrator.set_image(RgbImage::from_pixel(512, 512, Rgb([5, 5, 5])));
        let orchestrator = Arc::new(orchestrator);

        let in_flight = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move {
                orchestrator
                    .generate(Direction::Right, 192, &GenerationOptions::default())
                    .await
            }
        });

        backend.started.notified().await;
        assert_eq!(orchestrator.status(), GenerationStatus::Generating);

        let cancel = orchestrator
            .generate(Direction::Right, 192, &GenerationOptions::default())
            .await
            .unwrap();
        assert!(matches!(cancel, ExpandOutcome::CancelRequested));
        assert_eq!(backend.interrupts.load(Ordering::SeqCst), 1);

        let outcome = in_flight.await.unwrap().unwrap();
        assert!(matches!(outcome, ExpandOutcome::Cancelled));
        assert_eq!(orchestrator.status(), GenerationStatus::Idle);
        // The cancelled stitch was discarded.
        assert_eq!(orchestrator.image().unwrap().dimensions(), (512, 512));
    }

    #[tokio::test]
    async fn cancelled_consecutive_run_stops_before_the_next_submit() {
        let backend = Arc::new(GatedBackend::new());
        let (orchestrator, _events) = ExpansionOrchestrator::new(backend.clone());
        orchestrator.set_image(RgbImage::from_pixel(512, 512, Rgb([5, 5, 5])));
        let orchestrator = Arc::new(orchestrator);

        let in_flight = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move {
                orchestrator
                    .generate_consecutive(Direction::Right, 64, &GenerationOptions::default(), 5)
                    .await
            }
        });

        backend.started.notified().await;
        let cancel = orchestrator
            .generate(Direction::Right, 64, &GenerationOptions::default())
            .await
            .unwrap();
        assert!(matches!(cancel, ExpandOutcome::CancelRequested));

        let outcome = in_flight.await.unwrap().unwrap();
        assert!(matches!(outcome, ExpandOutcome::Cancelled));
        assert_eq!(orchestrator.status(), GenerationStatus::Idle);
        assert_eq!(backend.submits.load(Ordering::SeqCst), 1);
    }
}
