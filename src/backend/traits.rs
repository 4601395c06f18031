use async_trait::async_trait;
use image::RgbImage;

use crate::error::Result;
use crate::models::{ExpansionJob, NameKind};

/// Async boundary to a generation backend. The orchestrator only ever
/// talks through this trait, so its state machine can be exercised
/// against an in-memory double.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Runs one generation job to completion and returns the repainted
    /// canvas. Suspends for as long as the backend takes, up to the
    /// client's long submit timeout.
    async fn submit(&self, job: &ExpansionJob) -> Result<RgbImage>;

    /// Asks the backend to abort its current job. Awaits acknowledgment.
    async fn interrupt(&self) -> Result<()>;

    /// Completion fraction of the current job, or `None` when the backend
    /// reports no active job.
    async fn progress(&self) -> Result<Option<f64>>;

    /// Available sampler/scheduler names. Degrades to an empty list on
    /// any failure; the listing only feeds optional choice lists.
    async fn option_names(&self, kind: NameKind) -> Vec<String>;
}
