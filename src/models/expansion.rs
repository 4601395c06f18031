use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::{OutpaintError, Result};
use crate::models::generation::GenerationOptions;

/// Everything one network round trip needs: the cropped source band, how
/// far to grow, and the resolved options. Transient, never persisted.
#[derive(Debug, Clone)]
pub struct ExpansionJob {
    pub source: RgbImage,
    pub generate_width: u32,
    pub direction: Direction,
    pub canvas_size: u32,
    pub options: GenerationOptions,
}

impl ExpansionJob {
    pub fn validate(&self) -> Result<()> {
        if self.generate_width == 0 || self.generate_width >= self.canvas_size {
            return Err(OutpaintError::InvalidArgument(format!(
                "generate width {} outside (0, {})",
                self.generate_width, self.canvas_size
            )));
        }
        let (width, height) = self.source.dimensions();
        if width > self.canvas_size || height > self.canvas_size {
            return Err(OutpaintError::InvalidArgument(format!(
                "source {}x{} exceeds the {}px canvas",
                width, height, self.canvas_size
            )));
        }
        self.options.validate()
    }
}

/// Where the orchestrator currently is in its generate cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Idle,
    Generating,
    Cancelling,
}

impl GenerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationStatus::Idle => "idle",
            GenerationStatus::Generating => "generating",
            GenerationStatus::Cancelling => "cancelling",
        }
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications published on the orchestrator's event channel. The UI
/// layer is purely a subscriber of these.
#[derive(Debug, Clone)]
pub enum ExpansionEvent {
    StatusChanged(GenerationStatus),
    /// Backend-reported completion fraction in [0, 1].
    Progress(f64),
    /// The visible canvas changed: a resize, or a completed stitch.
    ImageUpdated(RgbImage),
    IterationStarted { current: u32, total: u32 },
}

/// How a generate cycle ended. Failures travel as `Err` instead.
#[derive(Debug, Clone)]
pub enum ExpandOutcome {
    Completed(RgbImage),
    /// The cycle observed a cancellation request; the stitched result of
    /// the cancelled step was discarded. Partial results of earlier
    /// iterations were already delivered as `ImageUpdated` events.
    Cancelled,
    /// This call arrived mid-generation and was reinterpreted as a
    /// cancellation request; the in-flight cycle reports the final state.
    CancelRequested,
}
