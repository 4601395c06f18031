//! # outpaint
//!
//! Iterative outpainting engine for the Stable Diffusion WebUI
//! `sdapi/v1` HTTP API: grows an image strip by strip in any of four
//! directions, stitching each generated band back onto the canvas.
//!
//! The crate supplies the exact crop/pad/mask geometry per direction, an
//! async client for the generation backend (submission, progress polling,
//! interruption, option discovery) and an orchestrator that drives single
//! or consecutive generation cycles with cancellable state transitions.
//! UI layers subscribe to the orchestrator's event channel; nothing here
//! renders or blocks.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use outpaint::{
//!     BackendConfig, Direction, ExpandOutcome, ExpansionOrchestrator, GenerationOptions,
//!     SdWebuiClient,
//! };
//!
//! # async fn example() -> outpaint::Result<()> {
//! let backend = Arc::new(SdWebuiClient::new(BackendConfig::new())?);
//! let (orchestrator, _events) = ExpansionOrchestrator::new(backend);
//!
//! let base = image::open("landscape.png").unwrap().to_rgb8();
//! orchestrator.set_image(base);
//!
//! let options = GenerationOptions::default().with_prompt("rolling hills at dusk");
//! if let ExpandOutcome::Completed(expanded) =
//!     orchestrator.generate(Direction::Right, 192, &options).await?
//! {
//!     expanded.save("landscape_expanded.png").unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod codec;
pub mod compositor;
pub mod config;
pub mod direction;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;

pub use backend::{GenerationBackend, SdWebuiClient};
pub use config::{BackendConfig, Config};
pub use direction::{Direction, EdgeLayout};
pub use error::{OutpaintError, Result};
pub use models::{
    ExpandOutcome, ExpansionEvent, ExpansionJob, GenerationOptions, GenerationStatus, NameKind,
};
pub use orchestrator::ExpansionOrchestrator;

/// Side length of the square working canvas the backend operates on.
pub const CANVAS_SIZE: u32 = 512;
