// SPDX-License-Identifier: GPL-3.0-only

//! Photobooth - capture core for a kiosk photo booth
//!
//! This library drives a booth from countdown to committed photo: it fires
//! the camera, composites overlay frames, generates thumbnails and keeps the
//! photo collection. Filters and props are applied while editing.
//!
//! # Architecture
//!
//! - [`booth`]: Capture orchestrator state machine and event loop
//! - [`backends`]: Camera and lighting collaborators
//! - [`pipelines`]: Compositing, filters, thumbnails and encoding
//! - [`props`]: Draggable prop layer model
//! - [`storage`]: Photo collection store and on-disk archive
//! - [`config`]: Typed booth configuration
//!
//! # Example
//!
//! ```ignore
//! let (tx, rx) = futures::channel::mpsc::channel(16);
//! let mut booth = CaptureOrchestrator::from_config(Config::default());
//! booth.connect()?;
//! let booth = booth.run(rx).await;
//! ```

pub mod backends;
pub mod booth;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod props;
pub mod storage;

// Re-export commonly used types
pub use booth::{BoothState, CaptureOrchestrator, CaptureOutcome, Message};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use pipelines::photo::{FilterParameters, Overlay, PhotoPipeline};
pub use storage::{Photo, PhotoId, PhotoStore};
