// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! All heavy image work runs in background tasks so the booth's countdown
//! and preview timers are never held up by decoding or encoding.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Still │ ──▶ │  Photo Pipeline   │ ──▶ │ Photo Record │
//! │  (JPEG)      │     │  - Overlays       │     │  + Thumbnail │
//! │              │     │  - Encoding       │     │              │
//! │              │     │  - Thumbnail      │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Capture, compositing, filters, thumbnails and encoding

pub mod photo;
