// SPDX-License-Identifier: GPL-3.0-only

//! Hardware collaborators consumed by the booth
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            Capture Orchestrator              │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │     Camera       │  │    Lighting     │  │
//! │  │ file/V4L2/Pi/DSLR│  │  sysfs LEDs     │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Both collaborators are injected into the orchestrator as trait objects with
//! an explicit `connect`/`disconnect` lifecycle, so tests can swap in doubles.
//!
//! # Modules
//!
//! - [`camera`]: Still acquisition from the configured source
//! - [`lighting`]: Best-effort auxiliary lighting control

pub mod camera;
pub mod lighting;
