// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for frame acquisition
//!
//! The platform camera and its permission handshake live outside this crate.
//! What the rest of the app sees is the [`camera::FrameSource`] trait plus the
//! latest-wins frame slot that feeds the frame processor:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  App Layer                  │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌─────────────────┐  ┌──────────────────┐  │
//! │  │ SyntheticSource │  │ ImageFileSource  │  │
//! │  └─────────────────┘  └──────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```

pub mod camera;
