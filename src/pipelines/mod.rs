// SPDX-License-Identifier: MPL-2.0

//! Capture pipelines
//!
//! - [`photo`]: snapshot encoding and persistence with provenance

pub mod photo;
