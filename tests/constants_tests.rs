// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use filtercam::constants::{self, snapshot, timing};
use filtercam::filters::FilterMode;

#[test]
fn test_intensity_bounds() {
    assert!(constants::DEFAULT_INTENSITY <= constants::MAX_INTENSITY);
    assert_eq!(constants::MAX_INTENSITY, 100);
}

#[test]
fn test_filter_modes_have_distinct_wire_names() {
    let mut names: Vec<&str> = FilterMode::ALL.iter().map(|m| m.name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), FilterMode::ALL.len());
}

#[test]
fn test_pending_files_are_hidden() {
    assert!(snapshot::PENDING_PREFIX.starts_with('.'));
    assert_eq!(snapshot::MIME_TYPE, "image/jpeg");
}

#[test]
fn test_loop_polls_faster_than_fps_window() {
    assert!(timing::LOOP_POLL_INTERVAL < timing::FPS_WINDOW);
    assert!(timing::SOURCE_FRAME_DURATION < timing::FPS_WINDOW);
}
