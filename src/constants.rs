// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Prefix of every snapshot file name written by the app
pub const DEFAULT_APP_PREFIX: &str = "FilterCam";

/// Album (subfolder of the pictures directory) reserved for this app
pub const DEFAULT_ALBUM: &str = "FilterCam";

/// Default filter intensity (0-100)
pub const DEFAULT_INTENSITY: u8 = 50;

/// Upper bound for filter intensity
pub const MAX_INTENSITY: u8 = 100;

/// Snapshot storage constants
pub mod snapshot {
    /// MIME type of persisted snapshots
    pub const MIME_TYPE: &str = "image/jpeg";

    /// File extension of persisted snapshots
    pub const EXTENSION: &str = "jpg";

    /// Timestamp layout used in artifact names (millisecond suffix)
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

    /// Prefix marking staged (not yet finalized) files
    pub const PENDING_PREFIX: &str = ".pending-";

    /// Suffix of provenance sidecar files
    pub const SIDECAR_SUFFIX: &str = ".json";
}

/// Provenance tag values embedded next to each snapshot
pub mod tags {
    /// Make tag
    pub const MAKE: &str = "FilterCam";

    /// Model tag
    pub const MODEL: &str = "Live filter camera";

    /// Software tag (version appended at runtime)
    pub fn software() -> String {
        format!("filtercam {}", super::app_info::version())
    }
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Window over which frames-per-second is measured
    pub const FPS_WINDOW: Duration = Duration::from_secs(1);

    /// How often idle loops re-check their stop signal
    pub const LOOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// Frame cadence of the built-in test sources (~30fps)
    pub const SOURCE_FRAME_DURATION: Duration = Duration::from_millis(33);

    /// Default warm-up before a one-shot CLI capture
    pub const CAPTURE_WARMUP: Duration = Duration::from_millis(500);
}

/// Synthetic source defaults
pub mod synthetic {
    /// Default test pattern width
    pub const WIDTH: u32 = 640;

    /// Default test pattern height
    pub const HEIGHT: u32 = 480;
}

/// Supported file formats for the image file source
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
