// SPDX-License-Identifier: MPL-2.0

//! Snapshot naming and provenance records

use crate::constants::{snapshot, tags};
use crate::filters::{FilterConfig, FilterMode, Intensity};
use crate::storage::ArtifactId;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which filter produced a snapshot, and when
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub mode: FilterMode,
    pub intensity: Intensity,
    pub created_at: DateTime<Utc>,
}

impl Provenance {
    pub fn new(config: FilterConfig, created_at: DateTime<Utc>) -> Self {
        Self {
            mode: config.mode,
            intensity: config.intensity,
            created_at,
        }
    }

    pub fn config(&self) -> FilterConfig {
        FilterConfig {
            mode: self.mode,
            intensity: self.intensity,
        }
    }
}

/// Descriptive tags attached next to the image, EXIF style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceTags {
    pub software: String,
    pub make: String,
    pub model: String,
    pub user_comment: String,
}

impl ProvenanceTags {
    pub fn for_config(config: FilterConfig) -> Self {
        Self {
            software: tags::software(),
            make: tags::MAKE.to_string(),
            model: tags::MODEL.to_string(),
            user_comment: user_comment(config),
        }
    }
}

/// Everything attached to a finalized artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub provenance: Provenance,
    pub tags: ProvenanceTags,
}

/// A persisted snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotArtifact {
    pub id: ArtifactId,
    /// File name as stored, after any de-duplication
    pub name: String,
    pub provenance: Provenance,
}

impl fmt::Display for SnapshotArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {})",
            self.name, self.provenance.mode, self.provenance.intensity
        )
    }
}

/// `Filter=CARTOON, Intensity=70`
pub fn user_comment(config: FilterConfig) -> String {
    format!("Filter={}, Intensity={}", config.mode.name(), config.intensity)
}

/// `{prefix}_{MODE}_{intensity}_{YYYYMMDD_HHMMSS_mmm}.jpg`
pub fn artifact_name<Tz>(prefix: &str, config: FilterConfig, timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!(
        "{}_{}_{}_{}.{}",
        prefix,
        config.mode.name(),
        config.intensity,
        timestamp.format(snapshot::TIMESTAMP_FORMAT),
        snapshot::EXTENSION
    )
}

/// Recover mode and intensity from an artifact name
///
/// Used when an artifact has no attached metadata.
pub fn parse_artifact_name(name: &str) -> Option<FilterConfig> {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let parts: Vec<&str> = stem.split('_').collect();
    parts.windows(2).skip(1).find_map(|pair| {
        let mode = FilterMode::ALL.into_iter().find(|m| m.name() == pair[0])?;
        let intensity: u8 = pair[1].parse().ok()?;
        (intensity <= Intensity::MAX.value()).then(|| FilterConfig::new(mode, intensity.into()))
    })
}
