// SPDX-License-Identifier: MPL-2.0

//! Snapshot capture
//!
//! Takes the latest processed frame without interrupting the preview stream,
//! then encodes and persists it on the blocking pool.

use super::encoding::{EncodingQuality, PhotoEncoder};
use super::processing::frame_to_rgb;
use super::provenance::{
    ArtifactMetadata, Provenance, ProvenanceTags, SnapshotArtifact, artifact_name,
};
use crate::app::frame_processor::LatestFrame;
use crate::backends::camera::types::Frame;
use crate::constants::snapshot;
use crate::errors::CaptureError;
use crate::storage::ArtifactStore;
use chrono::{Local, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a successful capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReceipt {
    pub artifact: SnapshotArtifact,
    /// False when the snapshot was saved but provenance could not be attached
    pub metadata_attached: bool,
}

/// Persists snapshots of the live preview
pub struct CaptureService {
    latest: LatestFrame,
    store: Arc<dyn ArtifactStore>,
    encoder: PhotoEncoder,
    prefix: String,
    namespace: String,
}

impl CaptureService {
    pub fn new(
        latest: LatestFrame,
        store: Arc<dyn ArtifactStore>,
        prefix: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            latest,
            store,
            encoder: PhotoEncoder::new(),
            prefix: prefix.into(),
            namespace: namespace.into(),
        }
    }

    pub fn with_quality(mut self, quality: EncodingQuality) -> Self {
        self.encoder = self.encoder.with_quality(quality);
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Save the frame currently on screen
    ///
    /// The frame is copied when this is called; frames processed while the
    /// capture is in flight do not affect it.
    pub async fn capture(&self) -> Result<CaptureReceipt, CaptureError> {
        let processed = self
            .latest
            .snapshot()
            .ok_or(CaptureError::NoFrameAvailable)?;

        let frame = processed.frame.detached();
        let created_at = Utc::now();
        let provenance = Provenance::new(processed.applied, created_at);
        let name = artifact_name(
            &self.prefix,
            processed.applied,
            &created_at.with_timezone(&Local),
        );
        drop(processed);

        info!(
            name = %name,
            width = frame.width,
            height = frame.height,
            sequence = frame.sequence,
            "Capturing snapshot"
        );

        let store = Arc::clone(&self.store);
        let encoder = self.encoder;
        let namespace = self.namespace.clone();

        tokio::task::spawn_blocking(move || {
            persist(store.as_ref(), encoder, &frame, &name, &namespace, provenance)
        })
        .await
        .map_err(|e| CaptureError::TaskFailed(e.to_string()))?
    }
}

/// Encode, stage, finalize, then attach provenance
fn persist(
    store: &dyn ArtifactStore,
    encoder: PhotoEncoder,
    frame: &Frame,
    name: &str,
    namespace: &str,
    provenance: Provenance,
) -> Result<CaptureReceipt, CaptureError> {
    let rgb = frame_to_rgb(frame)?;
    let encoded = encoder.encode(&rgb)?;

    let pending = store
        .reserve(name, snapshot::MIME_TYPE, namespace)
        .map_err(CaptureError::StorageWriteFailed)?;

    if let Err(e) = store.write(&pending, &encoded.data) {
        if let Err(abort_err) = store.abort(pending) {
            warn!(error = %abort_err, "Failed to discard pending snapshot");
        }
        return Err(CaptureError::StorageWriteFailed(e));
    }

    let id = store
        .finalize(pending)
        .map_err(CaptureError::StorageWriteFailed)?;
    debug!(id = %id, bytes = encoded.data.len(), "Snapshot finalized");

    let metadata = ArtifactMetadata {
        provenance,
        tags: ProvenanceTags::for_config(provenance.config()),
    };
    let metadata_attached = match store.attach(&id, &metadata) {
        Ok(()) => true,
        Err(e) => {
            warn!(id = %id, error = %e, "Failed to attach provenance, snapshot kept");
            false
        }
    };

    info!(id = %id, "Snapshot saved");
    Ok(CaptureReceipt {
        artifact: SnapshotArtifact {
            name: id.name().to_string(),
            id,
            provenance,
        },
        metadata_attached,
    })
}
