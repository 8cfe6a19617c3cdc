// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flat record import/export and the JSON project document.
//!
//! A project flattens to a list of [`TimelineRecord`]s sorted by
//! `(time, channel)`. Import skips malformed records instead of failing.

use crate::channel_store::CHANNEL_COUNT;
use crate::event::{OnOffEvent, TriggerKind};
use crate::keyframe::{ControlKeyframe, InterpolationMode};
use crate::project::{Palette, TimelineProject};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current project document format version
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Record kind code for on/off triggers
pub const RECORD_KIND_TRIGGER: u8 = 0;

/// Record kind code for control keyframes
pub const RECORD_KIND_CURVE: u8 = 1;

/// Document errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document written by a newer version
    #[error("Document version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

/// A generic timestamped record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineRecord {
    /// Tick
    pub time: i64,
    /// [`RECORD_KIND_TRIGGER`] or [`RECORD_KIND_CURVE`]
    pub kind: u8,
    /// Trigger kind or interpolation mode code
    pub sub_kind: u8,
    /// Channel
    pub channel: i64,
    /// Element value
    pub value: i64,
}

impl TimelineRecord {
    /// Record for a trigger
    pub fn trigger(channel: usize, event: &OnOffEvent) -> Self {
        Self {
            time: event.time,
            kind: RECORD_KIND_TRIGGER,
            sub_kind: event.kind.code(),
            channel: channel as i64,
            value: i64::from(event.value),
        }
    }

    /// Record for a keyframe
    pub fn curve(channel: usize, keyframe: &ControlKeyframe) -> Self {
        Self {
            time: keyframe.time,
            kind: RECORD_KIND_CURVE,
            sub_kind: keyframe.interpolation.code(),
            channel: channel as i64,
            value: i64::from(keyframe.value),
        }
    }

    fn channel_index(&self) -> Option<usize> {
        usize::try_from(self.channel).ok().filter(|&c| c < CHANNEL_COUNT)
    }

    fn element(&self) -> Option<(usize, Element)> {
        let channel = self.channel_index()?;
        let value = u8::try_from(self.value).ok()?;
        let element = match self.kind {
            RECORD_KIND_TRIGGER => {
                let kind = TriggerKind::from_code(self.sub_kind)?;
                Element::Trigger(OnOffEvent::new(self.time, kind, value))
            }
            RECORD_KIND_CURVE => {
                let mode = InterpolationMode::from_code(self.sub_kind)?;
                Element::Curve(ControlKeyframe::new(self.time, value).with_interpolation(mode))
            }
            _ => return None,
        };
        Some((channel, element))
    }
}

enum Element {
    Trigger(OnOffEvent),
    Curve(ControlKeyframe),
}

/// Outcome of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records turned into elements
    pub imported: usize,
    /// Malformed records that were skipped
    pub skipped: usize,
}

impl TimelineProject {
    /// Build a project from flat records.
    ///
    /// Records sharing a channel and tick keep their list order.
    pub fn from_records<'r>(records: impl IntoIterator<Item = &'r TimelineRecord>) -> (Self, ImportSummary) {
        let mut project = Self::new();
        let mut summary = ImportSummary::default();

        for record in records {
            let stored = match record.element() {
                Some((channel, Element::Trigger(event))) => project.data.events.add(channel, event),
                Some((channel, Element::Curve(keyframe))) => project.data.keyframes.add(channel, keyframe),
                None => {
                    tracing::warn!("Skipping malformed record: {:?}", record);
                    summary.skipped += 1;
                    continue;
                }
            };
            match stored {
                Ok(_) => summary.imported += 1,
                Err(e) => {
                    tracing::warn!("Skipping record {:?}: {}", record, e);
                    summary.skipped += 1;
                }
            }
        }

        tracing::debug!(
            "Imported {} records ({} skipped)",
            summary.imported,
            summary.skipped
        );
        (project, summary)
    }

    /// Flatten both stores into records sorted by `(time, channel)`
    pub fn to_records(&self) -> Vec<TimelineRecord> {
        let mut records = Vec::with_capacity(self.data.events.total_count() + self.data.keyframes.total_count());

        for channel in self.data.events.channels_in_use() {
            if let Ok(events) = self.data.events.elements(channel) {
                records.extend(events.iter().map(|e| TimelineRecord::trigger(channel, e)));
            }
        }
        for channel in self.data.keyframes.channels_in_use() {
            if let Ok(keyframes) = self.data.keyframes.elements(channel) {
                records.extend(keyframes.iter().map(|k| TimelineRecord::curve(channel, k)));
            }
        }

        records.sort_by_key(|r| (r.time, r.channel));
        records
    }
}

/// Serialized project: metadata plus flat records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    /// Format version
    pub version: u32,
    /// Background identifier
    #[serde(default)]
    pub background: String,
    /// Color palette
    #[serde(default)]
    pub palette: Palette,
    /// Elements
    pub records: Vec<TimelineRecord>,
}

impl ProjectDocument {
    /// Capture a project
    pub fn from_project(project: &TimelineProject) -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION,
            background: project.background().to_string(),
            palette: *project.palette(),
            records: project.to_records(),
        }
    }

    /// Build a fresh project (empty history)
    pub fn to_project(&self) -> (TimelineProject, ImportSummary) {
        let (mut project, summary) = TimelineProject::from_records(&self.records);
        project.background = self.background.clone();
        project.palette = self.palette;
        (project, summary)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let document: Self = serde_json::from_str(json)?;
        if document.version > DOCUMENT_FORMAT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: document.version,
                supported: DOCUMENT_FORMAT_VERSION,
            });
        }
        Ok(document)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
