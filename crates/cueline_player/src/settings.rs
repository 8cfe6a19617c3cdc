// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player settings.
//!
//! A single RON file describes how a headless run is wired:
//! - Playback tuning (jump threshold, tick rate, frame step)
//! - Channel bindings (which channels drive which named events/properties)
//! - The route table
//! - The receivers the host exposes

use cueline_router::{ChannelBindings, RouteTable};
use cueline_sequencer::PlaybackSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Errors loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// RON could not be parsed
    #[error("invalid settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// RON could not be written
    #[error("could not serialize settings: {0}")]
    Serialize(#[from] ron::Error),
    /// Written by a newer player
    #[error("settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

/// Result alias for settings operations
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Capabilities of one host receiver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverSpec {
    /// Receiver name
    pub name: String,
    /// Action keys
    #[serde(default)]
    pub actions: Vec<String>,
    /// Property keys
    #[serde(default)]
    pub properties: Vec<String>,
}

/// Everything a headless run needs besides the project document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Settings format version
    pub version: u32,
    /// Engine tuning
    #[serde(default)]
    pub playback: PlaybackSettings,
    /// Ticks per second of timeline time
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Ticks advanced per simulated frame
    #[serde(default = "default_frame_step")]
    pub frame_step: i64,
    /// Channel to event/property bindings
    #[serde(default)]
    pub bindings: ChannelBindings,
    /// Named events and properties
    #[serde(default)]
    pub routes: RouteTable,
    /// Host receivers
    #[serde(default)]
    pub receivers: Vec<ReceiverSpec>,
}

fn default_tick_rate() -> u32 {
    1000
}

fn default_frame_step() -> i64 {
    16
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            playback: PlaybackSettings::default(),
            tick_rate: default_tick_rate(),
            frame_step: default_frame_step(),
            bindings: ChannelBindings::default(),
            routes: RouteTable::default(),
            receivers: Vec::new(),
        }
    }
}

impl PlayerSettings {
    /// Parse settings from RON text
    pub fn from_ron(source: &str) -> Result<Self> {
        let settings: PlayerSettings = ron::from_str(source)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_ron(&content)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Frame duration in seconds
    pub fn frame_seconds(&self) -> f64 {
        self.frame_step as f64 / f64::from(self.tick_rate.max(1))
    }
}
