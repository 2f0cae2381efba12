//! Player settings and preferences
//!
//! Persisted as one JSON value, separately from progress.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError, read_or_default, write_value};

/// Player settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Identity ===
    /// Name sent with score submissions
    pub identity: String,
    /// Section/class the player belongs to
    pub cohort: String,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion (no sparkle bursts or background scroll)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identity: "Player".to_string(),
            cohort: "default".to_string(),

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            reduced_motion: false,
        }
    }
}

impl Settings {
    const STORAGE_KEY: &'static str = "sniffy.settings";

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = crate::clamp_f32(volume, 0.0, 1.0);
    }

    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = crate::clamp_f32(volume, 0.0, 1.0);
    }

    /// Volume the host should play effects at (respects mute)
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Effective background scroll (respects reduced_motion)
    pub fn effective_parallax(&self) -> bool {
        !self.reduced_motion
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let mut settings: Settings = read_or_default(store, Self::STORAGE_KEY);
        // Hand-edited values may be out of range
        settings.set_master_volume(settings.master_volume);
        settings.set_sfx_volume(settings.sfx_volume);
        log::info!("Loaded settings for '{}'", settings.identity);
        settings
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        write_value(store, Self::STORAGE_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}
