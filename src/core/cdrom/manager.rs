// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Drive lifecycle management
//!
//! Owns the fixed-size collection of logical drives and sequences their
//! external triggers: hard reset from configuration, eject, and reload of
//! a previously ejected image. Image files themselves are opened by a
//! caller-supplied factory, keeping image-format parsing outside the
//! core.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{CdRomError, Result};

use super::{CdRomBackend, CdRomDrive, DriveType};

/// Number of logical drives in the machine
pub const CDROM_NUM: usize = 4;

/// Opens a backing image for a path at reset/reload time
pub type BackendFactory<'a> = dyn FnMut(&Path) -> Result<Box<dyn CdRomBackend>> + 'a;

/// Per-drive configuration
///
/// Deserialized from the emulator configuration file:
///
/// ```toml
/// [[drive]]
/// image_path = "games/quake.cue"
/// speed = 8
/// drive_type = "generic"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Image to attach at reset; empty drive when absent
    #[serde(default)]
    pub image_path: Option<PathBuf>,

    /// Spin speed tier (1x-56x)
    #[serde(default = "default_speed")]
    pub speed: u8,

    /// Drive model variant
    #[serde(default)]
    pub drive_type: DriveType,
}

fn default_speed() -> u8 {
    8
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            image_path: None,
            speed: default_speed(),
            drive_type: DriveType::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    drive: Vec<DriveConfig>,
}

impl DriveConfig {
    /// Load the drive configuration list from a TOML file
    pub fn load_all(path: &Path) -> Result<Vec<DriveConfig>> {
        let text = std::fs::read_to_string(path)?;
        let parsed: ConfigFile = toml::from_str(&text)?;
        Ok(parsed.drive)
    }
}

/// Owner of the machine's CD-ROM drives
///
/// # Example
///
/// ```
/// use opticore::core::cdrom::{CdRomManager, CDROM_NUM};
///
/// let manager = CdRomManager::new();
/// assert_eq!(manager.drives().len(), CDROM_NUM);
/// ```
pub struct CdRomManager {
    drives: Vec<CdRomDrive>,
}

impl CdRomManager {
    /// Create the manager with all drives detached
    pub fn new() -> Self {
        Self {
            drives: (0..CDROM_NUM as u8).map(CdRomDrive::new).collect(),
        }
    }

    /// All drives
    pub fn drives(&self) -> &[CdRomDrive] {
        &self.drives
    }

    /// Borrow one drive
    pub fn drive(&self, id: u8) -> Result<&CdRomDrive> {
        self.drives
            .get(id as usize)
            .ok_or(CdRomError::InvalidDrive(id))
    }

    /// Mutably borrow one drive
    pub fn drive_mut(&mut self, id: u8) -> Result<&mut CdRomDrive> {
        self.drives
            .get_mut(id as usize)
            .ok_or(CdRomError::InvalidDrive(id))
    }

    /// Hard-reset every drive from its configuration
    ///
    /// Applies model and speed, then opens and inserts the configured
    /// image through `open`. Drives beyond the configuration list are
    /// reset to empty. A configured speed of 0 is rejected before it can
    /// reach the seek timing model, where it would be fatal.
    pub fn hard_reset(&mut self, configs: &[DriveConfig], open: &mut BackendFactory) -> Result<()> {
        for (i, drive) in self.drives.iter_mut().enumerate() {
            let config = configs.get(i).cloned().unwrap_or_default();

            log::debug!("CD-ROM {i}: Hard reset");

            if config.speed == 0 {
                return Err(CdRomError::InvalidConfig(format!(
                    "drive {i}: speed tier 0 is not valid"
                )));
            }

            drive.detach_backend();
            drive.set_drive_type(config.drive_type);
            drive.set_speed(config.speed);
            drive.image_path.clear();
            drive.prev_image_path.clear();

            if let Some(path) = config.image_path {
                let backend = open(&path).map_err(|e| {
                    CdRomError::DiscLoad(format!("drive {i}: {}: {e}", path.display()))
                })?;
                drive.attach_backend(backend);
                drive.image_path = path;
            }
        }
        Ok(())
    }

    /// Detach every drive, notifying the backends
    pub fn close(&mut self) {
        for drive in &mut self.drives {
            drive.detach_backend();
        }
    }

    /// Eject the media from a drive
    ///
    /// Remembers the image path so a later [`CdRomManager::reload`] can
    /// restore it. Ejecting an already empty drive does nothing.
    pub fn eject(&mut self, id: u8) -> Result<()> {
        let drive = self.drive_mut(id)?;

        if drive.image_path.as_os_str().is_empty() {
            // Switch from empty to empty. Do nothing.
            return Ok(());
        }

        drive.prev_image_path = std::mem::take(&mut drive.image_path);
        drive.detach_backend();

        log::info!("CD-ROM {id}: Ejected");
        Ok(())
    }

    /// Reload the previously ejected image into a drive
    ///
    /// Only meaningful on an empty drive with a remembered image; a
    /// loaded drive or one that never held media is left alone.
    pub fn reload(&mut self, id: u8, open: &mut BackendFactory) -> Result<()> {
        let drive = self.drive_mut(id)?;

        if !drive.image_path.as_os_str().is_empty()
            || drive.prev_image_path.as_os_str().is_empty()
        {
            // Switch from empty to empty. Do nothing.
            return Ok(());
        }

        let path = std::mem::take(&mut drive.prev_image_path);
        let backend = open(&path)
            .map_err(|e| CdRomError::DiscLoad(format!("drive {id}: {}: {e}", path.display())))?;
        drive.attach_backend(backend);
        drive.image_path = path;

        log::info!("CD-ROM {id}: Reloaded {}", drive.image_path.display());
        Ok(())
    }
}

impl Default for CdRomManager {
    fn default() -> Self {
        Self::new()
    }
}
