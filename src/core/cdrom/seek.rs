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

//! Seek timing model
//!
//! Real drives settle almost instantly on nearby seeks and take a fixed
//! worst-case time across the whole disc. The model interpolates linearly
//! between a per-speed-tier "short" and "long" seek constant over the
//! clamped seek distance, producing a continuous, monotonic curve. The
//! result is advisory: it tells the command layer how many milliseconds to
//! wait before completing the command, the core itself never sleeps.

use super::CdRomDrive;

/// Seek distances below this many frames cost nothing (head already settled)
pub const MIN_SEEK: u32 = 2000;

/// Seek distances are capped at this many frames (full-stroke seek)
pub const MAX_SEEK: u32 = 333333;

/// Short (track-to-track) seek time in milliseconds for a speed tier
///
/// Speed 0 is a misconfiguration of the surrounding system, not a runtime
/// condition, and halts the emulator.
pub fn short_seek_ms(id: u8, speed: u8) -> f64 {
    match speed {
        0 => panic!("CD-ROM {id}: 0x speed"),
        1 => 240.0,
        2 => 160.0,
        3 => 150.0,
        4..=11 => 112.0,
        12..=15 => 75.0,
        16..=19 => 58.0,
        20..=23 | 40..=48 => 50.0,
        // 24-32, 52+
        _ => 45.0,
    }
}

/// Full-stroke seek time in milliseconds for a speed tier
pub fn long_seek_ms(id: u8, speed: u8) -> f64 {
    match speed {
        0 => panic!("CD-ROM {id}: 0x speed"),
        1 => 1446.0,
        2 => 1000.0,
        3 => 900.0,
        4..=11 => 675.0,
        12..=15 => 400.0,
        16..=19 => 350.0,
        20..=23 | 40..=48 => 300.0,
        // 24-32, 52+
        _ => 270.0,
    }
}

impl CdRomDrive {
    /// Milliseconds the in-flight seek (`seek_diff` frames) should take
    ///
    /// # Example
    ///
    /// ```
    /// use opticore::core::cdrom::CdRomDrive;
    ///
    /// let mut drive = CdRomDrive::new(0);
    /// drive.set_seek_diff(500);
    /// assert_eq!(drive.seek_time(), 0.0);
    /// ```
    pub fn seek_time(&self) -> f64 {
        let diff = self.seek_diff;
        let sd = (MAX_SEEK - MIN_SEEK) as f64;

        if diff < MIN_SEEK {
            return 0.0;
        }
        let diff = diff.min(MAX_SEEK) - MIN_SEEK;

        short_seek_ms(self.id, self.cur_speed)
            + (long_seek_ms(self.id, self.cur_speed) * diff as f64) / sd
    }
}
