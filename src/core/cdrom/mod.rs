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

//! Generic CD-ROM drive core
//!
//! This module emulates the logical drive behind a SCSI/ATAPI (or vendor
//! proprietary) CD-ROM controller: the playback/seek state machine, audio
//! staging, subchannel and TOC generation, and raw READ CD sector
//! extraction. The physical image format lives behind the
//! [`CdRomBackend`] trait; the command layers that drive this core are
//! external.
//!
//! # Drive status
//!
//! | Status             | Meaning                                       |
//! |--------------------|-----------------------------------------------|
//! | Empty              | No media attached                             |
//! | DataOnly           | Media without any audio track                 |
//! | Paused             | Audio playback suspended                      |
//! | Playing            | Audio playback in progress                    |
//! | Stopped            | Media present, playback idle                  |
//! | PlayingCompleted   | Playback reached the end of its range         |
//!
//! `Paused` and `Playing` are adjacent ordinals differing only in the low
//! bit; the pause/resume operation relies on that encoding.
//!
//! # Position addressing
//!
//! Nearly every play/search/scan entry point accepts one of three
//! addressing conventions, selected by a flag byte:
//!
//! - `0x00` - binary LBA passthrough (`0xFFFFFFFF` = current position)
//! - `0x40` - BCD MSF in the upper three bytes
//! - `0x80` - single BCD track number
//!
//! # Example
//!
//! ```
//! use opticore::core::cdrom::{CdRomDrive, CdStatus};
//!
//! let mut drive = CdRomDrive::new(0);
//! assert_eq!(drive.status(), CdStatus::Empty);
//!
//! // Audio commands on an empty drive are failed no-ops.
//! assert!(!drive.audio_play(100, 200, 0));
//! ```

pub mod backend;
pub mod manager;
pub mod msf;
mod sector;
mod seek;
mod subchannel;
mod toc;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

pub use backend::{CdRomBackend, RawTrackEntry, TrackClass, TrackInfo};
pub use backend::{RAW_SECTOR_SIZE, SECTOR_BUFFER_SIZE};
pub use manager::{CdRomManager, DriveConfig, CDROM_NUM};
pub use msf::Msf;
pub use sector::track_type_is_valid;
pub use seek::{MAX_SEEK, MIN_SEEK};
pub use subchannel::Subchannel;
pub use toc::TocFormat;

use backend::OFS_SUBCH_RAW;
use msf::bcd_to_bin;

/// Audio samples per raw sector (2352 bytes of 16-bit PCM)
const SECTOR_SAMPLES: usize = RAW_SECTOR_SIZE / 2;

/// Logical drive status
///
/// Discriminants are part of the contract: `stop()` only touches states
/// above `DataOnly`, and pause/resume toggles the low bit between
/// `Paused` (2) and `Playing` (3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum CdStatus {
    /// No media attached
    Empty = 0,
    /// Media present but carries no audio track
    DataOnly = 1,
    /// Audio playback suspended
    Paused = 2,
    /// Audio playback in progress
    Playing = 3,
    /// Media present, playback idle
    Stopped = 4,
    /// Playback reached the end of the requested range
    PlayingCompleted = 5,
}

impl CdStatus {
    fn from_repr(val: u8) -> Option<Self> {
        match val {
            0 => Some(Self::Empty),
            1 => Some(Self::DataOnly),
            2 => Some(Self::Paused),
            3 => Some(Self::Playing),
            4 => Some(Self::Stopped),
            5 => Some(Self::PlayingCompleted),
            _ => None,
        }
    }
}

/// Drive model/vendor variant
///
/// The model selects vendor-specific wire quirks: the NEC CDR-260 speaks
/// BCD where other models speak binary, and the NEC disc-information
/// query type 3 differs in field width between NEC models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveType {
    /// Generic SCSI/ATAPI drive
    #[default]
    Generic,
    /// NEC CDR-260 (BCD MSF addressing, 32-bit disc info type 3)
    NecCdr260,
    /// NEC CDR-273 (binary addressing, 16-bit disc info type 3)
    NecCdr273,
    /// Sony CDU-561
    SonyCdu561,
    /// Pioneer DRM-604X
    PioneerDrm604x,
    /// Toshiba XM-5100
    ToshibaXm5100,
}

impl DriveType {
    /// Whether this model transmits MSF positions in BCD
    pub fn is_bcd(&self) -> bool {
        matches!(self, Self::NecCdr260)
    }
}

/// Playback cursor: status, current position, and play-range end
///
/// These three fields form the drive's de facto state machine; the
/// transition methods below are their only mutators.
#[derive(Debug, Clone, Copy)]
struct Playback {
    status: CdStatus,
    pos: u32,
    end: u32,
}

impl Playback {
    fn new() -> Self {
        Self {
            status: CdStatus::Empty,
            pos: 0,
            end: 0,
        }
    }

    /// Fresh state for newly attached media
    fn loaded(has_audio: bool) -> Self {
        Self {
            status: if has_audio {
                CdStatus::Stopped
            } else {
                CdStatus::DataOnly
            },
            pos: 0,
            end: 0,
        }
    }

    /// Stop playback unless the drive is empty or data-only
    fn stop(&mut self) {
        if self.status > CdStatus::DataOnly {
            self.status = CdStatus::Stopped;
        }
    }

    /// Begin playing the range `[pos, end)`
    fn start(&mut self, pos: u32, end: u32) {
        self.pos = pos;
        self.end = end;
        self.status = CdStatus::Playing;
    }

    /// Move the cursor without touching the status or range end
    fn reposition(&mut self, pos: u32) {
        self.pos = pos;
    }

    /// Advance the cursor by a sector count
    fn advance(&mut self, sectors: u32) {
        self.pos += sectors;
    }

    /// Land a search at `pos`, playing or paused per the play bit
    fn search(&mut self, pos: u32, playbit: bool) {
        self.pos = pos;
        self.status = if playbit {
            CdStatus::Playing
        } else {
            CdStatus::Paused
        };
    }

    /// Set a new range end, resuming a stopped or paused drive
    fn resume_to(&mut self, end: u32) {
        if matches!(self.status, CdStatus::Stopped | CdStatus::Paused) {
            self.status = CdStatus::Playing;
        }
        self.end = end;
    }

    /// Mark the play range as exhausted
    fn complete(&mut self) {
        self.status = CdStatus::PlayingCompleted;
    }

    /// Toggle between Paused and Playing by the resume bit
    fn pause_resume(&mut self, resume: u8) {
        if matches!(self.status, CdStatus::Playing | CdStatus::Paused) {
            let raw = (self.status as u8 & 0xFE) | (resume & 0x01);
            // Only 2 or 3 can come out of the bit operation.
            self.status = CdStatus::from_repr(raw).unwrap_or(self.status);
        }
    }
}

/// One logical CD-ROM drive
///
/// All operations execute synchronously on the caller's thread and assume
/// single-writer access per drive; there is no internal locking.
pub struct CdRomDrive {
    /// Stable index identity within the drive array
    pub(super) id: u8,

    /// Model/vendor variant
    drive_type: DriveType,

    /// Playback state machine (status + position + range end)
    play: Playback,

    /// Drive spin speed tier; 0 is an invalid configuration
    cur_speed: u8,

    /// Frame distance of the seek in flight, consumed by the timing model
    seek_diff: u32,

    /// Hardware audio enable (channel volume mute when false)
    sound_on: bool,

    /// Soft mute, set when a search/scan lands off an audio track
    audio_muted_soft: bool,

    /// Last pause/resume bit latched from the command layer
    audio_op: u8,

    /// Staging buffer of decoded audio samples awaiting the mixer pull
    cd_buffer: Vec<i16>,

    /// Raw interleaved subchannel block of the sector last read for
    /// playback; valid only for the current playback LBA
    subch_buffer: [u8; 96],

    /// Backing image collaborator, if media is attached
    ops: Option<Box<dyn CdRomBackend>>,

    /// Path of the attached image (management glue only)
    image_path: PathBuf,

    /// Path of the previously ejected image, for reload
    prev_image_path: PathBuf,

    /// Latched media-change notification for the command layer
    media_changed: bool,
}

impl CdRomDrive {
    /// Create a detached drive with the given id
    pub fn new(id: u8) -> Self {
        Self {
            id,
            drive_type: DriveType::Generic,
            play: Playback::new(),
            cur_speed: 8,
            seek_diff: 0,
            sound_on: true,
            audio_muted_soft: false,
            audio_op: 0,
            cd_buffer: Vec::new(),
            subch_buffer: [0; 96],
            ops: None,
            image_path: PathBuf::new(),
            prev_image_path: PathBuf::new(),
            media_changed: false,
        }
    }

    /// Drive id
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Current drive status
    pub fn status(&self) -> CdStatus {
        self.play.status
    }

    /// Current/last-sought absolute LBA
    pub fn seek_pos(&self) -> u32 {
        self.play.pos
    }

    /// End LBA of the audio play range in progress
    pub fn play_end(&self) -> u32 {
        self.play.end
    }

    /// Drive model
    pub fn drive_type(&self) -> DriveType {
        self.drive_type
    }

    /// Select the drive model
    pub fn set_drive_type(&mut self, drive_type: DriveType) {
        self.drive_type = drive_type;
    }

    /// Current speed tier
    pub fn speed(&self) -> u8 {
        self.cur_speed
    }

    /// Set the speed tier
    pub fn set_speed(&mut self, speed: u8) {
        self.cur_speed = speed;
    }

    /// Record the frame distance of an upcoming seek
    pub fn set_seek_diff(&mut self, diff: u32) {
        self.seek_diff = diff;
    }

    /// Hardware audio enable state
    pub fn sound_on(&self) -> bool {
        self.sound_on
    }

    /// Set the hardware audio enable state
    pub fn set_sound_on(&mut self, on: bool) {
        self.sound_on = on;
    }

    /// Soft-mute state decided by the last search/scan
    pub fn audio_muted_soft(&self) -> bool {
        self.audio_muted_soft
    }

    /// Whether media is attached
    pub fn has_media(&self) -> bool {
        self.ops.is_some()
    }

    /// Attach a backing image and derive the media status
    ///
    /// A disc with at least one audio track comes up `Stopped`; one
    /// without comes up `DataOnly`.
    pub fn attach_backend(&mut self, ops: Box<dyn CdRomBackend>) {
        self.ops = Some(ops);

        let mut tracks = Vec::new();
        if let Some(ops) = self.ops.as_mut() {
            ops.get_raw_track_info(&mut tracks);
        }
        let has_audio = tracks.iter().any(|t| t.is_audio());

        self.play = Playback::loaded(has_audio);
        self.cd_buffer.clear();
        self.subch_buffer = [0; 96];
        self.audio_muted_soft = false;
        self.media_changed = true;

        log::debug!(
            "CD-ROM {}: Media attached, status {:?}",
            self.id,
            self.play.status
        );
    }

    /// Detach the backing image, notifying it first
    pub fn detach_backend(&mut self) {
        if let Some(mut ops) = self.ops.take() {
            ops.exit();
        }
        self.play = Playback::new();
        self.cd_buffer.clear();
        self.media_changed = true;
        log::debug!("CD-ROM {}: Media detached", self.id);
    }

    /// Take the latched media-change notification
    pub fn take_media_changed(&mut self) -> bool {
        std::mem::take(&mut self.media_changed)
    }

    /// Pre-emphasis flag of the track containing `lba`
    pub fn is_pre(&mut self, lba: u32) -> bool {
        self.ops.as_mut().is_some_and(|ops| ops.is_track_pre(lba))
    }

    pub(super) fn track_class(&mut self, lba: u32) -> TrackClass {
        self.ops
            .as_mut()
            .map_or(TrackClass::empty(), |ops| ops.track_class(lba))
    }

    pub(super) fn track_info(&mut self, track: u32, end: bool) -> Option<TrackInfo> {
        self.ops.as_mut().and_then(|ops| ops.get_track_info(track, end))
    }

    /// Start LBA of a track, by binary track number
    fn track_start_lba(&mut self, track: u32) -> Option<u32> {
        self.track_info(track, false).map(|ti| ti.pos.to_lba())
    }

    /// Decode a position per the shared vendor addressing convention
    ///
    /// `0x40` carries a BCD MSF in bits 31..8, `0x80` a BCD track number
    /// in the low byte, anything else is a binary LBA. The full-word
    /// `0xFFFFFFFF` sentinel of the LBA and MSF forms means "current
    /// position".
    fn resolve_vendor_pos(&mut self, pos: u32, vendor_type: u8) -> u32 {
        match vendor_type {
            0x40 => {
                if pos == 0xFFFFFFFF {
                    self.play.pos
                } else {
                    Msf::unpack(pos >> 8).from_bcd().to_lba()
                }
            }
            0x80 => {
                let track = bcd_to_bin((pos & 0xFF) as u8);
                self.track_start_lba(track as u32).unwrap_or(self.play.pos)
            }
            _ => {
                if pos == 0xFFFFFFFF {
                    log::debug!("CD-ROM {}: Using current position", self.id);
                    self.play.pos
                } else {
                    pos
                }
            }
        }
    }

    /// Stop playback
    ///
    /// Empty and data-only drives are left untouched; every playable
    /// state collapses to `Stopped`.
    pub fn stop(&mut self) {
        self.play.stop();
    }

    /// Seek to a position and stop
    ///
    /// `vendor_type` selects the addressing convention (see module docs).
    /// The seek distance for the timing model is derived from the current
    /// position before it moves.
    pub fn seek(&mut self, pos: u32, vendor_type: u8) {
        let lba = self.resolve_vendor_pos(pos, vendor_type);
        log::debug!("CD-ROM {}: Seek to LBA {:08X}", self.id, lba);

        self.seek_diff = self.play.pos.abs_diff(lba);
        self.play.reposition(lba);
        self.play.stop();
    }

    /// Start audio playback
    ///
    /// `ismsf` selects among the play addressing sub-modes:
    ///
    /// - bit `0x100` set - `pos` is relative to the start of track
    ///   `ismsf & 0xFF`
    /// - `2`/`3` - `pos` and `len` are track numbers; mode 2 resolves
    ///   `len` to the *end* of that track, mode 3 to its start
    /// - `1` - packed MSF positions (BCD on the NEC CDR-260);
    ///   `pos == 0xFFFFFF` plays from the current position
    /// - `0` - binary LBA; `pos == 0xFFFFFFFF` plays from the current
    ///   position, and `len` is a sector count added to `pos`
    ///
    /// The resolved start must land on an audio track; otherwise the
    /// drive stops and the command fails with the position untouched.
    pub fn audio_play(&mut self, pos: u32, len: u32, ismsf: i32) -> bool {
        if self.play.status == CdStatus::DataOnly {
            return false;
        }

        let mut pos = pos;
        let mut len = len;

        log::debug!(
            "CD-ROM {}: Play audio - {:08X} {:08X} {}",
            self.id,
            pos,
            len,
            ismsf
        );

        if (ismsf & 0x100) != 0 {
            // Track-relative audio play.
            match self.track_info((ismsf & 0xFF) as u32, false) {
                Some(ti) => pos = pos.wrapping_add(ti.pos.to_lba()),
                None => return false,
            }
        } else if ismsf == 2 || ismsf == 3 {
            match self.track_info(pos, false) {
                Some(ti) => pos = ti.pos.to_lba(),
                None => return false,
            }
            // Mode 2 has to end at the *end* of the specified track, not
            // at its beginning.
            match self.track_info(len, ismsf == 2) {
                Some(ti) => len = ti.pos.to_lba(),
                None => return false,
            }
        } else if ismsf == 1 {
            if pos == 0xFFFFFF {
                log::debug!("CD-ROM {}: Playing from current position (MSF)", self.id);
                pos = self.play.pos;
            } else {
                let mut start = Msf::unpack(pos);
                if self.drive_type.is_bcd() {
                    start = start.from_bcd();
                }
                pos = start.to_lba();
            }

            let mut end = Msf::unpack(len);
            if self.drive_type.is_bcd() {
                end = end.from_bcd();
            }
            len = end.to_lba();
        } else if ismsf == 0 {
            if pos == 0xFFFFFFFF {
                log::debug!("CD-ROM {}: Playing from current position", self.id);
                pos = self.play.pos;
            }
            len = len.wrapping_add(pos);
        }

        // Only now is the actual LBA to start playing from known.
        if !self.track_class(pos).contains(TrackClass::AUDIO) {
            log::debug!("CD-ROM {}: LBA {:08X} not on an audio track", self.id, pos);
            self.play.stop();
            return false;
        }

        self.audio_muted_soft = false;
        self.play.start(pos, len);
        self.cd_buffer.clear();
        true
    }

    /// Decide the soft-mute state for a search/scan landing on `lba`
    ///
    /// The sector *before* the target is probed as well (wrapping to the
    /// sector after when the target is LBA 0): real drives speculatively
    /// detect the audio transition, and software depends on the
    /// asymmetry.
    fn probe_audio_mute(&mut self, lba: u32) {
        let mut prev = lba.wrapping_sub(1);
        if prev == 0xFFFFFFFF {
            prev = lba + 1;
        }

        let prev_audio = self.track_class(prev).contains(TrackClass::AUDIO);
        let target_audio = self.track_class(lba).contains(TrackClass::AUDIO);
        self.audio_muted_soft = !(!prev_audio && target_audio);
    }

    /// Audio track search (vendor play-with-pause-bit entry point)
    ///
    /// Decodes `pos` per the shared addressing convention, probes for the
    /// soft-mute decision, and lands in `Playing` or `Paused` depending
    /// on `playbit`.
    pub fn audio_track_search(&mut self, pos: u32, vendor_type: u8, playbit: bool) -> bool {
        if self.play.status == CdStatus::DataOnly {
            return false;
        }

        let lba = self.resolve_vendor_pos(pos, vendor_type);
        log::debug!(
            "CD-ROM {}: Track search {:08X} type {:02X} playbit {}",
            self.id,
            lba,
            vendor_type,
            playbit
        );

        self.probe_audio_mute(lba);

        self.audio_op = playbit as u8;
        self.cd_buffer.clear();
        self.play.search(lba, playbit);
        true
    }

    /// Pioneer track search: position is always a BCD MSF in bits 23..0
    pub fn audio_track_search_pioneer(&mut self, pos: u32, playbit: bool) -> bool {
        if self.play.status == CdStatus::DataOnly {
            return false;
        }

        let lba = Msf::unpack(pos).from_bcd().to_lba();
        self.probe_audio_mute(lba);

        self.play.search(lba, playbit);
        true
    }

    /// Toshiba audio play: sets the play *end* position
    ///
    /// A stopped or paused drive resumes playing toward the decoded
    /// position.
    pub fn audio_play_toshiba(&mut self, pos: u32, vendor_type: u8) -> bool {
        if self.play.status == CdStatus::DataOnly {
            return false;
        }

        let lba = self.resolve_vendor_pos(pos, vendor_type);
        self.probe_audio_mute(lba);

        if !self.track_class(lba).contains(TrackClass::AUDIO) {
            log::debug!("CD-ROM {}: LBA {:08X} not on an audio track", self.id, lba);
            self.play.stop();
            return false;
        }

        self.play.resume_to(lba);
        self.cd_buffer.clear();
        true
    }

    /// Fast scan (cue/review): repositions without entering playback
    ///
    /// The target must be an audio sector; otherwise the drive soft-mutes
    /// and stops.
    pub fn audio_scan(&mut self, pos: u32, vendor_type: u8) -> bool {
        if self.play.status == CdStatus::DataOnly {
            return false;
        }

        let lba = self.resolve_vendor_pos(pos, vendor_type);
        log::debug!("CD-ROM {}: Audio scan to LBA {:08X}", self.id, lba);

        if !self.track_class(lba).contains(TrackClass::AUDIO) {
            self.audio_muted_soft = true;
            self.play.stop();
            return false;
        }

        self.audio_muted_soft = false;
        self.play.reposition(lba);
        true
    }

    /// Pause or resume audio playback
    ///
    /// Only meaningful while playing or paused; the resume bit becomes
    /// the low bit of the status ordinal and is latched for the vendor
    /// play-status queries.
    pub fn audio_pause_resume(&mut self, resume: u8) {
        if matches!(self.play.status, CdStatus::Playing | CdStatus::Paused) {
            self.audio_op = resume & 0x01;
        }
        self.play.pause_resume(resume);
    }

    /// Real-time audio pull from the sound mixer
    ///
    /// Fills `output` with staged samples, reading raw sectors from the
    /// backend as needed and caching each sector's trailing subchannel
    /// block for live subchannel queries. While muted (hard or soft) the
    /// output is silence but the position keeps advancing, so guest
    /// position displays stay correct. Returns false when no audible
    /// samples were produced.
    pub fn audio_callback(&mut self, output: &mut [i16]) -> bool {
        let len = output.len();

        if !self.sound_on || self.play.status != CdStatus::Playing || self.audio_muted_soft {
            log::trace!("CD-ROM {}: Audio callback while not playing", self.id);
            if self.play.status == CdStatus::Playing {
                self.play.advance((len >> 11) as u32);
            }
            output.fill(0);
            return false;
        }

        let mut ret = true;
        let mut buf = [0u8; SECTOR_BUFFER_SIZE];

        while self.cd_buffer.len() < len {
            if self.play.pos < self.play.end {
                let ok = self
                    .ops
                    .as_mut()
                    .is_some_and(|ops| ops.read_sector(self.play.pos, &mut buf));
                if ok {
                    log::trace!("CD-ROM {}: Read LBA {:08X} successful", self.id, self.play.pos);
                    self.subch_buffer
                        .copy_from_slice(&buf[OFS_SUBCH_RAW..OFS_SUBCH_RAW + 96]);
                    self.cd_buffer.extend(
                        buf[..RAW_SECTOR_SIZE]
                            .chunks_exact(2)
                            .map(|c| i16::from_le_bytes([c[0], c[1]])),
                    );
                    debug_assert!(self.cd_buffer.len() % SECTOR_SAMPLES == 0);
                    self.play.advance(1);
                } else {
                    log::trace!("CD-ROM {}: Read LBA {:08X} failed", self.id, self.play.pos);
                    self.cd_buffer.resize(len, 0);
                    self.play.stop();
                    ret = false;
                }
            } else {
                log::trace!("CD-ROM {}: Playing completed", self.id);
                self.cd_buffer.resize(len, 0);
                self.play.complete();
                ret = false;
            }
        }

        for (dst, src) in output.iter_mut().zip(self.cd_buffer.drain(..len)) {
            *dst = src;
        }
        ret
    }

    /// One-byte SCSI/ATAPI audio status code
    ///
    /// DataOnly maps to 0x15, Playing to 0x11, Paused to 0x12, everything
    /// else to 0x13.
    pub fn get_current_status(&self) -> u8 {
        match self.play.status {
            CdStatus::DataOnly => 0x15,
            CdStatus::Playing => 0x11,
            CdStatus::Paused => 0x12,
            _ => 0x13,
        }
    }
}

impl std::fmt::Debug for CdRomDrive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdRomDrive")
            .field("id", &self.id)
            .field("drive_type", &self.drive_type)
            .field("status", &self.play.status)
            .field("seek_pos", &self.play.pos)
            .field("cd_end", &self.play.end)
            .field("cur_speed", &self.cur_speed)
            .field("has_media", &self.ops.is_some())
            .finish()
    }
}
