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

//! Backing-image collaborator interface
//!
//! The drive core never parses image files itself; every sector byte and
//! every piece of track metadata comes through [`CdRomBackend`]. Concrete
//! backends (BIN/CUE images, host-drive passthrough) implement this trait,
//! and the drive holds one as a boxed object, so polymorphism over image
//! formats lives entirely behind this seam.

use bitflags::bitflags;

use super::msf::Msf;
use super::subchannel::Subchannel;

/// Raw (Red Book) sector payload size in bytes
pub const RAW_SECTOR_SIZE: usize = 2352;

/// Cooked Mode 1 user-data size in bytes
pub const COOKED_SECTOR_SIZE: usize = 2048;

/// Size of the extended sector buffer a backend fills per read
///
/// Layout, at fixed offsets:
///
/// ```text
/// [0..2352)     raw sector (12 sync + 4 header + mode-dependent payload)
/// [2352..2648)  C2 error flags (currently always zero)
/// [2648..2744)  raw interleaved P-W subchannel (96 bytes)
/// [2744..2760)  deinterleaved Q subchannel (16 bytes)
/// [2760..2856)  deinterleaved R-W subchannel (96 bytes)
/// ```
pub const SECTOR_BUFFER_SIZE: usize = 2856;

/// Offset of the C2 error-flag region in the extended buffer
pub const OFS_C2: usize = 2352;

/// Offset of the raw interleaved subchannel block
pub const OFS_SUBCH_RAW: usize = 2648;

/// Offset of the deinterleaved Q subchannel block
pub const OFS_SUBCH_Q: usize = 2744;

/// Offset of the deinterleaved R-W subchannel block
pub const OFS_SUBCH_RW: usize = 2760;

bitflags! {
    /// Track classification reported by a backend for a given LBA
    ///
    /// The low two bits carry the XA form of a Mode 2 track; the
    /// extractor masks them out together with [`TrackClass::MODE2`] when
    /// deciding which sector layout applies.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TrackClass: u8 {
        /// XA Mode 2 Form 1 (2048-byte user data)
        const XA_FORM1 = 0x01;
        /// XA Mode 2 Form 2 (2328-byte user data)
        const XA_FORM2 = 0x02;
        /// Mode 2 track
        const MODE2 = 0x04;
        /// CD-DA audio track
        const AUDIO = 0x08;
        /// Data track the backend cannot classify (raw passthrough)
        const UNKNOWN_DATA = 0x10;
    }
}

impl TrackClass {
    /// Mode-2 related bits, matching the extractor's `mode2` word
    pub fn mode2_bits(&self) -> u8 {
        self.bits() & (Self::XA_FORM1 | Self::XA_FORM2 | Self::MODE2).bits()
    }
}

/// Track descriptor returned by [`CdRomBackend::get_track_info`]
///
/// The position is the on-disc (binary) MSF of the track start, or of the
/// track end when requested with `end = true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackInfo {
    /// Track number (1-99, or 0xAA for the lead-out)
    pub number: u8,
    /// ADR/CTL attribute byte
    pub attr: u8,
    /// Track position
    pub pos: Msf,
}

/// One entry of the full raw TOC point list
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTrackEntry {
    /// Session number this point belongs to
    pub session: u8,
    /// ADR/CTL attribute byte
    pub adr_ctl: u8,
    /// Point number (1-99 for tracks, 0xA0-0xA2 for session descriptors)
    pub point: u8,
    /// Absolute minute of the point's position
    pub pm: u8,
    /// Absolute second of the point's position
    pub ps: u8,
    /// Absolute frame of the point's position
    pub pf: u8,
}

impl RawTrackEntry {
    /// Lead-out point number in the raw TOC
    pub const LEAD_OUT: u8 = 0xA2;

    /// Serialize to the 11-byte raw TOC descriptor layout
    ///
    /// Byte order: session, ADR/CTL, TNO (always 0), point, running-time
    /// MSF (zeroed), zero, PMIN, PSEC, PFRAME.
    pub fn to_bytes(&self) -> [u8; 11] {
        [
            self.session,
            self.adr_ctl,
            0,
            self.point,
            0,
            0,
            0,
            0,
            self.pm,
            self.ps,
            self.pf,
        ]
    }

    /// Whether this point describes an actual track (1-99)
    pub fn is_track(&self) -> bool {
        self.point >= 1 && self.point <= 99
    }

    /// Whether this point describes an audio track
    ///
    /// Bit 2 of the control nibble marks a data track.
    pub fn is_audio(&self) -> bool {
        self.is_track() && (self.adr_ctl & 0x04) == 0
    }
}

/// Interface every backing-image collaborator implements
///
/// All methods are synchronous and non-reentrant with respect to the same
/// drive; the core calls them from the single command-processing path.
pub trait CdRomBackend {
    /// Read one sector into the extended buffer layout
    ///
    /// Fills as much of the [`SECTOR_BUFFER_SIZE`] layout as the image
    /// provides (regions the image lacks stay zero). Returns false when
    /// the LBA is outside the image.
    fn read_sector(&mut self, lba: u32, buf: &mut [u8; SECTOR_BUFFER_SIZE]) -> bool;

    /// Look up a track's start (or end) position
    ///
    /// `track` 0xAA addresses the lead-out. Returns None for a track not
    /// present on the disc.
    fn get_track_info(&mut self, track: u32, end: bool) -> Option<TrackInfo>;

    /// Append the full raw TOC point list to `out`
    fn get_raw_track_info(&mut self, out: &mut Vec<RawTrackEntry>);

    /// Classify the track containing `lba`
    fn track_class(&mut self, lba: u32) -> TrackClass;

    /// Q-subchannel snapshot for `lba`, fields in cooked (BCD) form
    fn get_subchannel(&mut self, lba: u32) -> Subchannel;

    /// Pre-emphasis flag of the track containing `lba`
    fn is_track_pre(&mut self, lba: u32) -> bool {
        let _ = lba;
        false
    }

    /// Teardown notification, called once before the backend is dropped
    fn exit(&mut self) {}
}
