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

//! Time/position codec: LBA <-> MSF and BCD <-> binary conversions
//!
//! Disc positions are addressed either as a zero-based Logical Block
//! Address or as Minute:Second:Frame (75 frames per second). On-disc MSF
//! is offset by 150 frames from LBA 0 because the Red Book lead-in pregap
//! occupies the first two seconds of the disc. Several vendor protocols
//! additionally transmit MSF fields in BCD.

/// Number of frames (sectors) per second of audio
pub const FRAMES_PER_SECOND: u32 = 75;

/// Red Book lead-in pregap length in frames (2 seconds)
pub const PREGAP_FRAMES: u32 = 150;

/// Convert a BCD byte to binary
///
/// # Example
///
/// ```
/// use opticore::core::cdrom::msf::bcd_to_bin;
///
/// assert_eq!(bcd_to_bin(0x42), 42);
/// ```
#[inline]
pub const fn bcd_to_bin(x: u8) -> u8 {
    (x >> 4) * 10 + (x & 0x0F)
}

/// Convert a binary byte (0-99) to BCD
///
/// # Example
///
/// ```
/// use opticore::core::cdrom::msf::bin_to_bcd;
///
/// assert_eq!(bin_to_bcd(42), 0x42);
/// ```
#[inline]
pub const fn bin_to_bcd(x: u8) -> u8 {
    (x % 10) | ((x / 10) << 4)
}

/// Disc position in MSF (Minute:Second:Frame) format
///
/// Fields are stored as binary unless a method says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Msf {
    /// Minute (0-99)
    pub m: u8,
    /// Second (0-59)
    pub s: u8,
    /// Frame (0-74)
    pub f: u8,
}

impl Msf {
    /// Create a new position
    pub const fn new(m: u8, s: u8, f: u8) -> Self {
        Self { m, s, f }
    }

    /// Convert an absolute LBA to on-disc MSF
    ///
    /// LBA 0 corresponds to MSF 00:02:00; the +150 frame offset encodes
    /// the Red Book lead-in pregap and must not be simplified away.
    pub fn from_lba(lba: u32) -> Self {
        let pos = lba.wrapping_add(PREGAP_FRAMES);
        Self {
            m: (pos / FRAMES_PER_SECOND / 60) as u8,
            s: ((pos / FRAMES_PER_SECOND) % 60) as u8,
            f: (pos % FRAMES_PER_SECOND) as u8,
        }
    }

    /// Total frame count of this position, without the pregap adjustment
    ///
    /// This is the raw `((m * 60) + s) * 75 + f` conversion; use
    /// [`Msf::to_lba`] when an absolute LBA is wanted.
    pub fn frames(&self) -> u32 {
        ((self.m as u32 * 60) + self.s as u32) * FRAMES_PER_SECOND + self.f as u32
    }

    /// Convert on-disc MSF to an absolute LBA
    ///
    /// Positions inside the 150-frame lead-in wrap, matching the unsigned
    /// arithmetic real command layers perform; such an LBA never lands on
    /// a valid track and gets rejected downstream.
    pub fn to_lba(&self) -> u32 {
        self.frames().wrapping_sub(PREGAP_FRAMES)
    }

    /// Unpack a position from the `m << 16 | s << 8 | f` wire form
    pub fn unpack(val: u32) -> Self {
        Self {
            m: ((val >> 16) & 0xFF) as u8,
            s: ((val >> 8) & 0xFF) as u8,
            f: (val & 0xFF) as u8,
        }
    }

    /// Pack this position into the `m << 16 | s << 8 | f` wire form
    pub fn pack(&self) -> u32 {
        ((self.m as u32) << 16) | ((self.s as u32) << 8) | self.f as u32
    }

    /// Reinterpret BCD-encoded fields as binary
    pub fn from_bcd(&self) -> Self {
        Self {
            m: bcd_to_bin(self.m),
            s: bcd_to_bin(self.s),
            f: bcd_to_bin(self.f),
        }
    }

    /// Encode binary fields as BCD
    pub fn to_bcd(&self) -> Self {
        Self {
            m: bin_to_bcd(self.m),
            s: bin_to_bcd(self.s),
            f: bin_to_bcd(self.f),
        }
    }
}
