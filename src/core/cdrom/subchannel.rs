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

//! Q-subchannel snapshots and vendor "current subchannel" layouts
//!
//! Eight subchannel streams (P through W) are interleaved at bit
//! granularity alongside every sector; Q carries track/index/timecode
//! metadata. While a sector is being played the live Q data is recovered
//! from the raw block cached by the audio callback; otherwise the backend
//! supplies a snapshot. The same snapshot is then serialized in several
//! vendor-specific byte layouts.

use super::msf::{bin_to_bcd, Msf};
use super::{CdRomDrive, CdStatus};

/// Q-subchannel snapshot, computed fresh per query
///
/// Fields are binary or BCD depending on the `cooked` flag of the query
/// that produced the snapshot ("cooked" matches the on-disc BCD
/// encoding).
#[derive(Debug, Clone, Copy, Default)]
pub struct Subchannel {
    /// ADR/CTL attribute byte
    pub attr: u8,
    /// Track number
    pub track: u8,
    /// Index number within the track
    pub index: u8,
    /// Position relative to the track start
    pub rel: Msf,
    /// Absolute position
    pub abs: Msf,
}

impl Subchannel {
    fn to_bin(self) -> Self {
        Self {
            attr: self.attr,
            track: super::msf::bcd_to_bin(self.track),
            index: super::msf::bcd_to_bin(self.index),
            rel: self.rel.from_bcd(),
            abs: self.abs.from_bcd(),
        }
    }

    fn to_cooked(self) -> Self {
        Self {
            attr: self.attr,
            track: bin_to_bcd(self.track),
            index: bin_to_bcd(self.index),
            rel: self.rel.to_bcd(),
            abs: self.abs.to_bcd(),
        }
    }
}

/// Recover the 12 Q data bytes from a raw interleaved P-W block
///
/// Each Q bit sits at bit 6 of one raw byte; eight consecutive raw bytes
/// contribute one Q byte, MSB first. The bit positions are part of the
/// disc format and must not change.
fn deinterleave_q(raw: &[u8; 96]) -> [u8; 12] {
    let mut q = [0u8; 12];
    for (i, byte) in q.iter_mut().enumerate() {
        for j in 0..8 {
            *byte |= ((raw[(i * 8) + j] >> 6) & 0x01) << (7 - j);
        }
    }
    q
}

/// Sony 9-byte position payload: attr/track/index, then the relative and
/// absolute positions as 3-byte MSF or 24-bit big-endian block fields
///
/// Shared by the current-subchannel and audio-status queries, which
/// differ only in their status byte.
fn fill_sony_position(b: &mut [u8], subc: &Subchannel, msf: bool) {
    b[0] = subc.attr;
    b[1] = subc.track;
    b[2] = subc.index;

    if msf {
        b[3] = subc.rel.m;
        b[4] = subc.rel.s;
        b[5] = subc.rel.f;
        b[6] = subc.abs.m;
        b[7] = subc.abs.s;
        b[8] = subc.abs.f;
    } else {
        let rel = subc.rel.frames();
        let abs = subc.abs.to_lba();
        b[3] = (rel >> 16) as u8;
        b[4] = (rel >> 8) as u8;
        b[5] = rel as u8;
        b[6] = (abs >> 16) as u8;
        b[7] = (abs >> 8) as u8;
        b[8] = abs as u8;
    }
}

impl CdRomDrive {
    /// Q-subchannel snapshot for `lba`
    ///
    /// While that exact LBA is being played the snapshot is derived from
    /// the cached raw subchannel block (its fields start out BCD and are
    /// converted *to* cooked form only when asked); otherwise the backend
    /// provides cooked fields which are converted *from* cooked form when
    /// binary was asked for. Both conversion directions are relied on by
    /// different callers.
    pub fn get_subchannel(&mut self, lba: u32, cooked: bool) -> Subchannel {
        if self.play.status == CdStatus::Playing && lba == self.play.pos {
            let q = deinterleave_q(&self.subch_buffer);
            let subc = Subchannel {
                // ADR and CTL nibbles are swapped between Q and the
                // subchannel attribute byte.
                attr: (q[0] >> 4) | ((q[0] & 0x0F) << 4),
                track: q[1],
                index: q[2],
                rel: Msf::new(q[3], q[4], q[5]),
                abs: Msf::new(q[7], q[8], q[9]),
            };
            let subc = subc.to_bin();
            if cooked {
                subc.to_cooked()
            } else {
                subc
            }
        } else {
            let subc = self
                .ops
                .as_mut()
                .map_or_else(Subchannel::default, |ops| ops.get_subchannel(lba));
            if cooked {
                subc
            } else {
                subc.to_bin()
            }
        }
    }

    /// Generic (IBM-style) READ SUBCHANNEL current-position page
    ///
    /// `b[1]` holds the requested format code on entry; formats above 1
    /// (UPC, ISRC) return only the status byte. For the position format,
    /// attr/track/index land in `b[1..4]` followed by the absolute and
    /// relative positions as zero-padded MSF or 32-bit LBA fields.
    /// Returns the one-byte audio status code.
    pub fn get_current_subchannel(&mut self, b: &mut [u8], msf: bool) -> u8 {
        let subc = self.get_subchannel(self.play.pos, false);
        log::trace!(
            "CD-ROM {}: Returned subchannel at {:02}:{:02}.{:02}",
            self.id,
            subc.abs.m,
            subc.abs.s,
            subc.abs.f
        );

        let ret = self.get_current_status();

        if b[1] > 1 {
            return ret;
        }

        b[1] = subc.attr;
        b[2] = subc.track;
        b[3] = subc.index;

        if msf {
            b[4] = 0;
            b[5] = subc.abs.m;
            b[6] = subc.abs.s;
            b[7] = subc.abs.f;
            b[8] = 0;
            b[9] = subc.rel.m;
            b[10] = subc.rel.s;
            b[11] = subc.rel.f;
        } else {
            b[4..8].copy_from_slice(&subc.abs.to_lba().to_be_bytes());
            // Relative positions have no pregap to subtract.
            b[8..12].copy_from_slice(&subc.rel.frames().to_be_bytes());
        }

        ret
    }

    /// Sony-style fixed 9-byte current subchannel
    pub fn get_current_subchannel_sony(&mut self, b: &mut [u8], msf: bool) -> u8 {
        let subc = self.get_subchannel(self.play.pos, false);
        let ret = self.get_current_status();
        fill_sony_position(b, &subc, msf);
        ret
    }

    /// Raw 9-byte BCD subcode-Q dump
    pub fn get_current_subcodeq(&mut self, b: &mut [u8]) {
        let subc = self.get_subchannel(self.play.pos, false);

        b[0] = subc.attr;
        b[1] = bin_to_bcd(subc.track);
        b[2] = bin_to_bcd(subc.index);
        b[3] = bin_to_bcd(subc.rel.m);
        b[4] = bin_to_bcd(subc.rel.s);
        b[5] = bin_to_bcd(subc.rel.f);
        b[6] = bin_to_bcd(subc.abs.m);
        b[7] = bin_to_bcd(subc.abs.s);
        b[8] = bin_to_bcd(subc.abs.f);
    }

    /// Subcode-Q dump plus the vendor play-status byte
    ///
    /// Playing returns 0x00; paused returns the pause/resume bit the
    /// command layer last latched; every other state is 0x03.
    pub fn get_current_subcodeq_playstatus(&mut self, b: &mut [u8]) -> u8 {
        self.get_current_subcodeq(b);

        let ret = match self.play.status {
            CdStatus::Playing => 0x00,
            CdStatus::Paused => self.audio_op,
            _ => 0x03,
        };
        log::trace!(
            "CD-ROM {}: Returned subcode-q at {:02x}:{:02x}.{:02x}, track={:02x}",
            self.id,
            b[3],
            b[4],
            b[5],
            b[1]
        );
        ret
    }

    /// Pioneer audio status: status byte plus the absolute BCD MSF
    ///
    /// Playing distinguishes audio-on (0x00) from hardware-muted (0x02);
    /// paused is 0x01, data-only/empty 0x05, everything else 0x03.
    pub fn get_audio_status_pioneer(&mut self, b: &mut [u8]) -> u8 {
        let subc = self.get_subchannel(self.play.pos, false);

        let ret = match self.play.status {
            CdStatus::Empty | CdStatus::DataOnly => 0x05,
            CdStatus::Playing => {
                if self.sound_on {
                    0x00
                } else {
                    0x02
                }
            }
            CdStatus::Paused => 0x01,
            _ => 0x03,
        };

        b[0] = 0;
        b[1] = bin_to_bcd(subc.abs.m);
        b[2] = bin_to_bcd(subc.abs.s);
        b[3] = bin_to_bcd(subc.abs.f);
        ret
    }

    /// Sony audio status: same status encoding without a data-only
    /// variant, over the 9-byte Sony position payload
    pub fn get_audio_status_sony(&mut self, b: &mut [u8], msf: bool) -> u8 {
        let subc = self.get_subchannel(self.play.pos, false);

        let ret = match self.play.status {
            CdStatus::Playing => {
                if self.sound_on {
                    0x00
                } else {
                    0x02
                }
            }
            CdStatus::Paused => 0x01,
            _ => 0x03,
        };

        fill_sony_position(b, &subc, msf);
        ret
    }
}

#[cfg(test)]
pub(super) fn interleave_q(q: &[u8; 12]) -> [u8; 96] {
    let mut raw = [0u8; 96];
    for i in 0..12 {
        for j in 0..8 {
            raw[(i * 8) + j] |= ((q[i] >> (7 - j)) & 0x01) << 6;
        }
    }
    raw
}
