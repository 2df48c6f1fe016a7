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

//! Table-of-Contents byte streams and vendor disc-information queries
//!
//! Three READ TOC formats (normal, session, raw) are serialized from the
//! backend's raw point list, each behind a 2-byte big-endian
//! "length minus 2" header computed after clamping to the allocation
//! length. An empty or detached drive produces structurally valid,
//! empty-content responses rather than errors.

use super::backend::RawTrackEntry;
use super::msf::{bcd_to_bin, bin_to_bcd, Msf};
use super::CdRomDrive;

/// READ TOC format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocFormat {
    /// Per-track entries from a starting track through the lead-out
    Normal,
    /// First track of the last session only
    Session,
    /// Unmodified 11-byte raw point descriptors
    Raw,
}

impl CdRomDrive {
    /// Fetch the raw point list, sorted and filtered to track points
    ///
    /// Keeps points 1-99 plus the lead-out (renumbered from 0xA2 to the
    /// 0xAA marker the TOC formats use) and sorts by point number, which
    /// places the lead-out last.
    fn track_points(&mut self) -> Vec<RawTrackEntry> {
        let mut raw = Vec::new();
        if let Some(ops) = self.ops.as_mut() {
            ops.get_raw_track_info(&mut raw);
        }

        let mut points: Vec<RawTrackEntry> = raw
            .into_iter()
            .filter(|t| t.is_track() || t.point == RawTrackEntry::LEAD_OUT)
            .map(|mut t| {
                if t.point == RawTrackEntry::LEAD_OUT {
                    t.point = 0xAA;
                }
                t
            })
            .collect();
        points.sort_by_key(|t| t.point);
        points
    }

    fn raw_points(&mut self) -> Vec<RawTrackEntry> {
        let mut raw = Vec::new();
        if let Some(ops) = self.ops.as_mut() {
            ops.get_raw_track_info(&mut raw);
        }
        raw
    }

    /// First and last track numbers on the disc (0, 0 when empty)
    fn track_bounds(&mut self) -> (u8, u8) {
        let mut first = 0u8;
        let mut last = 0u8;
        for t in self.raw_points() {
            if t.is_track() {
                if first == 0 || t.point < first {
                    first = t.point;
                }
                if t.point > last {
                    last = t.point;
                }
            }
        }
        (first, last)
    }

    /// Serialize one normal-format entry
    fn push_toc_entry(&self, b: &mut Vec<u8>, t: &RawTrackEntry, msf: bool, sony: bool) {
        if !sony {
            b.push(0); // reserved
        }
        b.push(t.adr_ctl);
        b.push(t.point);
        if !sony {
            b.push(0); // reserved
        }

        if msf {
            b.push(0);
            if self.drive_type.is_bcd() {
                b.push(bin_to_bcd(t.pm));
                b.push(bin_to_bcd(t.ps));
                b.push(bin_to_bcd(t.pf));
            } else {
                b.push(t.pm);
                b.push(t.ps);
                b.push(t.pf);
            }
        } else {
            let lba = Msf::new(t.pm, t.ps, t.pf).to_lba();
            b.extend_from_slice(&lba.to_be_bytes());
        }
    }

    fn read_toc_normal(&mut self, b: &mut Vec<u8>, start_track: u8, msf: bool, sony: bool) {
        let points = self.track_points();
        let (first, last) = self.track_bounds();

        b.resize(4, 0);
        b[2] = first;
        b[3] = last;

        let start = points.iter().position(|t| t.point >= start_track);
        log::trace!(
            "CD-ROM {}: TOC normal, start_track {} -> index {:?}",
            self.id,
            start_track,
            start
        );

        // No suitable starting track: a bare header is still a valid TOC.
        let Some(start) = start else { return };

        for t in &points[start..] {
            self.push_toc_entry(b, t, msf, sony);
        }
    }

    /// Session TOC: header plus the first track of the last session
    ///
    /// `b[3]` (the "last session" header byte) doubles as the session
    /// being searched for; the original conflates the two, which only
    /// holds because callers always want the most recent session. When
    /// that session has no track the response is padded with 8 zero
    /// bytes; guests expect the 12-byte shape even then.
    fn read_toc_session(&mut self, b: &mut Vec<u8>, msf: bool) {
        let raw = self.raw_points();

        let mut min_session = 0u8;
        let mut max_session = 0u8;
        for t in &raw {
            if min_session == 0 || t.session < min_session {
                min_session = t.session;
            }
            if t.session > max_session {
                max_session = t.session;
            }
        }

        b.resize(4, 0);
        b[2] = min_session;
        b[3] = max_session;

        let wanted = b[3];
        match raw.iter().find(|t| t.session == wanted && t.is_track()) {
            Some(t) => {
                let t = *t;
                self.push_toc_entry(b, &t, msf, false);
            }
            None => b.resize(12, 0),
        }
    }

    /// Raw TOC: 11-byte descriptors for every session >= `start_track`
    fn read_toc_raw(&mut self, b: &mut Vec<u8>, start_track: u8) {
        let raw = self.raw_points();

        let mut min_session = 0u8;
        let mut max_session = 0u8;
        for t in &raw {
            if min_session == 0 || t.session < min_session {
                min_session = t.session;
            }
            if t.session > max_session {
                max_session = t.session;
            }
        }

        b.resize(4, 0);
        b[2] = min_session;
        b[3] = max_session;

        for t in &raw {
            if t.session >= start_track {
                b.extend_from_slice(&t.to_bytes());
            }
        }
    }

    /// READ TOC entry point
    ///
    /// Serializes the selected format into `b`, clamps to `max_len`, and
    /// writes the 2-byte big-endian "length minus 2" header over the
    /// clamped length. Returns the number of valid bytes in `b`.
    ///
    /// # Example
    ///
    /// ```
    /// use opticore::core::cdrom::{CdRomDrive, TocFormat};
    ///
    /// let mut drive = CdRomDrive::new(0);
    /// let mut toc = vec![0u8; 1024];
    /// let len = drive.read_toc(&mut toc, TocFormat::Normal, 1, false, 1024);
    /// assert_eq!(len, 4); // empty drive: bare header
    /// ```
    pub fn read_toc(
        &mut self,
        b: &mut [u8],
        format: TocFormat,
        start_track: u8,
        msf: bool,
        max_len: usize,
    ) -> usize {
        let mut out = Vec::with_capacity(b.len());
        match format {
            TocFormat::Normal => self.read_toc_normal(&mut out, start_track, msf, false),
            TocFormat::Session => self.read_toc_session(&mut out, msf),
            TocFormat::Raw => self.read_toc_raw(&mut out, start_track),
        }

        let len = out.len().min(max_len).min(b.len());
        // The header reflects the clamped length, not the pre-clamp one.
        out[0..2].copy_from_slice(&((len as u16).wrapping_sub(2)).to_be_bytes());

        b[..len].copy_from_slice(&out[..len]);
        len
    }

    /// Sony READ TOC variant: normal format without the reserved bytes
    pub fn read_toc_sony(
        &mut self,
        b: &mut [u8],
        start_track: u8,
        msf: bool,
        max_len: usize,
    ) -> usize {
        let mut out = Vec::with_capacity(b.len());
        self.read_toc_normal(&mut out, start_track, msf, true);

        let len = out.len().min(max_len).min(b.len());
        out[0..2].copy_from_slice(&((len as u16).wrapping_sub(2)).to_be_bytes());

        b[..len].copy_from_slice(&out[..len]);
        len
    }

    /// Toshiba/NEC disc-information query, types 0-3
    ///
    /// - 0: first and last track numbers, BCD
    /// - 1: lead-out start position, BCD MSF
    /// - 2: position and attributes of a track given in BCD
    /// - 3: model-dependent lead-out field - 32 bits on the NEC CDR-260,
    ///   16 bits elsewhere (kept as separate paths; the narrow form is
    ///   what the non-260 firmware actually returns)
    pub fn read_disc_info(&mut self, b: &mut [u8], track: u8, info_type: u8) {
        match info_type {
            0 => {
                let (first, last) = self.track_bounds();
                b[0] = bin_to_bcd(first);
                b[1] = bin_to_bcd(last);
                b[2] = 0;
                b[3] = 0;
            }
            1 => {
                let ti = self.track_info(0xAA, false).unwrap_or_default();
                b[0] = bin_to_bcd(ti.pos.m);
                b[1] = bin_to_bcd(ti.pos.s);
                b[2] = bin_to_bcd(ti.pos.f);
                b[3] = 0;
            }
            2 => {
                let ti = self
                    .track_info(bcd_to_bin(track) as u32, false)
                    .unwrap_or_default();
                b[0] = bin_to_bcd(ti.pos.m);
                b[1] = bin_to_bcd(ti.pos.s);
                b[2] = bin_to_bcd(ti.pos.f);
                b[3] = ti.attr;
                log::trace!(
                    "CD-ROM {}: Disc information at {:02x}:{:02x}.{:02x}, track={}",
                    self.id,
                    b[0],
                    b[1],
                    b[2],
                    bcd_to_bin(track)
                );
            }
            3 => {
                let ti = self.track_info(0xAA, false).unwrap_or_default();
                let lba = ti.pos.to_lba();
                if self.drive_type == super::DriveType::NecCdr260 {
                    b[0..4].copy_from_slice(&lba.to_be_bytes());
                } else {
                    b[0..2].copy_from_slice(&(lba as u16).to_be_bytes());
                    b[2] = 0;
                    b[3] = 0;
                }
            }
            _ => {
                log::warn!("CD-ROM {}: Unknown disc info type {}", self.id, info_type);
            }
        }
    }
}
