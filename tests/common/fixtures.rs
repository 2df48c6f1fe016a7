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

//! Test fixtures for common test scenarios

use opticore::core::cdrom::backend::{
    CdRomBackend, RawTrackEntry, TrackClass, TrackInfo, OFS_SUBCH_Q, OFS_SUBCH_RAW, OFS_SUBCH_RW,
    RAW_SECTOR_SIZE, SECTOR_BUFFER_SIZE,
};
use opticore::core::cdrom::msf::{bin_to_bcd, Msf};
use opticore::core::cdrom::Subchannel;

/// One synthetic track on the test disc
#[derive(Debug, Clone, Copy)]
pub struct TestTrack {
    pub number: u8,
    pub start: u32,
    pub attr: u8,
    pub class: TrackClass,
}

/// In-memory disc backend with deterministic sector contents
pub struct TestDisc {
    pub tracks: Vec<TestTrack>,
    pub lead_out: u32,
}

/// Deterministic payload byte of a data sector
#[allow(dead_code)]
pub fn data_byte(lba: u32, i: usize) -> u8 {
    (lba as usize).wrapping_add(i.wrapping_mul(3)) as u8
}

/// Deterministic byte of an audio sector
#[allow(dead_code)]
pub fn audio_byte(lba: u32, i: usize) -> u8 {
    (lba as usize).wrapping_add(i) as u8
}

fn msf_from_frames(frames: u32) -> Msf {
    Msf::new(
        (frames / 75 / 60) as u8,
        ((frames / 75) % 60) as u8,
        (frames % 75) as u8,
    )
}

fn interleave_q(q: &[u8; 12]) -> [u8; 96] {
    let mut raw = [0u8; 96];
    for i in 0..12 {
        for j in 0..8 {
            raw[(i * 8) + j] |= ((q[i] >> (7 - j)) & 0x01) << 6;
        }
    }
    raw
}

impl TestDisc {
    /// Data track 1 (LBA 0-149) plus audio track 2 (LBA 150-449)
    pub fn mixed() -> Self {
        Self {
            tracks: vec![
                TestTrack {
                    number: 1,
                    start: 0,
                    attr: 0x14,
                    class: TrackClass::empty(),
                },
                TestTrack {
                    number: 2,
                    start: 150,
                    attr: 0x10,
                    class: TrackClass::AUDIO,
                },
            ],
            lead_out: 450,
        }
    }

    /// Single Mode 1 data track
    #[allow(dead_code)]
    pub fn data_only() -> Self {
        Self {
            tracks: vec![TestTrack {
                number: 1,
                start: 0,
                attr: 0x14,
                class: TrackClass::empty(),
            }],
            lead_out: 300,
        }
    }

    fn track_at(&self, lba: u32) -> Option<&TestTrack> {
        if lba >= self.lead_out {
            return None;
        }
        self.tracks.iter().rev().find(|t| lba >= t.start)
    }

    fn q_for(&self, lba: u32) -> [u8; 12] {
        let Some(t) = self.track_at(lba) else {
            return [0; 12];
        };
        let rel = msf_from_frames(lba - t.start).to_bcd();
        let abs = Msf::from_lba(lba).to_bcd();
        let mut q = [0u8; 12];
        q[0] = ((t.attr & 0x0F) << 4) | (t.attr >> 4);
        q[1] = bin_to_bcd(t.number);
        q[2] = 0x01;
        q[3] = rel.m;
        q[4] = rel.s;
        q[5] = rel.f;
        q[7] = abs.m;
        q[8] = abs.s;
        q[9] = abs.f;
        q
    }
}

impl CdRomBackend for TestDisc {
    fn read_sector(&mut self, lba: u32, buf: &mut [u8; SECTOR_BUFFER_SIZE]) -> bool {
        let Some(t) = self.track_at(lba) else {
            return false;
        };
        let t = *t;

        buf.fill(0);
        if t.class.contains(TrackClass::AUDIO) {
            for i in 0..RAW_SECTOR_SIZE {
                buf[i] = audio_byte(lba, i);
            }
        } else {
            buf[0] = 0x00;
            buf[1..11].fill(0xFF);
            buf[11] = 0x00;
            let hdr = Msf::from_lba(lba).to_bcd();
            buf[12] = hdr.m;
            buf[13] = hdr.s;
            buf[14] = hdr.f;
            buf[15] = 0x01;
            for i in 16..RAW_SECTOR_SIZE {
                buf[i] = data_byte(lba, i);
            }
        }

        let q = self.q_for(lba);
        buf[OFS_SUBCH_RAW..OFS_SUBCH_RAW + 96].copy_from_slice(&interleave_q(&q));
        buf[OFS_SUBCH_Q..OFS_SUBCH_Q + 12].copy_from_slice(&q);
        buf[OFS_SUBCH_RW..OFS_SUBCH_RW + 96].fill(0x5A);
        true
    }

    fn get_track_info(&mut self, track: u32, end: bool) -> Option<TrackInfo> {
        if track == 0xAA {
            return Some(TrackInfo {
                number: 0xAA,
                attr: 0x16,
                pos: Msf::from_lba(self.lead_out),
            });
        }
        let idx = self.tracks.iter().position(|t| t.number as u32 == track)?;
        let t = self.tracks[idx];
        let lba = if end {
            self.tracks
                .get(idx + 1)
                .map_or(self.lead_out, |next| next.start)
        } else {
            t.start
        };
        Some(TrackInfo {
            number: t.number,
            attr: t.attr,
            pos: Msf::from_lba(lba),
        })
    }

    fn get_raw_track_info(&mut self, out: &mut Vec<RawTrackEntry>) {
        let first = self.tracks.first().map_or(0, |t| t.number);
        let last = self.tracks.last().map_or(0, |t| t.number);
        out.push(RawTrackEntry {
            session: 1,
            adr_ctl: 0x14,
            point: 0xA0,
            pm: first,
            ps: 0,
            pf: 0,
        });
        out.push(RawTrackEntry {
            session: 1,
            adr_ctl: 0x14,
            point: 0xA1,
            pm: last,
            ps: 0,
            pf: 0,
        });
        for t in &self.tracks {
            let pos = Msf::from_lba(t.start);
            out.push(RawTrackEntry {
                session: 1,
                adr_ctl: t.attr,
                point: t.number,
                pm: pos.m,
                ps: pos.s,
                pf: pos.f,
            });
        }
        let lead = Msf::from_lba(self.lead_out);
        out.push(RawTrackEntry {
            session: 1,
            adr_ctl: 0x16,
            point: RawTrackEntry::LEAD_OUT,
            pm: lead.m,
            ps: lead.s,
            pf: lead.f,
        });
    }

    fn track_class(&mut self, lba: u32) -> TrackClass {
        self.track_at(lba)
            .map_or(TrackClass::empty(), |t| t.class)
    }

    fn get_subchannel(&mut self, lba: u32) -> Subchannel {
        let Some(t) = self.track_at(lba) else {
            return Subchannel::default();
        };
        Subchannel {
            attr: t.attr,
            track: bin_to_bcd(t.number),
            index: 0x01,
            rel: msf_from_frames(lba - t.start).to_bcd(),
            abs: Msf::from_lba(lba).to_bcd(),
        }
    }
}
