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

//! READ CD raw sector extraction
//!
//! Assembles the exact byte stream an ATAPI/SCSI READ CD command returns:
//! a validator rejects the illegal flag combinations the command set
//! defines, then the requested sub-regions of one raw sector read are
//! concatenated in fixed order. Three independent gates apply to the same
//! single read: the region bits (sync/header/sub-header/data/EDC), the
//! error-flag mode, and the subchannel mode.

use super::backend::{
    TrackClass, OFS_C2, OFS_SUBCH_Q, OFS_SUBCH_RAW, OFS_SUBCH_RW, RAW_SECTOR_SIZE,
    SECTOR_BUFFER_SIZE,
};
use super::msf::Msf;
use super::{CdRomDrive, CdStatus};

/// Requested sector type of a READ CD command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectorKind {
    Audio,
    Mode1,
    Mode2Formless,
    XaForm1,
    XaForm2,
}

/// Validate a READ CD sector-type/flag combination
///
/// Encodes the command set's illegal-mode rules. This is a correctness
/// gate, not a performance path; each rejected pattern is spelled out.
pub fn track_type_is_valid(id: u8, sector_type: u8, flags: u16, audio: bool, mode2: u8) -> bool {
    if (flags & 0x70) == 0 {
        // 0x00/0x08/0x80/0x88 are illegal modes.
        log::debug!("CD-ROM {id}: [Any Mode] 0x00/0x08/0x80/0x88 are illegal modes");
        return false;
    }

    if (sector_type != 1) && !audio {
        if (flags & 0x06) == 0x06 {
            log::debug!("CD-ROM {id}: [Any Data Mode] Invalid error flags");
            return false;
        }

        if ((flags & 0x700) == 0x300) || ((flags & 0x700) > 0x400) {
            log::debug!(
                "CD-ROM {id}: [Any Data Mode] Invalid subchannel data flags ({:02X})",
                flags & 0x700
            );
            return false;
        }

        if (flags & 0x18) == 0x08 {
            // EDC/ECC without user data is an illegal mode.
            log::debug!("CD-ROM {id}: [Any Data Mode] EDC/ECC without user data");
            return false;
        }

        if ((flags & 0xF0) == 0x90) || ((flags & 0xF0) == 0xC0) {
            // 0x90/0x98/0xC0/0xC8 are illegal modes.
            log::debug!("CD-ROM {id}: [Any Data Mode] 0x90/0x98/0xC0/0xC8 are illegal modes");
            return false;
        }

        if ((sector_type > 3) && (sector_type != 8)) || (mode2 & 0x03) != 0 {
            if (flags & 0xF0) == 0x30 {
                // 0x30/0x38 are illegal modes.
                log::debug!("CD-ROM {id}: [Any XA Mode 2] 0x30/0x38 are illegal modes");
                return false;
            }
            if ((flags & 0xF0) == 0xB0) || ((flags & 0xF0) == 0xD0) {
                // 0xBx and 0xDx are illegal modes.
                log::debug!("CD-ROM {id}: [Any XA Mode 2] 0xBx and 0xDx are illegal modes");
                return false;
            }
        }
    }

    true
}

/// Copy the flag-selected sub-regions of one raw data sector
///
/// Region offsets and sizes depend on the sector kind; the fixed order is
/// sync, header, sub-header, user data, EDC/ECC.
fn assemble_data_regions(kind: SectorKind, flags: u16, raw: &[u8], out: &mut Vec<u8>) {
    if (flags & 0x80) != 0 {
        // Sync
        out.extend_from_slice(&raw[0..12]);
    }

    if (flags & 0x20) != 0 {
        // Header
        out.extend_from_slice(&raw[12..16]);
    }

    if (flags & 0x40) != 0 {
        // Sub-header. Mode 1 has no real one: when user data is also
        // requested the field is suppressed rather than faked.
        let suppressed = kind == SectorKind::Mode1 && (flags & 0x10) != 0;
        if !suppressed {
            out.extend_from_slice(&raw[16..24]);
        }
    }

    if (flags & 0x10) != 0 {
        // User data
        match kind {
            SectorKind::Mode1 => out.extend_from_slice(&raw[16..2064]),
            // The +24 start with the full 2336-byte payload runs 8 bytes
            // into the zeroed C2 region; guests expect that tail.
            SectorKind::Mode2Formless => out.extend_from_slice(&raw[24..24 + 2336]),
            SectorKind::XaForm1 => out.extend_from_slice(&raw[24..2072]),
            SectorKind::XaForm2 => out.extend_from_slice(&raw[24..2352]),
            SectorKind::Audio => unreachable!(),
        }
    }

    if (flags & 0x08) != 0 {
        // EDC/ECC. Only Mode 1 and XA Form 1 carry one.
        match kind {
            SectorKind::Mode1 => out.extend_from_slice(&raw[2064..2352]),
            SectorKind::XaForm1 => out.extend_from_slice(&raw[2072..2352]),
            _ => {}
        }
    }
}

impl CdRomDrive {
    /// Execute the READ CD raw-sector extraction
    ///
    /// `sector` is decoded via `ismsf` (packed binary MSF) or, failing
    /// that, the shared vendor addressing byte. `sector_type` is the
    /// READ CD expected-type field (1 audio, 2 Mode 1, 3 Mode 2
    /// formless, 4/5 XA Form 1/2, 8 any-data, anything else auto);
    /// `sector_flags` carries the region bits plus the error-flag
    /// (0x006) and subchannel (0x700) mode fields.
    ///
    /// On success the assembled stream is written to `out` (which must
    /// hold at least [`SECTOR_BUFFER_SIZE`] bytes) and its length
    /// returned; every rejection returns None with the drive untouched.
    pub fn read_sector_raw(
        &mut self,
        sector: u32,
        ismsf: bool,
        sector_type: u8,
        sector_flags: u16,
        vendor_type: u8,
        out: &mut [u8],
    ) -> Option<usize> {
        if self.play.status == CdStatus::Empty {
            return None;
        }

        let lba = if ismsf {
            Msf::unpack(sector).to_lba()
        } else {
            self.resolve_vendor_pos(sector, vendor_type)
        };

        let class = self.track_class(lba);
        let audio = class.contains(TrackClass::AUDIO);
        let unknown = class.contains(TrackClass::UNKNOWN_DATA);
        let mode2 = class.mode2_bits();

        if (sector_flags & 0xF0) == 0 {
            // 0x00 and 0x08 are illegal modes.
            log::debug!("CD-ROM {}: 0x00 and 0x08 are illegal modes", self.id);
            return None;
        }

        if !track_type_is_valid(self.id, sector_type, sector_flags, audio, mode2) {
            return None;
        }

        if (sector_type > 5) && (sector_type != 8) {
            log::debug!("CD-ROM {}: Unrecognized sector type", self.id);
            return None;
        }

        let mut buf = [0u8; SECTOR_BUFFER_SIZE];
        if !self
            .ops
            .as_mut()
            .is_some_and(|ops| ops.read_sector(lba, &mut buf))
        {
            return None;
        }

        let mut assembled = Vec::with_capacity(SECTOR_BUFFER_SIZE);

        match sector_type {
            1 => {
                if !audio || (self.play.status == CdStatus::DataOnly) {
                    log::debug!("CD-ROM {}: Audio read from a data track", self.id);
                    return None;
                }
                assembled.extend_from_slice(&buf[..RAW_SECTOR_SIZE]);
            }
            2 => {
                if audio || mode2 != 0 {
                    log::debug!("CD-ROM {}: [Mode 1] Sector of another type", self.id);
                    return None;
                }
                assemble_data_regions(SectorKind::Mode1, sector_flags, &buf, &mut assembled);
            }
            3 => {
                if audio || mode2 == 0 || (mode2 & 0x03) != 0 {
                    log::debug!("CD-ROM {}: [Mode 2 Formless] Sector of another type", self.id);
                    return None;
                }
                assemble_data_regions(SectorKind::Mode2Formless, sector_flags, &buf, &mut assembled);
            }
            4 => {
                if audio || (mode2 & 0x03) != 0x01 {
                    log::debug!("CD-ROM {}: [XA Form 1] Sector of another type", self.id);
                    return None;
                }
                assemble_data_regions(SectorKind::XaForm1, sector_flags, &buf, &mut assembled);
            }
            5 => {
                if audio || (mode2 & 0x03) != 0x02 {
                    log::debug!("CD-ROM {}: [XA Form 2] Sector of another type", self.id);
                    return None;
                }
                assemble_data_regions(SectorKind::XaForm2, sector_flags, &buf, &mut assembled);
            }
            8 => {
                if audio {
                    log::debug!("CD-ROM {}: [Any Data] Read from an audio track", self.id);
                    return None;
                }
                let kind = if unknown {
                    sniff_sector_kind(&buf)?
                } else if (mode2 & 0x03) == 0x01 {
                    SectorKind::XaForm1
                } else if mode2 == 0 {
                    SectorKind::Mode1
                } else {
                    log::debug!(
                        "CD-ROM {}: [Any Data] Cooked size is not 2048 bytes",
                        self.id
                    );
                    return None;
                };
                assemble_data_regions(kind, sector_flags, &buf, &mut assembled);
            }
            _ => {
                // Auto: trust the classification, or the sector's own
                // mode byte when the backend cannot classify.
                if audio {
                    assembled.extend_from_slice(&buf[..RAW_SECTOR_SIZE]);
                } else {
                    let kind = if unknown {
                        sniff_sector_kind(&buf)?
                    } else if (mode2 & 0x03) == 0x01 {
                        SectorKind::XaForm1
                    } else if (mode2 & 0x03) == 0x02 {
                        SectorKind::XaForm2
                    } else if mode2 != 0 {
                        SectorKind::Mode2Formless
                    } else {
                        SectorKind::Mode1
                    };
                    assemble_data_regions(kind, sector_flags, &buf, &mut assembled);
                }
            }
        }

        if (sector_flags & 0x06) == 0x02 {
            // Error flags (294 bytes, currently always zero).
            assembled.extend_from_slice(&buf[OFS_C2..OFS_C2 + 294]);
        } else if (sector_flags & 0x06) == 0x04 {
            // Full error flags.
            assembled.extend_from_slice(&buf[OFS_C2..OFS_C2 + 296]);
        }

        match sector_flags & 0x700 {
            0x100 => assembled.extend_from_slice(&buf[OFS_SUBCH_RAW..OFS_SUBCH_RAW + 96]),
            0x200 => assembled.extend_from_slice(&buf[OFS_SUBCH_Q..OFS_SUBCH_Q + 16]),
            0x400 => assembled.extend_from_slice(&buf[OFS_SUBCH_RW..OFS_SUBCH_RW + 96]),
            _ => {}
        }

        let len = assembled.len();
        out[..len].copy_from_slice(&assembled);
        Some(len)
    }
}

/// Disambiguate an unclassified data sector by its header mode byte
///
/// Raw passthrough backends cannot always classify a track; the mode byte
/// at offset 0x0F of the raw sector settles Mode 1 versus XA Mode 2
/// Form 1 at runtime.
fn sniff_sector_kind(buf: &[u8]) -> Option<SectorKind> {
    match buf[0x0F] {
        1 => Some(SectorKind::Mode1),
        2 => Some(SectorKind::XaForm1),
        _ => None,
    }
}
