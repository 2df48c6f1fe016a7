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

//! READ CD validation and raw sector extraction tests

use super::super::backend::TrackClass;
use super::super::subchannel::interleave_q;
use super::super::*;
use super::fixture::{audio_byte, data_byte, FixtureBackend, FixtureTrack};

fn drive_with(backend: FixtureBackend) -> CdRomDrive {
    let mut drive = CdRomDrive::new(0);
    drive.attach_backend(Box::new(backend));
    drive
}

fn read(
    drive: &mut CdRomDrive,
    sector: u32,
    sector_type: u8,
    flags: u16,
) -> Option<(usize, Vec<u8>)> {
    let mut out = vec![0u8; SECTOR_BUFFER_SIZE];
    let len = drive.read_sector_raw(sector, false, sector_type, flags, 0, &mut out)?;
    out.truncate(len);
    Some((len, out))
}

#[test]
fn test_validator_rejects_modes_without_header_or_data() {
    for flags in [0x00u16, 0x08, 0x80, 0x88] {
        assert!(!track_type_is_valid(0, 2, flags, false, 0));
    }
    assert!(track_type_is_valid(0, 2, 0x10, false, 0));
}

#[test]
fn test_validator_rejects_both_error_flag_bits() {
    assert!(!track_type_is_valid(0, 2, 0x16, false, 0));
    assert!(track_type_is_valid(0, 2, 0x12, false, 0));
    assert!(track_type_is_valid(0, 2, 0x14, false, 0));
}

#[test]
fn test_validator_rejects_bad_subchannel_modes() {
    assert!(!track_type_is_valid(0, 2, 0x310, false, 0));
    assert!(!track_type_is_valid(0, 2, 0x510, false, 0));
    assert!(!track_type_is_valid(0, 2, 0x710, false, 0));
    assert!(track_type_is_valid(0, 2, 0x110, false, 0));
    assert!(track_type_is_valid(0, 2, 0x210, false, 0));
    assert!(track_type_is_valid(0, 2, 0x410, false, 0));
}

#[test]
fn test_validator_rejects_ecc_without_user_data() {
    assert!(!track_type_is_valid(0, 2, 0x28, false, 0));
    assert!(track_type_is_valid(0, 2, 0x38, false, 0));
}

#[test]
fn test_validator_rejects_sync_without_header_fields() {
    assert!(!track_type_is_valid(0, 2, 0x90, false, 0));
    assert!(!track_type_is_valid(0, 2, 0xC0, false, 0));
}

#[test]
fn test_validator_xa_mode2_restrictions() {
    // Sub-header+header without user data is illegal on XA types
    assert!(!track_type_is_valid(0, 4, 0x30, false, 0x01));
    assert!(!track_type_is_valid(0, 4, 0xB0, false, 0x01));
    assert!(!track_type_is_valid(0, 4, 0xD0, false, 0x01));
    // The same bits are fine for plain Mode 1
    assert!(track_type_is_valid(0, 2, 0x30, false, 0));
}

#[test]
fn test_validator_skips_data_rules_for_audio() {
    assert!(track_type_is_valid(0, 1, 0x16, true, 0));
}

#[test]
fn test_read_on_empty_drive_fails() {
    let mut drive = CdRomDrive::new(0);
    let mut out = vec![0u8; SECTOR_BUFFER_SIZE];
    assert!(drive
        .read_sector_raw(0, false, 2, 0x10, 0, &mut out)
        .is_none());
}

#[test]
fn test_read_rejects_empty_region_mask() {
    let mut drive = drive_with(FixtureBackend::data_only());
    assert!(read(&mut drive, 10, 2, 0x02).is_none());
    assert!(read(&mut drive, 10, 2, 0x00).is_none());
}

#[test]
fn test_read_rejects_unknown_sector_types() {
    let mut drive = drive_with(FixtureBackend::data_only());
    assert!(read(&mut drive, 10, 6, 0x10).is_none());
    assert!(read(&mut drive, 10, 7, 0x10).is_none());
}

#[test]
fn test_audio_sector_read_returns_full_raw() {
    let mut drive = drive_with(FixtureBackend::data_audio());
    let (len, out) = read(&mut drive, 200, 1, 0x10).unwrap();
    assert_eq!(len, RAW_SECTOR_SIZE);
    assert_eq!(out[0], audio_byte(200, 0));
    assert_eq!(out[2351], audio_byte(200, 2351));
}

#[test]
fn test_audio_read_from_data_track_fails() {
    let mut drive = drive_with(FixtureBackend::data_audio());
    assert!(read(&mut drive, 10, 1, 0x10).is_none());
}

#[test]
fn test_mode1_user_data_only() {
    let mut drive = drive_with(FixtureBackend::data_only());
    let (len, out) = read(&mut drive, 10, 2, 0x10).unwrap();
    assert_eq!(len, 2048);
    assert_eq!(out[0], data_byte(10, 16));
    assert_eq!(out[2047], data_byte(10, 2063));
}

#[test]
fn test_mode1_full_raw_request() {
    let mut drive = drive_with(FixtureBackend::data_only());
    // Sync + header + (suppressed sub-header) + user data + EDC/ECC
    let (len, out) = read(&mut drive, 10, 2, 0xF8).unwrap();
    assert_eq!(len, RAW_SECTOR_SIZE);
    assert_eq!(out[0], 0x00);
    assert_eq!(&out[1..11], &[0xFF; 10]);
    // Header directly follows sync: BCD MSF of LBA 10 plus mode byte
    assert_eq!(&out[12..16], &[0x00, 0x02, 0x10, 0x01]);
    assert_eq!(out[16], data_byte(10, 16));
}

#[test]
fn test_mode1_subheader_suppressed_only_with_user_data() {
    let mut drive = drive_with(FixtureBackend::data_only());

    let (len, _) = read(&mut drive, 10, 2, 0x50).unwrap();
    assert_eq!(len, 2048);

    let (len, out) = read(&mut drive, 10, 2, 0x60).unwrap();
    assert_eq!(len, 4 + 8);
    assert_eq!(&out[0..3], &[0x00, 0x02, 0x10]);
}

#[test]
fn test_mode1_read_rejects_other_track_types() {
    let mut drive = drive_with(FixtureBackend::data_audio());
    assert!(read(&mut drive, 200, 2, 0x10).is_none());

    let mut drive = drive_with(FixtureBackend::xa_form1());
    assert!(read(&mut drive, 10, 2, 0x10).is_none());
}

#[test]
fn test_mode2_formless_payload_runs_into_zero_fill() {
    let mut backend = FixtureBackend::xa_form1();
    backend.tracks[0].class = TrackClass::MODE2;
    let mut drive = drive_with(backend);

    let (len, out) = read(&mut drive, 10, 3, 0x10).unwrap();
    assert_eq!(len, 2336);
    assert_eq!(out[0], data_byte(10, 24));
    // The tail spills into the zeroed error-flag region
    assert_eq!(&out[2328..2336], &[0u8; 8]);
}

#[test]
fn test_xa_form1_regions() {
    let mut drive = drive_with(FixtureBackend::xa_form1());

    let (len, out) = read(&mut drive, 10, 4, 0x10).unwrap();
    assert_eq!(len, 2048);
    assert_eq!(out[0], data_byte(10, 24));

    let (len, out) = read(&mut drive, 10, 4, 0x18).unwrap();
    assert_eq!(len, 2048 + 280);
    assert_eq!(out[2048], data_byte(10, 2072));

    assert!(read(&mut drive, 10, 5, 0x10).is_none());
}

#[test]
fn test_xa_form2_user_data() {
    let mut drive = drive_with(FixtureBackend::xa_form2());
    let (len, out) = read(&mut drive, 10, 5, 0x10).unwrap();
    assert_eq!(len, 2328);
    assert_eq!(out[0], data_byte(10, 24));
    assert_eq!(out[2327], data_byte(10, 2351));

    assert!(read(&mut drive, 10, 4, 0x10).is_none());
}

#[test]
fn test_any_data_type_accepts_2048_byte_layouts_only() {
    let mut drive = drive_with(FixtureBackend::data_only());
    let (len, _) = read(&mut drive, 10, 8, 0x10).unwrap();
    assert_eq!(len, 2048);

    let mut drive = drive_with(FixtureBackend::xa_form1());
    let (len, _) = read(&mut drive, 10, 8, 0x10).unwrap();
    assert_eq!(len, 2048);

    let mut drive = drive_with(FixtureBackend::xa_form2());
    assert!(read(&mut drive, 10, 8, 0x10).is_none());

    let mut drive = drive_with(FixtureBackend::data_audio());
    assert!(read(&mut drive, 200, 8, 0x10).is_none());
}

#[test]
fn test_auto_type_follows_track_classification() {
    let mut drive = drive_with(FixtureBackend::data_audio());
    let (len, out) = read(&mut drive, 200, 0, 0x10).unwrap();
    assert_eq!(len, RAW_SECTOR_SIZE);
    assert_eq!(out[0], audio_byte(200, 0));

    let (len, out) = read(&mut drive, 10, 0, 0x10).unwrap();
    assert_eq!(len, 2048);
    assert_eq!(out[0], data_byte(10, 16));
}

#[test]
fn test_unclassified_track_sniffs_the_mode_byte() {
    let mut drive = drive_with(FixtureBackend::unknown_data(1));
    let (len, out) = read(&mut drive, 10, 0, 0x10).unwrap();
    assert_eq!(len, 2048);
    assert_eq!(out[0], data_byte(10, 16));

    let mut drive = drive_with(FixtureBackend::unknown_data(2));
    let (len, out) = read(&mut drive, 10, 0, 0x10).unwrap();
    assert_eq!(len, 2048);
    assert_eq!(out[0], data_byte(10, 24));

    let mut drive = drive_with(FixtureBackend::unknown_data(3));
    assert!(read(&mut drive, 10, 0, 0x10).is_none());
}

#[test]
fn test_error_flag_regions_are_appended() {
    let mut drive = drive_with(FixtureBackend::data_only());

    let (len, out) = read(&mut drive, 10, 2, 0x12).unwrap();
    assert_eq!(len, 2048 + 294);
    assert!(out[2048..].iter().all(|&x| x == 0));

    let (len, _) = read(&mut drive, 10, 2, 0x14).unwrap();
    assert_eq!(len, 2048 + 296);
}

#[test]
fn test_subchannel_regions_are_appended() {
    let backend = FixtureBackend::data_only();
    let q = backend.q_for(10);
    let mut drive = drive_with(backend);

    let (len, out) = read(&mut drive, 10, 2, 0x110).unwrap();
    assert_eq!(len, 2048 + 96);
    assert_eq!(&out[2048..], &interleave_q(&q));

    let (len, out) = read(&mut drive, 10, 2, 0x210).unwrap();
    assert_eq!(len, 2048 + 16);
    assert_eq!(&out[2048..2060], &q);
    assert_eq!(&out[2060..], &[0u8; 4]);

    let (len, out) = read(&mut drive, 10, 2, 0x410).unwrap();
    assert_eq!(len, 2048 + 96);
    assert!(out[2048..].iter().all(|&x| x == 0x5A));
}

#[test]
fn test_extraction_is_deterministic() {
    let mut drive = drive_with(FixtureBackend::data_only());
    let first = read(&mut drive, 10, 2, 0xF8).unwrap();
    let second = read(&mut drive, 10, 2, 0xF8).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_msf_addressed_read() {
    let mut drive = drive_with(FixtureBackend::data_only());
    let mut out = vec![0u8; SECTOR_BUFFER_SIZE];
    // Binary 00:02:10 = LBA 10
    let len = drive
        .read_sector_raw(0x000210, true, 2, 0x10, 0, &mut out)
        .unwrap();
    assert_eq!(len, 2048);
    assert_eq!(out[0], data_byte(10, 16));
}

#[test]
fn test_vendor_track_addressed_read() {
    let mut drive = drive_with(FixtureBackend::data_audio());
    let mut out = vec![0u8; SECTOR_BUFFER_SIZE];
    // BCD track 2 starts at LBA 150, an audio sector
    let len = drive
        .read_sector_raw(0x02, false, 1, 0x10, 0x80, &mut out)
        .unwrap();
    assert_eq!(len, RAW_SECTOR_SIZE);
    assert_eq!(out[0], audio_byte(150, 0));
}
