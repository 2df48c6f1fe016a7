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

//! Optical drive emulation core library
//!
//! This library provides the generic CD-ROM drive core used by emulated
//! SCSI/ATAPI and vendor proprietary controllers: drive state machine,
//! seek timing, subchannel/TOC generation, and raw READ CD sector
//! extraction. Backing image formats plug in behind the
//! [`core::cdrom::CdRomBackend`] trait.
//!
//! # Example
//!
//! ```
//! use opticore::core::cdrom::{CdRomDrive, CdStatus};
//!
//! let mut drive = CdRomDrive::new(0);
//! assert_eq!(drive.status(), CdStatus::Empty);
//! ```

pub mod core;
