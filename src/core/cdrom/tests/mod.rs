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

//! CD-ROM drive core test modules
//!
//! Tests are organized into the following categories:
//! - `basic`: Drive initialization, media attach/detach, status machine
//! - `codec`: LBA <-> MSF and BCD <-> binary conversions
//! - `timing`: Seek timing model
//! - `audio`: Playback, search, scan, and the mixer callback
//! - `toc`: READ TOC formats and disc-information queries
//! - `subchannel`: Q deinterleaving and vendor subchannel layouts
//! - `sector`: READ CD validation and raw sector extraction








#[cfg(test)]
mod sector;
