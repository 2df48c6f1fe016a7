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

/// Emulator error types
use thiserror::Error;

/// Result type for drive lifecycle and configuration operations
pub type Result<T> = std::result::Result<T, CdRomError>;

/// CD-ROM core error type
///
/// Only lifecycle, configuration, and backend-attachment failures are
/// reported through this type. Per-command failures (illegal mode bits,
/// playback of a non-audio position, reads past the image) are ordinary
/// return values on the drive operations themselves, because the command
/// layer translates those into protocol-level status, not into errors.
#[derive(Error, Debug)]
pub enum CdRomError {
    #[error("Invalid drive id: {0}")]
    InvalidDrive(u8),

    #[error("Invalid drive configuration: {0}")]
    InvalidConfig(String),

    #[error("Disc image load error: {0}")]
    DiscLoad(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
