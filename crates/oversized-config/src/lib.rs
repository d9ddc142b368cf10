// Oversized - Large File Storage for Git
// Copyright (C) 2025 Oversized Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Repository configuration for oversized
//!
//! [`Settings`] reads and writes the `oversized.*` git config keys;
//! [`credentials`] holds the init-time AWS profile check. Settings are
//! loaded once per invocation and passed explicitly to whatever needs them.

pub mod credentials;
pub mod error;
pub mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{Settings, KEY_BUCKET, KEY_PREFIX, KEY_PROFILE};
