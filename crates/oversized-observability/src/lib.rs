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

//! Tracing setup for oversized
//!
//! One place configures logging for every binary entry point. Output is
//! stderr-only by design: filter processes own stdout.

pub mod config;
pub mod init;

pub use config::{LogConfig, LogError, LogFormat};
pub use init::{init_tracing, init_tracing_with_config};
