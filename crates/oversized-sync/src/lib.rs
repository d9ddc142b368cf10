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

//! Synchronization engine for oversized
//!
//! [`SyncEngine`] moves objects between the local store and the remote
//! bucket (push/pull), prunes unreferenced local objects (gc), and audits
//! local integrity (verify). Operations return typed reports; rendering and
//! exit codes belong to the CLI.

pub mod engine;
pub mod error;
pub mod local;
pub mod lock;
pub mod report;

pub use engine::{SyncEngine, DEFAULT_WORKERS};
pub use local::find_refs;
pub use error::{SyncError, SyncResult};
pub use lock::GcLock;
pub use report::{GcReport, StatusReport, TransferReport, VerifyFinding};
