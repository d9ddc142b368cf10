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

//! Git integration for oversized
//!
//! Three pieces connect the object store to the host repository:
//!
//! - [`Pointer`]: the small JSON record committed in place of a large file
//! - [`FilterPipeline`]: streaming clean/smudge over the pointer codec and
//!   the object store
//! - [`Repo`]: libgit2 plumbing for configuration, filter installation,
//!   `.gitattributes` tracking, pointer enumeration and index rewriting
//!
//! The git side only ever sees pointer records; file bodies live in
//! `oversized-store` and travel through the filters.

pub mod error;
pub mod filter;
pub mod pointer;
pub mod repo;

pub use error::{GitError, GitResult};
pub use filter::{CleanOutcome, FilterPipeline, SmudgeOutcome};
pub use pointer::{Pointer, PointerDecodeError, BLOCK_LEN, MAGIC};
pub use repo::{PointerRef, Repo, StagedFile, FILTER_DRIVER_NAME};
