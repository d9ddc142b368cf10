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

//! Operation reports
//!
//! Every sync operation returns a typed report instead of printing; the CLI
//! decides how to render it and what exit code the failures deserve.

use oversized_store::Digest;

/// Result of a push or pull batch
#[derive(Debug, Clone, Default)]
pub struct TransferReport {
    /// Objects actually transferred
    pub transferred: Vec<Digest>,

    /// Objects already present on the receiving side
    pub skipped: Vec<Digest>,

    /// Per-object failures; these never abort the rest of the batch
    pub failed: Vec<(Digest, String)>,

    /// Total bytes moved
    pub bytes_transferred: u64,
}

impl TransferReport {
    /// True when every object transferred or was already present.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "{} transferred ({} bytes), {} skipped, {} failed",
            self.transferred.len(),
            self.bytes_transferred,
            self.skipped.len(),
            self.failed.len()
        )
    }
}

/// Result of a gc pass
#[derive(Debug, Clone, Default)]
pub struct GcReport {
    /// Unreferenced objects that were (or would be) removed
    pub removed: Vec<Digest>,

    /// Bytes those objects occupied
    pub bytes_reclaimed: u64,

    /// True when nothing was actually deleted
    pub dry_run: bool,
}

impl GcReport {
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "would remove" } else { "removed" };
        format!(
            "{} {} objects ({} bytes)",
            verb,
            self.removed.len(),
            self.bytes_reclaimed
        )
    }
}

/// A local object whose bytes no longer match its digest
#[derive(Debug, Clone)]
pub struct VerifyFinding {
    /// Digest the object is filed under
    pub digest: Digest,

    /// Digest its current bytes actually hash to
    pub actual: String,
}

/// Snapshot of local store vs. what history references
#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    /// Distinct digests referenced by pointers
    pub referenced: usize,

    /// Objects present in the local store
    pub local: usize,

    /// Referenced but missing locally (a pull would fetch these)
    pub stale: Vec<Digest>,

    /// Local but unreferenced (a gc would remove these)
    pub orphans: Vec<Digest>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_report_summary() {
        let report = TransferReport {
            transferred: vec![Digest::hash(b"a")],
            skipped: vec![Digest::hash(b"b"), Digest::hash(b"c")],
            failed: vec![],
            bytes_transferred: 42,
        };

        assert!(report.is_clean());
        assert_eq!(report.summary(), "1 transferred (42 bytes), 2 skipped, 0 failed");
    }

    #[test]
    fn test_failed_transfer_is_not_clean() {
        let report = TransferReport {
            failed: vec![(Digest::hash(b"x"), "boom".to_string())],
            ..Default::default()
        };
        assert!(!report.is_clean());
    }

    #[test]
    fn test_gc_report_dry_run_wording() {
        let report = GcReport {
            removed: vec![Digest::hash(b"a")],
            bytes_reclaimed: 10,
            dry_run: true,
        };
        assert!(report.summary().starts_with("would remove"));
    }
}
