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

//! Repository plumbing over libgit2
//!
//! Everything that touches the host repository goes through [`Repo`]:
//! configuration keys, filter-driver installation, `.gitattributes`
//! management, pointer enumeration from history and from the index, and the
//! working-tree and index rewrites the `checkout` and `index-filter`
//! commands perform.
//!
//! Pointer enumeration is the foundation gc stands on, so any traversal
//! error aborts the whole enumeration instead of yielding a partial (and
//! therefore unsafe) reachability set.

use crate::error::{GitError, GitResult};
use crate::pointer::{Pointer, BLOCK_LEN};
use git2::{ErrorCode, ObjectType, Repository};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Filter driver name used in git configuration and .gitattributes
pub const FILTER_DRIVER_NAME: &str = "oversized";

/// A pointer found in the repository, with where it was found
#[derive(Debug, Clone)]
pub struct PointerRef {
    pub pointer: Pointer,

    /// Git blob holding the pointer record
    pub blob_id: git2::Oid,

    /// Commit the blob was first seen in; `None` for index entries
    pub commit_id: Option<git2::Oid>,

    /// Repository-relative path the pointer was seen at
    pub path: String,
}

/// A file staged in the index, as seen by the index-filter rewrite
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: String,
    pub blob_id: git2::Oid,
    pub size: u64,
}

/// Handle to the host git repository
pub struct Repo {
    inner: Repository,
}

impl Repo {
    /// Discover the repository containing the current directory.
    pub fn discover() -> GitResult<Self> {
        Self::discover_from(".")
    }

    /// Discover the repository containing `path`.
    pub fn discover_from<P: AsRef<Path>>(path: P) -> GitResult<Self> {
        let inner = Repository::discover(path.as_ref()).map_err(|e| {
            GitError::NotARepository(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Ok(Repo { inner })
    }

    /// Open the repository described by the `GIT_DIR`/`GIT_INDEX_FILE`
    /// environment, as set up by `git filter-branch` and filter invocations.
    pub fn open_from_env() -> GitResult<Self> {
        let inner = Repository::open_from_env()
            .map_err(|e| GitError::NotARepository(format!("from environment: {}", e)))?;
        Ok(Repo { inner })
    }

    /// The repository's `.git` directory (metadata root).
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    /// The working tree root, or an error for bare repositories.
    pub fn workdir(&self) -> GitResult<&Path> {
        self.inner.workdir().ok_or(GitError::NoWorkdir)
    }

    /// The repository's live configuration object.
    pub fn config(&self) -> GitResult<git2::Config> {
        Ok(self.inner.config()?)
    }

    /// Read a repository configuration value, `None` when unset.
    pub fn config_get(&self, key: &str) -> GitResult<Option<String>> {
        let config = self.inner.config()?.snapshot()?;
        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a repository configuration value.
    pub fn config_set(&self, key: &str, value: &str) -> GitResult<()> {
        let mut config = self.inner.config()?;
        config.set_str(key, value)?;
        Ok(())
    }

    /// Register the clean/smudge filter driver in repository config.
    ///
    /// `required = true` makes git abort the operation when a filter fails,
    /// which is what keeps a missing object from silently checking out as a
    /// pointer record.
    pub fn install_filter(&self) -> GitResult<()> {
        info!("Installing filter driver in {:?}", self.git_dir());

        let mut config = self.inner.config()?;
        config.set_str(
            &format!("filter.{}.clean", FILTER_DRIVER_NAME),
            "git-oversized filter-clean %f",
        )?;
        config.set_str(
            &format!("filter.{}.smudge", FILTER_DRIVER_NAME),
            "git-oversized filter-smudge %f",
        )?;
        config.set_bool(&format!("filter.{}.required", FILTER_DRIVER_NAME), true)?;

        Ok(())
    }

    /// Add a pattern to .gitattributes, routing matching files through the
    /// filter driver. Idempotent.
    pub fn track(&self, pattern: &str) -> GitResult<()> {
        let path = self.workdir()?.join(".gitattributes");

        let mut content = if path.exists() {
            fs::read_to_string(&path).map_err(|e| GitError::GitattributesConfig(e.to_string()))?
        } else {
            String::new()
        };

        let filter_line = format!("{} filter={}", pattern, FILTER_DRIVER_NAME);
        if content.lines().any(|line| line.trim() == filter_line) {
            debug!("Pattern {} already tracked", pattern);
            return Ok(());
        }

        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&filter_line);
        content.push('\n');

        fs::write(&path, content).map_err(|e| GitError::GitattributesConfig(e.to_string()))?;

        info!("Pattern {} added to .gitattributes", pattern);
        Ok(())
    }

    /// Remove a pattern from .gitattributes. Succeeds when absent.
    pub fn untrack(&self, pattern: &str) -> GitResult<()> {
        let path = self.workdir()?.join(".gitattributes");
        if !path.exists() {
            return Ok(());
        }

        let content =
            fs::read_to_string(&path).map_err(|e| GitError::GitattributesConfig(e.to_string()))?;

        let filter_line = format!("{} filter={}", pattern, FILTER_DRIVER_NAME);
        let mut new_content = content
            .lines()
            .filter(|line| line.trim() != filter_line)
            .collect::<Vec<_>>()
            .join("\n");
        if !new_content.is_empty() {
            new_content.push('\n');
        }

        fs::write(&path, new_content).map_err(|e| GitError::GitattributesConfig(e.to_string()))?;

        info!("Pattern {} removed from .gitattributes", pattern);
        Ok(())
    }

    /// Enumerate every pointer reachable from any ref.
    ///
    /// Walks all commits (optionally only those newer than `window`), then
    /// each commit's tree. The tip commit of every ref is always scanned,
    /// whatever its age: the window prunes ancestors, never live branch
    /// tips. Only blobs no larger than one block are decode candidates, and
    /// each unique blob is decoded once. Errors abort the enumeration: a
    /// partial result must never feed a gc.
    pub fn pointers_in_history(&self, window: Option<Duration>) -> GitResult<Vec<PointerRef>> {
        let cutoff = window.map(epoch_cutoff).transpose()?;
        let tips = if cutoff.is_some() {
            self.ref_tips()?
        } else {
            HashSet::new()
        };

        let mut walk = self.inner.revwalk()?;
        walk.push_glob("refs/*")?;
        match walk.push_head() {
            Ok(()) => {}
            // Unborn HEAD (fresh repo) has nothing to walk.
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut seen_blobs = HashSet::new();
        let mut seen_trees = HashSet::new();
        let mut refs = Vec::new();

        for commit_id in walk {
            let commit_id = commit_id?;
            let commit = self.inner.find_commit(commit_id)?;

            if let Some(cutoff) = cutoff {
                if commit.time().seconds() < cutoff && !tips.contains(&commit_id) {
                    continue;
                }
            }

            self.collect_tree_pointers(
                &commit.tree()?,
                "",
                Some(commit_id),
                &mut seen_blobs,
                &mut seen_trees,
                &mut refs,
            )?;
        }

        debug!(
            pointers = refs.len(),
            blobs_scanned = seen_blobs.len(),
            "history pointer scan complete"
        );
        Ok(refs)
    }

    /// Enumerate pointers staged in the current index.
    pub fn pointers_in_index(&self) -> GitResult<Vec<PointerRef>> {
        let index = self.inner.index()?;
        let mut refs = Vec::new();

        for entry in index.iter() {
            if u64::from(entry.file_size) > BLOCK_LEN as u64 {
                continue;
            }

            let blob = match self.inner.find_blob(entry.id) {
                Ok(blob) => blob,
                // Sparse or unmerged entries can reference objects we do
                // not have; they cannot be our pointers.
                Err(e) if e.code() == ErrorCode::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            if let Ok(pointer) = Pointer::decode(blob.content()) {
                refs.push(PointerRef {
                    pointer,
                    blob_id: entry.id,
                    commit_id: None,
                    path: String::from_utf8_lossy(&entry.path).into_owned(),
                });
            }
        }

        Ok(refs)
    }

    /// Index entries strictly larger than `threshold` bytes.
    pub fn large_index_entries(&self, threshold: u64) -> GitResult<Vec<StagedFile>> {
        let index = self.inner.index()?;
        let mut staged = Vec::new();

        for entry in index.iter() {
            let blob = match self.inner.find_blob(entry.id) {
                Ok(blob) => blob,
                Err(e) if e.code() == ErrorCode::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            let size = blob.size() as u64;
            if size > threshold {
                staged.push(StagedFile {
                    path: String::from_utf8_lossy(&entry.path).into_owned(),
                    blob_id: entry.id,
                    size,
                });
            }
        }

        Ok(staged)
    }

    /// Raw content of a blob.
    pub fn blob_content(&self, id: git2::Oid) -> GitResult<Vec<u8>> {
        Ok(self.inner.find_blob(id)?.content().to_vec())
    }

    /// Replace a staged file's content in the index with `data`.
    ///
    /// Writes `data` as a new blob and repoints the existing index entry at
    /// it. The index is written back immediately.
    pub fn replace_index_entry(&self, path: &str, data: &[u8]) -> GitResult<()> {
        let mut index = self.inner.index()?;

        let mut entry = index
            .get_path(Path::new(path), 0)
            .ok_or_else(|| GitError::FilterFailed(format!("no index entry for {}", path)))?;

        entry.id = self.inner.blob(data)?;
        entry.file_size = data.len() as u32;
        index.add(&entry)?;
        index.write()?;

        debug!(path, bytes = data.len(), "index entry rewritten");
        Ok(())
    }

    /// Absolute path of a working-tree file.
    pub fn workdir_file(&self, rel_path: &str) -> GitResult<PathBuf> {
        Ok(self.workdir()?.join(rel_path))
    }

    /// Atomically replace a working-tree file with a copy of `source`.
    ///
    /// The copy is staged next to the destination and renamed into place, so
    /// an interrupted checkout never leaves a truncated working file. The
    /// result is writable regardless of the source's permissions.
    pub fn materialize(&self, rel_path: &str, source: &Path) -> GitResult<()> {
        let dest = self.workdir_file(rel_path)?;
        let dir = dest
            .parent()
            .ok_or_else(|| GitError::FilterFailed(format!("no parent dir for {}", rel_path)))?;

        let tmp = dir.join(format!(".oversized-{}.tmp", std::process::id()));
        fs::copy(source, &tmp)?;

        // Store objects are read-only; working files must not be.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644))?;
        }
        #[cfg(not(unix))]
        {
            let mut perms = fs::metadata(&tmp)?.permissions();
            perms.set_readonly(false);
            fs::set_permissions(&tmp, perms)?;
        }

        fs::rename(&tmp, &dest)?;
        debug!(path = rel_path, "working file materialized");
        Ok(())
    }

    /// Commit ids every ref (and HEAD) currently points at.
    fn ref_tips(&self) -> GitResult<HashSet<git2::Oid>> {
        let mut tips = HashSet::new();

        for reference in self.inner.references_glob("refs/*")? {
            let reference = reference?;
            if let Ok(commit) = reference.peel_to_commit() {
                tips.insert(commit.id());
            }
        }

        match self.inner.head() {
            Ok(head) => {
                if let Ok(commit) = head.peel_to_commit() {
                    tips.insert(commit.id());
                }
            }
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(tips)
    }

    fn collect_tree_pointers(
        &self,
        tree: &git2::Tree<'_>,
        prefix: &str,
        commit_id: Option<git2::Oid>,
        seen_blobs: &mut HashSet<git2::Oid>,
        seen_trees: &mut HashSet<git2::Oid>,
        out: &mut Vec<PointerRef>,
    ) -> GitResult<()> {
        if !seen_trees.insert(tree.id()) {
            return Ok(());
        }

        for entry in tree.iter() {
            let name = entry.name().unwrap_or_default();
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", prefix, name)
            };

            match entry.kind() {
                Some(ObjectType::Tree) => {
                    let subtree = self.inner.find_tree(entry.id())?;
                    self.collect_tree_pointers(
                        &subtree, &path, commit_id, seen_blobs, seen_trees, out,
                    )?;
                }
                Some(ObjectType::Blob) => {
                    if !seen_blobs.insert(entry.id()) {
                        continue;
                    }

                    let blob = self.inner.find_blob(entry.id())?;
                    if blob.size() > BLOCK_LEN {
                        continue;
                    }

                    if let Ok(pointer) = Pointer::decode(blob.content()) {
                        out.push(PointerRef {
                            pointer,
                            blob_id: entry.id(),
                            commit_id,
                            path,
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo")
            .field("git_dir", &self.git_dir())
            .finish()
    }
}

/// Epoch seconds for "now minus window".
fn epoch_cutoff(window: Duration) -> GitResult<i64> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| GitError::FilterFailed(format!("system clock before epoch: {}", e)))?;
    Ok(now.as_secs().saturating_sub(window.as_secs()) as i64)
}
