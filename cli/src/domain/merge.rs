//! Role merging: union of packages, conflict-checked union of files.
//!
//! Output order depends only on content: packages sort lexicographically and
//! files sort by path, whatever order the roles were listed in.

use std::collections::{BTreeMap, BTreeSet};
use std::collections::btree_map::Entry;

use crate::domain::error::ProvisionError;
use crate::domain::file::{FileEntry, Manifest};

/// The desired state of a host after merging every role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedState {
    packages: BTreeSet<String>,
    files: BTreeMap<String, FileEntry>,
}

impl MergedState {
    /// Merge a single manifest into an empty state.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Conflict`] if the manifest itself declares one
    /// path twice with different attributes.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self, ProvisionError> {
        let mut state = Self::default();
        state.absorb(manifest)?;
        Ok(state)
    }

    /// Add a manifest's packages and files to this state.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Conflict`] naming the first path whose
    /// attributes differ from an entry already present. The state may hold
    /// entries absorbed before the conflict.
    pub fn absorb(&mut self, manifest: &Manifest) -> Result<(), ProvisionError> {
        self.packages.extend(manifest.packages.iter().cloned());
        for file in &manifest.files {
            self.insert_file(file)?;
        }
        Ok(())
    }

    /// Combine two merged states under the same rules as [`Self::absorb`].
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Conflict`] if the states disagree on a path.
    pub fn combine(mut self, other: &Self) -> Result<Self, ProvisionError> {
        self.packages.extend(other.packages.iter().cloned());
        for file in other.files.values() {
            self.insert_file(file)?;
        }
        Ok(self)
    }

    fn insert_file(&mut self, file: &FileEntry) -> Result<(), ProvisionError> {
        match self.files.entry(file.path.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(file.clone());
            }
            Entry::Occupied(existing) => {
                if existing.get() != file {
                    return Err(ProvisionError::Conflict {
                        path: file.path.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Packages in install order.
    pub fn packages(&self) -> impl ExactSizeIterator<Item = &str> {
        self.packages.iter().map(String::as_str)
    }

    /// Files in archive order.
    pub fn files(&self) -> impl ExactSizeIterator<Item = &FileEntry> {
        self.files.values()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.files.is_empty()
    }

    /// Split into the sorted package list and the sorted file manifest.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<FileEntry>) {
        (
            self.packages.into_iter().collect(),
            self.files.into_values().collect(),
        )
    }
}

/// Merge any number of manifests into one desired state.
///
/// # Errors
///
/// Returns [`ProvisionError::Conflict`] if two manifests declare the same path
/// with different attributes.
pub fn merge<'a>(
    manifests: impl IntoIterator<Item = &'a Manifest>,
) -> Result<MergedState, ProvisionError> {
    let mut state = MergedState::default();
    for manifest in manifests {
        state.absorb(manifest)?;
    }
    Ok(state)
}
