//! Desired files and the declarative half of a role.
//!
//! Pure data only. Hooks live with the run context in the application layer.

/// Default mode for regular files created with [`FileEntry::file`].
pub const DEFAULT_FILE_MODE: u32 = 0o644;
/// Default mode for directories created with [`FileEntry::dir`].
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// One path the target host should have.
///
/// The path is the identity; two entries with the same path must be equal in
/// every field or merging fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    pub path: String,
    pub is_dir: bool,
    pub owner: String,
    pub group: String,
    pub mode: u32,
    /// Ignored for directories.
    pub contents: Vec<u8>,
}

impl FileEntry {
    /// A regular file owned by `root:root` with mode `0644`.
    #[must_use]
    pub fn file(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            owner: "root".to_string(),
            group: "root".to_string(),
            mode: DEFAULT_FILE_MODE,
            contents: contents.into(),
        }
    }

    /// A directory owned by `root:root` with mode `0755`.
    #[must_use]
    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            owner: "root".to_string(),
            group: "root".to_string(),
            mode: DEFAULT_DIR_MODE,
            contents: Vec::new(),
        }
    }

    #[must_use]
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }
}

/// Packages and files a role asks for, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub packages: Vec<String>,
    pub files: Vec<FileEntry>,
}
