//! Streaming `.tar.gz` encoder for file manifests.
//!
//! The archive is written entry by entry into any [`Write`], so it can be fed
//! straight into a remote `tar -x` without being staged locally.

use std::io::{self, Write};

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::{Builder, EntryType, Header};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::runtime::Handle;

use crate::domain::FileEntry;

/// Write `files` as a gzip-compressed ustar archive into `out`.
///
/// Every entry carries `mtime` as its modification time. Paths are stored
/// verbatim, so absolute paths stay absolute.
///
/// The tar writer, the gzip writer, and `out` are closed in that order
/// whether or not writing the entries succeeded.
///
/// # Errors
///
/// Returns the first I/O error: from writing an entry (including a path or
/// owner name that does not fit a ustar header), or from closing the stream.
pub fn write_archive<W: Write>(out: W, files: &[FileEntry], mtime: u64) -> io::Result<()> {
    let mut builder = Builder::new(GzEncoder::new(out, Compression::default()));
    let appended = files
        .iter()
        .try_for_each(|file| append_entry(&mut builder, file, mtime));

    let closed = builder
        .into_inner()
        .and_then(GzEncoder::finish)
        .and_then(|mut sink| sink.flush());

    appended.and(closed)
}

fn append_entry<W: Write>(builder: &mut Builder<W>, file: &FileEntry, mtime: u64) -> io::Result<()> {
    let mut header = Header::new_ustar();
    set_entry_path(&mut header, &file.path)?;
    header.set_mode(file.mode);
    header.set_username(&file.owner)?;
    header.set_groupname(&file.group)?;
    header.set_mtime(mtime);

    if file.is_dir {
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        header.set_cksum();
        builder.append(&header, io::empty())
    } else {
        header.set_entry_type(EntryType::Regular);
        header.set_size(file.contents.len() as u64);
        header.set_cksum();
        builder.append(&header, file.contents.as_slice())
    }
}

/// Store `path` in the ustar name/prefix fields without normalisation.
///
/// `Header::set_path` rejects absolute paths, but extraction runs with `-P`
/// and relies on them. Paths over 100 bytes are split at a `/` into the
/// 155-byte prefix and the 100-byte name.
fn set_entry_path(header: &mut Header, path: &str) -> io::Result<()> {
    let too_long = || {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path does not fit in a ustar header: {path}"),
        )
    };
    let ustar = header
        .as_ustar_mut()
        .ok_or_else(|| io::Error::other("header is not ustar"))?;
    let bytes = path.as_bytes();
    if bytes.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty path"));
    }

    if bytes.len() <= ustar.name.len() {
        ustar.name[..bytes.len()].copy_from_slice(bytes);
        return Ok(());
    }

    let split = bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'/' && i > 0 && i + 1 < bytes.len())
        .map(|(i, _)| i)
        .find(|&i| i <= ustar.prefix.len() && bytes.len() - i - 1 <= ustar.name.len())
        .ok_or_else(too_long)?;

    let (prefix, name) = (&bytes[..split], &bytes[split + 1..]);
    ustar.prefix[..prefix.len()].copy_from_slice(prefix);
    ustar.name[..name.len()].copy_from_slice(name);
    Ok(())
}

// ── Blocking bridge ───────────────────────────────────────────────────────────

/// Synchronous [`Write`] over an async writer, for use on the blocking pool.
///
/// Every call blocks the current thread on the runtime `handle`; never use it
/// from inside an async task.
pub struct BlockingWriter<W> {
    inner: W,
    handle: Handle,
}

impl<W: AsyncWrite + Unpin> BlockingWriter<W> {
    #[must_use]
    pub fn new(inner: W, handle: Handle) -> Self {
        Self { inner, handle }
    }
}

impl<W: AsyncWrite + Unpin> Write for BlockingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.handle.block_on(self.inner.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.handle.block_on(self.inner.flush())
    }
}
