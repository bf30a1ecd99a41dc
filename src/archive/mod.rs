//! 3-Space archive containers.
//!
//! Every container format implements [`ArchivePlugin`], so the
//! [`ResourceExplorer`](crate::ResourceExplorer) can list and extract from any
//! of them without knowing which one it is holding.
//!
//! ## Supported Containers
//!
//! - [`VolFileArchive`]: `VOL`, a single flat directory table
//! - [`DynFileArchive`]: `DYN`, layered directory tables where later patches
//!   override earlier entries of the same name
//! - [`RmfFileArchive`]: `RMF`, directory tables whose folder records point at
//!   nested tables
//!
//! ## Stream Contract
//!
//! Plugins receive the caller's stream. Position 0 is the first byte of the
//! archive; when the archive is nested inside another one the caller hands in a
//! [`SubStream`](crate::io::SubStream) window so this still holds.
//!
//! - `is_supported` / `stream_is_supported` peek at the current position and
//!   always leave the cursor where it was.
//! - `get_content_listing` reads from absolute offsets; the cursor is left
//!   somewhere inside the directory data.
//! - `set_stream_position` leaves the cursor on the first byte of the entry.
//! - `extract_file_contents` leaves the cursor just past the entry.
//!
//! Entries are stored verbatim: no container here compresses its data.

mod dyn_vol;
mod rmf;
mod structures;
mod vol;

pub use dyn_vol::DynFileArchive;
pub use rmf::RmfFileArchive;
pub use structures::{DirectoryEntry, NAME_LEN};
pub use vol::VolFileArchive;

use std::io::{Read, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::io::{self, ReadSeek};

/// A file stored in a container, or a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Full logical path: the container's path joined with the entry name.
    pub filename: PathBuf,
    /// Logical path of the archive or folder that holds this entry.
    pub folder_path: PathBuf,
    /// Offset of the data from the start of the container's bytes.
    pub offset: u64,
    /// Size of the data in bytes.
    pub size: u64,
}

impl FileInfo {
    pub fn new(folder_path: &Path, name: &str, offset: u64, size: u64) -> Self {
        Self {
            filename: folder_path.join(name),
            folder_path: folder_path.to_path_buf(),
            offset,
            size,
        }
    }

    /// Last component of the logical path.
    pub fn name(&self) -> String {
        self.filename
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A folder, either inside an RMF archive or on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    pub name: String,
    pub full_path: PathBuf,
    /// Child entries in directory order. Empty for on-disk folders, which are
    /// listed one level at a time.
    pub children: Vec<ContentEntry>,
}

/// One item of a content listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEntry {
    File(FileInfo),
    Folder(FolderInfo),
}

impl ContentEntry {
    pub fn path(&self) -> &Path {
        match self {
            ContentEntry::File(info) => &info.filename,
            ContentEntry::Folder(folder) => &folder.full_path,
        }
    }

    pub fn as_file(&self) -> Option<&FileInfo> {
        match self {
            ContentEntry::File(info) => Some(info),
            ContentEntry::Folder(_) => None,
        }
    }
}

/// Collect every file in a listing, descending into folders depth first.
pub fn flatten_files(entries: &[ContentEntry]) -> Vec<FileInfo> {
    let mut files = Vec::new();
    for entry in entries {
        match entry {
            ContentEntry::File(info) => files.push(info.clone()),
            ContentEntry::Folder(folder) => files.extend(flatten_files(&folder.children)),
        }
    }
    files
}

/// Capability set shared by every container format.
pub trait ArchivePlugin: Send + Sync {
    /// Short format name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether the bytes at the stream's current position carry this format's
    /// magic. The cursor is restored whatever the outcome.
    fn stream_is_supported(&self, stream: &mut dyn ReadSeek) -> Result<bool>;

    /// Parse the directory and return its entries in table order. Each entry's
    /// logical path is `archive_path` joined with its name.
    ///
    /// Either the whole directory parses or the call fails.
    fn get_content_listing(
        &self,
        stream: &mut dyn ReadSeek,
        archive_path: &Path,
    ) -> Result<Vec<ContentEntry>>;

    /// Seek to the first byte of `info`.
    fn set_stream_position(&self, stream: &mut dyn ReadSeek, info: &FileInfo) -> Result<()> {
        let len = io::stream_len(stream)?;
        if info.offset > len {
            return Err(Error::OffsetOutOfRange {
                offset: info.offset,
                len,
            });
        }
        stream.seek(SeekFrom::Start(info.offset))?;
        Ok(())
    }

    /// Copy exactly `info.size` bytes of `info` to `output`.
    ///
    /// The range is checked against the stream before anything is written.
    fn extract_file_contents(
        &self,
        stream: &mut dyn ReadSeek,
        info: &FileInfo,
        output: &mut dyn Write,
    ) -> Result<()> {
        let len = io::stream_len(stream)?;
        if info.offset > len {
            return Err(Error::OffsetOutOfRange {
                offset: info.offset,
                len,
            });
        }
        if info.offset.checked_add(info.size).is_none_or(|end| end > len) {
            return Err(short_read(info.size, len - info.offset));
        }

        self.set_stream_position(stream, info)?;
        let mut limited = (&mut *stream).take(info.size);
        let copied = std::io::copy(&mut limited, output)?;
        if copied != info.size {
            return Err(short_read(info.size, copied));
        }
        Ok(())
    }
}

fn short_read(wanted: u64, available: u64) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        format!("entry needs {wanted} bytes but only {available} are available"),
    ))
}
