use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::HashSet;
use std::io::{Read, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};
use crate::io::{self, ReadSeek};

use super::structures;
use super::{ArchivePlugin, ContentEntry, FileInfo, FolderInfo};

const FORMAT: &str = "rmf";

/// Deepest folder nesting accepted.
const MAX_DEPTH: usize = 32;

/// Kind of an RMF directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmfEntryKind {
    File,
    Folder,
}

impl RmfEntryKind {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(RmfEntryKind::File),
            1 => Some(RmfEntryKind::Folder),
            _ => None,
        }
    }
}

/// RMF directory record - 28 bytes
#[derive(Debug, Clone)]
struct RmfRecord {
    name: String,
    kind: u32,
    offset: u32,
    size: u32,
}

impl RmfRecord {
    const SIZE: usize = structures::NAME_LEN + 12;

    fn read_from(reader: &mut impl Read) -> std::io::Result<Self> {
        let name = structures::read_name(reader)?;
        Ok(Self {
            name,
            kind: reader.read_u32::<LittleEndian>()?,
            offset: reader.read_u32::<LittleEndian>()?,
            size: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Tree-shaped RMF archive.
///
/// ```text
/// 0x00  tag    "RMF\0"
/// 0x04  root directory table
///
/// table  := entry_count u32, entry_count x record
/// record := name[16], kind u32 (0 file, 1 folder), offset u32, size u32
/// ```
///
/// A folder record's `offset` points at another table and its `size` is that
/// table's length in bytes. Each table belongs to exactly one folder; a table
/// referenced twice is rejected. The listing is a tree of [`FolderInfo`] values.
#[derive(Debug, Default, Clone, Copy)]
pub struct RmfFileArchive;

impl RmfFileArchive {
    pub const TAG: [u8; 4] = *b"RMF\0";
    pub const ROOT_TABLE_OFFSET: u64 = 4;

    /// Check for the RMF tag at the current position without consuming it.
    pub fn is_supported(stream: &mut dyn ReadSeek) -> Result<bool> {
        Ok(io::peek_bytes::<4>(stream)? == Some(Self::TAG))
    }

    /// Parse the table at `table_offset` and every table below it.
    ///
    /// `declared_len` is the byte length the parent's folder record claims for
    /// this table; the root has none. `visited` holds every table offset parsed
    /// so far in this listing.
    fn read_folder(
        stream: &mut dyn ReadSeek,
        len: u64,
        table_offset: u64,
        declared_len: Option<u64>,
        folder_path: &Path,
        depth: usize,
        visited: &mut HashSet<u64>,
    ) -> Result<Vec<ContentEntry>> {
        if !visited.insert(table_offset) {
            return Err(Error::format(
                FORMAT,
                format!(
                    "directory table at {table_offset:#x} is referenced more than once \
                     (by folder {})",
                    folder_path.display()
                ),
            ));
        }
        if depth > MAX_DEPTH {
            return Err(Error::format(
                FORMAT,
                format!("folders nest deeper than {MAX_DEPTH} levels at {table_offset:#x}"),
            ));
        }
        if table_offset.saturating_add(4) > len {
            return Err(Error::format(
                FORMAT,
                format!("directory table at {table_offset:#x} is outside the archive"),
            ));
        }

        stream.seek(SeekFrom::Start(table_offset))?;
        let entry_count = stream.read_u32::<LittleEndian>()?;

        if let Some(declared) = declared_len {
            let actual = 4 + entry_count as u64 * RmfRecord::SIZE as u64;
            if declared != actual {
                return Err(Error::format(
                    FORMAT,
                    format!(
                        "folder {} declares a {declared}-byte table but its {entry_count} \
                         entries need {actual}",
                        folder_path.display()
                    ),
                ));
            }
        }

        // Records are read up front because descending into a folder moves the cursor
        let records = structures::read_table(
            FORMAT,
            stream,
            len,
            entry_count,
            RmfRecord::SIZE,
            |cursor| RmfRecord::read_from(cursor),
        )?;
        structures::check_unique(FORMAT, records.iter().map(|r| r.name.as_str()))?;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let offset = record.offset as u64;
            let size = record.size as u64;
            structures::check_entry(FORMAT, &record.name, offset, size, len)?;

            match RmfEntryKind::from_u32(record.kind) {
                Some(RmfEntryKind::File) => {
                    entries.push(ContentEntry::File(FileInfo::new(
                        folder_path,
                        &record.name,
                        offset,
                        size,
                    )));
                }
                Some(RmfEntryKind::Folder) => {
                    let full_path = folder_path.join(&record.name);
                    let children = Self::read_folder(
                        stream,
                        len,
                        offset,
                        Some(size),
                        &full_path,
                        depth + 1,
                        visited,
                    )?;
                    entries.push(ContentEntry::Folder(FolderInfo {
                        name: record.name,
                        full_path,
                        children,
                    }));
                }
                None => {
                    return Err(Error::format(
                        FORMAT,
                        format!("entry {:?} has unknown kind {}", record.name, record.kind),
                    ));
                }
            }
        }

        Ok(entries)
    }
}

impl ArchivePlugin for RmfFileArchive {
    fn name(&self) -> &'static str {
        FORMAT
    }

    fn stream_is_supported(&self, stream: &mut dyn ReadSeek) -> Result<bool> {
        Self::is_supported(stream)
    }

    fn get_content_listing(
        &self,
        stream: &mut dyn ReadSeek,
        archive_path: &Path,
    ) -> Result<Vec<ContentEntry>> {
        let len = io::stream_len(stream)?;

        stream.seek(SeekFrom::Start(0))?;
        let tag = match io::peek_bytes::<4>(stream)? {
            Some(tag) => tag,
            None => return Err(Error::format(FORMAT, "file is too short for an RMF header")),
        };
        if tag != Self::TAG {
            return Err(Error::InvalidMagic {
                format: FORMAT,
                expected: Self::TAG.to_vec(),
                found: tag.to_vec(),
            });
        }

        let mut visited = HashSet::new();
        Self::read_folder(
            stream,
            len,
            Self::ROOT_TABLE_OFFSET,
            None,
            archive_path,
            0,
            &mut visited,
        )
    }
}
