use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::Path;

use crate::error::{Error, Result};
use crate::io::{self, ReadSeek};

use super::structures::{self, DirectoryEntry};
use super::{ArchivePlugin, ContentEntry};

const FORMAT: &str = "dyn";

/// Layered DYN archive.
///
/// ```text
/// 0x00  tag          "DYNV"
/// 0x04  patch_count  u32
/// 0x08  patch_count x { entry_count u32, entry_count x DirectoryEntry }
///       ...entry data
/// ```
///
/// Patches are applied in file order. A record whose name already appeared in
/// an earlier patch replaces that entry's offset and size but keeps its place in
/// the listing; new names are appended.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynFileArchive;

impl DynFileArchive {
    pub const TAG: [u8; 4] = *b"DYNV";
    pub const HEADER_SIZE: u64 = 8;

    /// Check for the DYN tag at the current position without consuming it.
    pub fn is_supported(stream: &mut dyn ReadSeek) -> Result<bool> {
        Ok(io::peek_bytes::<4>(stream)? == Some(Self::TAG))
    }

    /// Read every patch table and fold them into one directory.
    fn read_patches(stream: &mut dyn ReadSeek, len: u64) -> Result<Vec<DirectoryEntry>> {
        let patch_count = stream.read_u32::<LittleEndian>()?;

        // Each patch is at least its 4-byte entry count
        let available = len.saturating_sub(Self::HEADER_SIZE);
        if patch_count as u64 * 4 > available {
            return Err(Error::format(
                FORMAT,
                format!("{patch_count} patches cannot fit in the remaining {available} bytes"),
            ));
        }

        let mut merged: Vec<DirectoryEntry> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for patch in 0..patch_count {
            let table_at = stream.stream_position()?;
            if table_at + 4 > len {
                return Err(Error::format(
                    FORMAT,
                    format!("patch {patch} header at {table_at:#x} is truncated"),
                ));
            }
            let entry_count = stream.read_u32::<LittleEndian>()?;
            let entries = structures::read_table(
                FORMAT,
                stream,
                len,
                entry_count,
                DirectoryEntry::SIZE,
                |cursor| DirectoryEntry::read_from(cursor),
            )?;

            for entry in &entries {
                structures::check_entry(
                    FORMAT,
                    &entry.name,
                    entry.offset as u64,
                    entry.size as u64,
                    len,
                )?;
            }
            structures::check_unique(FORMAT, entries.iter().map(|e| e.name.as_str()))?;

            for entry in entries {
                match index.get(&entry.name) {
                    Some(&slot) => merged[slot] = entry,
                    None => {
                        index.insert(entry.name.clone(), merged.len());
                        merged.push(entry);
                    }
                }
            }
        }

        Ok(merged)
    }
}

impl ArchivePlugin for DynFileArchive {
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
        if len < Self::HEADER_SIZE {
            return Err(Error::format(FORMAT, "file is too short for a DYN header"));
        }

        stream.seek(SeekFrom::Start(0))?;
        let tag = io::read_tag::<4>(stream)?;
        if tag != Self::TAG {
            return Err(Error::InvalidMagic {
                format: FORMAT,
                expected: Self::TAG.to_vec(),
                found: tag.to_vec(),
            });
        }

        let entries = Self::read_patches(stream, len)?;
        Ok(entries
            .iter()
            .map(|entry| ContentEntry::File(entry.to_file_info(archive_path)))
            .collect())
    }
}
