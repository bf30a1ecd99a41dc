use byteorder::{LittleEndian, ReadBytesExt};
use std::io::SeekFrom;
use std::path::Path;

use crate::error::{Error, Result};
use crate::io::{self, ReadSeek};

use super::structures::{self, DirectoryEntry};
use super::{ArchivePlugin, ContentEntry};

const FORMAT: &str = "vol";

/// Flat VOL archive.
///
/// ```text
/// 0x00  tag          " VOL"
/// 0x04  entry_count  u32
/// 0x08  entry_count x DirectoryEntry (name[16], offset u32, size u32)
///       ...entry data
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct VolFileArchive;

impl VolFileArchive {
    pub const TAG: [u8; 4] = *b" VOL";
    pub const HEADER_SIZE: u64 = 8;

    /// Check for the VOL tag at the current position without consuming it.
    pub fn is_supported(stream: &mut dyn ReadSeek) -> Result<bool> {
        Ok(io::peek_bytes::<4>(stream)? == Some(Self::TAG))
    }
}

impl ArchivePlugin for VolFileArchive {
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
            return Err(Error::format(FORMAT, "file is too short for a VOL header"));
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

        Ok(entries
            .iter()
            .map(|entry| ContentEntry::File(entry.to_file_info(archive_path)))
            .collect())
    }
}
