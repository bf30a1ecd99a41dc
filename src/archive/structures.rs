use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::{Error, Result};
use crate::io::ReadSeek;

use super::FileInfo;

/// Width of the NUL-padded name field in a directory record.
pub const NAME_LEN: usize = 16;

/// Directory record shared by VOL and DYN tables - 24 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

impl DirectoryEntry {
    pub const SIZE: usize = NAME_LEN + 8;

    pub fn read_from(reader: &mut impl Read) -> std::io::Result<Self> {
        let name = read_name(reader)?;
        Ok(Self {
            name,
            offset: reader.read_u32::<LittleEndian>()?,
            size: reader.read_u32::<LittleEndian>()?,
        })
    }

    pub fn to_file_info(&self, folder_path: &Path) -> FileInfo {
        FileInfo::new(folder_path, &self.name, self.offset as u64, self.size as u64)
    }
}

/// Read a NUL-padded name field. Anything after the first NUL is ignored.
pub(crate) fn read_name(reader: &mut impl Read) -> std::io::Result<String> {
    let mut raw = [0u8; NAME_LEN];
    reader.read_exact(&mut raw)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    // Names are DOS 8.3 in practice; decode lossily rather than reject odd bytes
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// Read `count` fixed-size records starting at the current position.
///
/// The whole table is checked against the bytes left in the stream before it is
/// read, so a corrupt count fails fast instead of allocating.
pub(crate) fn read_table<T>(
    format: &'static str,
    stream: &mut dyn ReadSeek,
    stream_len: u64,
    count: u32,
    record_size: usize,
    mut parse: impl FnMut(&mut Cursor<&[u8]>) -> std::io::Result<T>,
) -> Result<Vec<T>> {
    let table_start = stream.stream_position()?;
    let available = stream_len.saturating_sub(table_start);
    let table_len = count as u64 * record_size as u64;
    if table_len > available {
        return Err(Error::format(
            format,
            format!(
                "directory table at {table_start:#x} declares {count} entries \
                 ({table_len} bytes) but only {available} bytes remain"
            ),
        ));
    }

    // Read the entire table in one go, then parse records from memory
    let mut table = vec![0u8; table_len as usize];
    stream.read_exact(&mut table)?;

    let mut cursor = Cursor::new(table.as_slice());
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        records.push(parse(&mut cursor)?);
    }
    Ok(records)
}

/// Validate a single entry's name and data range.
pub(crate) fn check_entry(
    format: &'static str,
    name: &str,
    offset: u64,
    size: u64,
    stream_len: u64,
) -> Result<()> {
    if name.is_empty() {
        return Err(Error::format(format, "directory entry has an empty name"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::format(
            format,
            format!("entry name {name:?} is not a plain file name"),
        ));
    }
    if offset.checked_add(size).is_none_or(|end| end > stream_len) {
        return Err(Error::format(
            format,
            format!(
                "entry {name:?} spans {offset:#x}+{size} which is outside the \
                 {stream_len}-byte archive"
            ),
        ));
    }
    Ok(())
}

/// Sibling names in a single table must be unique.
pub(crate) fn check_unique<'a>(
    format: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::format(
                format,
                format!("duplicate entry name {name:?} in one directory table"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_stops_at_first_nul() {
        let mut raw = [0u8; NAME_LEN];
        raw[..5].copy_from_slice(b"A.PAL");
        raw[6] = b'X';
        let name = read_name(&mut Cursor::new(&raw[..])).unwrap();
        assert_eq!(name, "A.PAL");
    }

    #[test]
    fn name_may_fill_whole_field() {
        let raw = *b"SIXTEEN_CHARS.XY";
        let name = read_name(&mut Cursor::new(&raw[..])).unwrap();
        assert_eq!(name, "SIXTEEN_CHARS.XY");
    }

    #[test]
    fn entry_checks() {
        assert!(check_entry("vol", "OK.DAT", 8, 2, 10).is_ok());
        assert!(check_entry("vol", "OK.DAT", 9, 2, 10).is_err());
        assert!(check_entry("vol", "", 0, 0, 10).is_err());
        assert!(check_entry("vol", "..", 0, 0, 10).is_err());
        assert!(check_entry("vol", "A\\B", 0, 0, 10).is_err());
        assert!(check_entry("vol", "BIG", u64::MAX, 2, 10).is_err());
    }

    #[test]
    fn duplicates_rejected() {
        assert!(check_unique("vol", ["A", "B"]).is_ok());
        let err = check_unique("vol", ["A", "B", "A"]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Format);
    }
}
