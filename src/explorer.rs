//! Logical path resolution across the file system and nested archives.
//!
//! A logical path is an on-disk path that may continue into archives:
//!
//! ```text
//! /games/red_baron/SIMVOL0.VOL/TEXTURES.DYN/SKY.PBA
//! ^-------- on disk --------^ ^-- entries, possibly nested --^
//! ```
//!
//! Resolution walks the path left to right. It finds the first component that
//! is a regular file on disk, then repeatedly asks the registered plugins to
//! identify and list the current container, and descends into the entry whose
//! path is a prefix of the target. Each descent wraps the entry's byte range
//! in a [`SubStream`] over the stream already open, so nested archives are
//! never copied out.

use std::fs::{self, File};
use std::io::{SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::archive::{ArchivePlugin, ContentEntry, FileInfo, FolderInfo};
use crate::error::{Error, Result};
use crate::io::{ReadSeek, SubStream};

/// Registry of archive plugins over a root search path.
///
/// Plugins are tried in registration order and the first one that recognises
/// a stream wins. Every call opens its own file handle, so one explorer can
/// serve several threads at once.
pub struct ResourceExplorer {
    search_path: PathBuf,
    plugins: Vec<Box<dyn ArchivePlugin>>,
}

/// What a logical path turned out to name.
enum Resolved<'a> {
    Directory(PathBuf),
    Folder(FolderInfo),
    Entry(Located<'a>),
}

/// A file found during resolution, with the stream it lives in.
struct Located<'a> {
    /// The owning container's bytes, or the file itself when it is on disk.
    stream: Box<dyn ReadSeek>,
    /// Plugin that listed `info`; `None` for a file on disk.
    owner: Option<&'a dyn ArchivePlugin>,
    info: FileInfo,
}

impl Located<'_> {
    /// Stream over exactly this file's bytes.
    fn into_entry_stream(self) -> Result<Box<dyn ReadSeek>> {
        match self.owner {
            None => Ok(self.stream),
            Some(_) => Ok(Box::new(SubStream::new(
                self.stream,
                self.info.offset,
                self.info.size,
            )?)),
        }
    }
}

impl ResourceExplorer {
    /// An explorer with no plugins rooted at `search_path`.
    ///
    /// A relative `search_path` is made absolute against the current directory
    /// here, so the `FileInfo` paths handed out by [`list`](Self::list) resolve
    /// to the same place when passed back to [`extract`](Self::extract).
    pub fn new(search_path: impl Into<PathBuf>) -> Self {
        let search_path = search_path.into();
        Self {
            search_path: std::path::absolute(&search_path).unwrap_or(search_path),
            plugins: Vec::new(),
        }
    }

    /// Register a plugin after all existing ones.
    pub fn add_plugin<P: ArchivePlugin + 'static>(&mut self, plugin: P) -> &mut Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn plugins(&self) -> impl Iterator<Item = &(dyn ArchivePlugin + 'static)> {
        self.plugins.iter().map(|p| p.as_ref())
    }

    pub fn search_path(&self) -> &Path {
        &self.search_path
    }

    /// First plugin that recognises the stream, checked from position 0.
    pub fn detect(&self, stream: &mut dyn ReadSeek) -> Result<Option<&dyn ArchivePlugin>> {
        stream.seek(SeekFrom::Start(0))?;
        for plugin in &self.plugins {
            if plugin.stream_is_supported(stream)? {
                return Ok(Some(plugin.as_ref()));
            }
        }
        Ok(None)
    }

    /// Name of the plugin that handles `path`, if any.
    pub fn identify(&self, path: &Path) -> Result<Option<&'static str>> {
        let mut stream = self.open(path)?;
        Ok(self.detect(&mut *stream)?.map(|plugin| plugin.name()))
    }

    /// List a directory on disk, an archive, or a folder inside an archive.
    ///
    /// Files that no plugin recognises have no listing and yield an empty one.
    pub fn list(&self, path: &Path) -> Result<Vec<ContentEntry>> {
        match self.resolve(path)? {
            Resolved::Directory(dir) => list_directory(&dir),
            Resolved::Folder(folder) => Ok(folder.children),
            Resolved::Entry(located) => {
                let container_path = located.info.filename.clone();
                let mut stream = located.into_entry_stream()?;
                match self.detect(&mut *stream)? {
                    Some(plugin) => plugin.get_content_listing(&mut *stream, &container_path),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    /// Write the contents of `info` to `output`.
    ///
    /// The owning container is found again from `info.filename`; the offset and
    /// size used are the ones in `info`.
    pub fn extract(&self, info: &FileInfo, output: &mut dyn Write) -> Result<()> {
        match self.resolve(&info.filename)? {
            Resolved::Entry(Located {
                mut stream,
                owner: Some(plugin),
                ..
            }) => plugin.extract_file_contents(&mut *stream, info, output),
            Resolved::Entry(Located {
                mut stream,
                owner: None,
                ..
            }) => {
                std::io::copy(&mut stream, output)?;
                Ok(())
            }
            Resolved::Directory(path) => Err(Error::NotFound(path)),
            Resolved::Folder(folder) => Err(Error::NotFound(folder.full_path)),
        }
    }

    pub fn extract_to_vec(&self, info: &FileInfo) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(info.size as usize);
        self.extract(info, &mut data)?;
        Ok(data)
    }

    /// A stream over the bytes of the file at `path`, wherever it is nested.
    pub fn open(&self, path: &Path) -> Result<Box<dyn ReadSeek>> {
        match self.resolve(path)? {
            Resolved::Entry(located) => located.into_entry_stream(),
            Resolved::Directory(path) => Err(Error::NotFound(path)),
            Resolved::Folder(folder) => Err(Error::NotFound(folder.full_path)),
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.search_path.join(path)
        }
    }

    fn resolve(&self, path: &Path) -> Result<Resolved<'_>> {
        let target = self.absolute(path);
        if target.is_dir() {
            return Ok(Resolved::Directory(target));
        }

        // The shortest prefix that is a regular file is where archives begin
        let mut on_disk = PathBuf::new();
        let mut components = target.components();
        loop {
            match components.next() {
                Some(component) => {
                    on_disk.push(component);
                    if on_disk.is_file() {
                        break;
                    }
                }
                None => return Err(Error::NotFound(target)),
            }
        }

        let file = File::open(&on_disk)?;
        let size = file.metadata()?.len();
        let mut current = Located {
            stream: Box::new(file),
            owner: None,
            info: FileInfo {
                folder_path: on_disk.parent().map(Path::to_path_buf).unwrap_or_default(),
                filename: on_disk,
                offset: 0,
                size,
            },
        };

        while current.info.filename != target {
            let container_path = current.info.filename.clone();
            let mut stream = current.into_entry_stream()?;
            let Some(plugin) = self.detect(&mut *stream)? else {
                return Err(Error::NotFound(target));
            };

            let listing = plugin.get_content_listing(&mut *stream, &container_path)?;
            match find_entry(listing, &target) {
                Some(ContentEntry::File(info)) => {
                    current = Located {
                        stream,
                        owner: Some(plugin),
                        info,
                    };
                }
                Some(ContentEntry::Folder(folder)) => return Ok(Resolved::Folder(folder)),
                None => return Err(Error::NotFound(target)),
            }
        }

        Ok(Resolved::Entry(current))
    }
}

/// The file that is or contains `target`, or the folder that is `target`.
fn find_entry(entries: Vec<ContentEntry>, target: &Path) -> Option<ContentEntry> {
    for entry in entries {
        match entry {
            ContentEntry::File(ref info) if target.starts_with(&info.filename) => {
                return Some(entry);
            }
            ContentEntry::Folder(folder) if folder.full_path == target => {
                return Some(ContentEntry::Folder(folder));
            }
            ContentEntry::Folder(folder) if target.starts_with(&folder.full_path) => {
                return find_entry(folder.children, target);
            }
            _ => {}
        }
    }
    None
}

/// One level of an on-disk directory, sorted by name.
fn list_directory(dir: &Path) -> Result<Vec<ContentEntry>> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        let metadata = fs::metadata(&path)?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if metadata.is_dir() {
            entries.push(ContentEntry::Folder(FolderInfo {
                name,
                full_path: path,
                children: Vec::new(),
            }));
        } else if metadata.is_file() {
            entries.push(ContentEntry::File(FileInfo {
                filename: path,
                folder_path: dir.to_path_buf(),
                offset: 0,
                size: metadata.len(),
            }));
        }
    }
    Ok(entries)
}
