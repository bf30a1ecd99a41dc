//! # rvol
//!
//! A Rust extractor for 3-Space engine game archives and bitmaps.
//!
//! This library lists and extracts the contents of the VOL, DYN and RMF
//! containers used by 3-Space games, including archives nested inside other
//! archives, and decodes the paletted PBMP and Windows BMP images stored in
//! them.
//!
//! ## Features
//!
//! - Format-agnostic listing and extraction through the [`ArchivePlugin`] trait
//! - Flat VOL, layered DYN and tree-shaped RMF containers
//! - Nested archives are parsed in place through bounded stream windows
//! - PBMP (chunked, mip-mapped) and indexed Windows BMP decoding
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use rvol::{default_resource_explorer, flatten_files};
//!
//! fn main() -> rvol::Result<()> {
//!     let explorer = default_resource_explorer("/games/red_baron");
//!
//!     // List an archive, then pull every file out of it
//!     let listing = explorer.list(Path::new("SIMVOL0.VOL"))?;
//!     for file in flatten_files(&listing) {
//!         let data = explorer.extract_to_vec(&file)?;
//!         println!("{} ({} bytes)", file.filename.display(), data.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod bitmap;
pub mod cli;
pub mod config;
pub mod error;
pub mod explorer;
pub mod io;

#[cfg(test)]
mod testutil;

pub use archive::{
    ArchivePlugin, ContentEntry, DynFileArchive, FileInfo, FolderInfo, RmfFileArchive,
    VolFileArchive, flatten_files,
};
pub use bitmap::{Bitmap, Pbmp, WindowsBitmap, decode_bitmap, decode_pbmp, decode_windows_bmp};
pub use cli::Cli;
pub use config::default_resource_explorer;
pub use error::{Error, ErrorKind, Result};
pub use explorer::ResourceExplorer;
pub use io::{ReadSeek, SubStream};
