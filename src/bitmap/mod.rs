//! Paletted bitmap decoding.
//!
//! 3-Space games store textures in two formats:
//!
//! - **Windows BMP**: a plain DIB with a 16 or 256 colour palette.
//! - **PBMP**: a chunked container (`head`, `data`, `DETL`, `PiDX`, ...)
//!   holding 8-bit palette indices plus precomputed mip maps. The palette
//!   itself lives in a separate palette file; `PiDX` names which one.
//!
//! Both decoders return raw indexed pixels. Resolving indices to colours is
//! left to the caller, as is rendering.

mod parser;
mod structures;

pub use parser::{Pbmp, WindowsBitmap, decode_pbmp, decode_windows_bmp};
pub use structures::*;

use crate::error::{Error, Result};
use crate::io::{self, ReadSeek};

/// Either kind of decoded bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bitmap {
    Windows(WindowsBitmap),
    Pbmp(Pbmp),
}

impl Bitmap {
    /// `(width, height, bit_depth)`, zero for a PBMP without a `head` chunk.
    pub fn dimensions(&self) -> (i32, i32, u32) {
        match self {
            Bitmap::Windows(bmp) => (bmp.info.width, bmp.info.height, bmp.info.bit_depth as u32),
            Bitmap::Pbmp(pbmp) => pbmp
                .header
                .map(|h| (h.width, h.height, h.bit_depth))
                .unwrap_or_default(),
        }
    }

    /// Embedded palette. PBMP never carries one.
    pub fn palette(&self) -> &[PaletteColour] {
        match self {
            Bitmap::Windows(bmp) => &bmp.palette,
            Bitmap::Pbmp(_) => &[],
        }
    }

    pub fn pixels(&self) -> &[u8] {
        match self {
            Bitmap::Windows(bmp) => &bmp.pixels,
            Bitmap::Pbmp(pbmp) => &pbmp.pixels,
        }
    }
}

/// Sniff the stream's tag and decode it with the matching decoder.
pub fn decode_bitmap(stream: &mut dyn ReadSeek) -> Result<Bitmap> {
    if io::peek_bytes::<4>(stream)? == Some(PBMP_TAG) {
        return Ok(Bitmap::Pbmp(decode_pbmp(stream)?));
    }

    match io::peek_bytes::<2>(stream)? {
        Some(WINDOWS_BMP_TAG) => Ok(Bitmap::Windows(decode_windows_bmp(stream)?)),
        found => Err(Error::InvalidMagic {
            format: "bitmap",
            expected: PBMP_TAG.to_vec(),
            found: found.map(|t| t.to_vec()).unwrap_or_default(),
        }),
    }
}
