//! Decoders for Windows BMP and PBMP images.
//!
//! Both decoders read strictly forward from the stream's current position. On
//! success the cursor is left just past the last byte consumed: the pixel data
//! for BMP, the terminating chunk (or end of stream) for PBMP.

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::io::{self, ReadSeek};

use super::structures::*;

/// A decoded Windows BMP: its headers, palette and raw indexed pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowsBitmap {
    pub header: WindowsBmpHeader,
    pub info: WindowsBmpInfo,
    pub palette: Vec<PaletteColour>,
    pub pixels: Vec<u8>,
}

/// A decoded PBMP. Only the full-size image is kept; mip-map levels stored
/// after it in the `data` chunk are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pbmp {
    pub file_size: u32,
    /// `None` when the file has no `head` chunk.
    pub header: Option<PbmpHeader>,
    /// Value of the `DETL` chunk.
    pub detail_levels: Option<u32>,
    /// Value of the `PiDX` chunk: which palette in an external palette file
    /// these indices refer to.
    pub palette_index: Option<u32>,
    pub pixels: Vec<u8>,
}

/// Decode a Windows BMP starting at the current position.
///
/// Only the palette layout of 4- and 8-bit images is understood. The pixel
/// buffer is `width * height * (bit_depth / 8)` bytes read straight after the
/// palette; `pixel_offset` is not consulted and rows are not unpadded.
pub fn decode_windows_bmp(stream: &mut dyn ReadSeek) -> Result<WindowsBitmap> {
    let tag = io::peek_bytes::<2>(stream)?;
    if tag != Some(WINDOWS_BMP_TAG) {
        return Err(Error::InvalidMagic {
            format: "bmp",
            expected: WINDOWS_BMP_TAG.to_vec(),
            found: tag.map(|t| t.to_vec()).unwrap_or_default(),
        });
    }

    let header = WindowsBmpHeader::read_from(stream)?;
    let info = WindowsBmpInfo::read_from(stream)?;

    let mut palette = Vec::with_capacity(info.palette_len());
    for _ in 0..info.palette_len() {
        palette.push(PaletteColour::read_from(stream)?);
    }

    let pixel_len = info.pixel_buffer_len().ok_or_else(|| {
        Error::format(
            "bmp",
            format!(
                "{}x{} image at {} bits per pixel has no valid pixel buffer size",
                info.width, info.height, info.bit_depth
            ),
        )
    })?;
    let pixels = read_pixels(stream, pixel_len)?;

    Ok(WindowsBitmap {
        header,
        info,
        palette,
        pixels,
    })
}

/// Decode a PBMP starting at the current position.
///
/// The chunk loop ends at a clean end of stream or at the first unrecognised
/// chunk whose declared size is zero.
pub fn decode_pbmp(stream: &mut dyn ReadSeek) -> Result<Pbmp> {
    let tag = io::peek_bytes::<4>(stream)?;
    if tag != Some(PBMP_TAG) {
        return Err(Error::InvalidMagic {
            format: "pbmp",
            expected: PBMP_TAG.to_vec(),
            found: tag.map(|t| t.to_vec()).unwrap_or_default(),
        });
    }
    io::skip(stream, PBMP_TAG.len() as u64)?;

    let mut bitmap = Pbmp {
        file_size: stream.read_u32::<LittleEndian>()?,
        ..Pbmp::default()
    };
    let mut pixel_len = 0usize;

    loop {
        let mut chunk_tag = [0u8; 4];
        match io::read_fully(stream, &mut chunk_tag)? {
            0 => break,
            4 => {}
            n => {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("chunk tag truncated after {n} bytes"),
                )));
            }
        }
        let chunk_size = stream.read_u32::<LittleEndian>()? as u64;

        match chunk_tag {
            HEADER_TAG => {
                let header = PbmpHeader::read_from(stream)?;
                pixel_len = header.pixel_buffer_len().ok_or_else(|| {
                    Error::format(
                        "pbmp",
                        format!(
                            "{}x{} image at {} bits per pixel has no valid pixel buffer size",
                            header.width, header.height, header.bit_depth
                        ),
                    )
                })?;
                bitmap.header = Some(header);
                skip_within(stream, chunk_size.saturating_sub(PbmpHeader::SIZE))?;
            }
            DATA_TAG => {
                let consumed = pixel_len as u64;
                if chunk_size < consumed {
                    return Err(Error::format(
                        "pbmp",
                        format!("data chunk holds {chunk_size} bytes but the image needs {consumed}"),
                    ));
                }
                bitmap.pixels = read_pixels(stream, pixel_len)?;
                // The rest of the chunk is the mip-map chain, which is not decoded
                skip_within(stream, chunk_size - consumed)?;
            }
            DETAIL_TAG => {
                bitmap.detail_levels = Some(stream.read_u32::<LittleEndian>()?);
                skip_within(stream, chunk_size.saturating_sub(4))?;
            }
            PALETTE_TAG => {
                bitmap.palette_index = Some(stream.read_u32::<LittleEndian>()?);
                skip_within(stream, chunk_size.saturating_sub(4))?;
            }
            _ if chunk_size == 0 => break,
            _ => skip_within(stream, chunk_size)?,
        }
    }

    Ok(bitmap)
}

/// Read `len` pixel bytes, refusing up front if the stream is too short so a
/// corrupt size never turns into a huge allocation.
fn read_pixels(stream: &mut dyn ReadSeek, len: usize) -> Result<Vec<u8>> {
    let available = remaining(stream)?;
    if len as u64 > available {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("pixel data needs {len} bytes but only {available} remain"),
        )));
    }
    let mut pixels = vec![0u8; len];
    stream.read_exact(&mut pixels)?;
    Ok(pixels)
}

/// Skip `count` bytes of the current chunk.
fn skip_within(stream: &mut dyn ReadSeek, count: u64) -> Result<()> {
    let available = remaining(stream)?;
    if count > available {
        return Err(Error::format(
            "pbmp",
            format!("chunk runs {} bytes past the end of the stream", count - available),
        ));
    }
    io::skip(stream, count)?;
    Ok(())
}

fn remaining(stream: &mut dyn ReadSeek) -> Result<u64> {
    let pos = stream.stream_position()?;
    Ok(io::stream_len(stream)?.saturating_sub(pos))
}
