use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

pub const WINDOWS_BMP_TAG: [u8; 2] = *b"BM";
pub const PBMP_TAG: [u8; 4] = *b"PBMP";

/// PBMP chunk tags
pub const HEADER_TAG: [u8; 4] = *b"head";
pub const DATA_TAG: [u8; 4] = *b"data";
pub const DETAIL_TAG: [u8; 4] = *b"DETL";
pub const PALETTE_TAG: [u8; 4] = *b"PiDX";

/// One palette entry - 4 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaletteColour {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub flags: u8,
}

impl PaletteColour {
    pub const SIZE: usize = 4;

    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> std::io::Result<Self> {
        let mut raw = [0u8; Self::SIZE];
        reader.read_exact(&mut raw)?;
        Ok(Self {
            red: raw[0],
            green: raw[1],
            blue: raw[2],
            flags: raw[3],
        })
    }

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

/// Number of bytes in `width * height` pixels of `bit_depth` bits, computed the
/// way the PBMP and BMP decoders have always done it: whole bytes per pixel,
/// so depths below 8 yield an empty buffer.
///
/// `None` when the product is negative or does not fit in memory.
pub fn pixel_buffer_len(width: i32, height: i32, bit_depth: u32) -> Option<usize> {
    let bytes_per_pixel = (bit_depth / 8) as i64;
    let len = (width as i64)
        .checked_mul(height as i64)?
        .checked_mul(bytes_per_pixel)?;
    usize::try_from(len).ok()
}

/// PBMP `head` chunk payload - 20 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PbmpHeader {
    pub version: u32,
    pub width: i32,
    pub height: i32,
    pub bit_depth: u32,
    pub flags: u32,
}

impl PbmpHeader {
    pub const SIZE: u64 = 20;

    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            version: reader.read_u32::<LittleEndian>()?,
            width: reader.read_i32::<LittleEndian>()?,
            height: reader.read_i32::<LittleEndian>()?,
            bit_depth: reader.read_u32::<LittleEndian>()?,
            flags: reader.read_u32::<LittleEndian>()?,
        })
    }

    pub fn pixel_buffer_len(&self) -> Option<usize> {
        pixel_buffer_len(self.width, self.height, self.bit_depth)
    }
}

/// Windows BMP file header - 14 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowsBmpHeader {
    pub tag: [u8; 2],
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub pixel_offset: u32,
}

impl WindowsBmpHeader {
    pub const SIZE: usize = 14;

    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> std::io::Result<Self> {
        let mut tag = [0u8; 2];
        reader.read_exact(&mut tag)?;
        Ok(Self {
            tag,
            file_size: reader.read_u32::<LittleEndian>()?,
            reserved1: reader.read_u16::<LittleEndian>()?,
            reserved2: reader.read_u16::<LittleEndian>()?,
            pixel_offset: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Windows BMP info header (BITMAPINFOHEADER) - 40 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowsBmpInfo {
    pub info_size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_depth: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_pixels_per_metre: i32,
    pub y_pixels_per_metre: i32,
    pub num_colours_used: u32,
    pub num_important_colours: u32,
}

impl WindowsBmpInfo {
    pub const SIZE: usize = 40;

    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            info_size: reader.read_u32::<LittleEndian>()?,
            width: reader.read_i32::<LittleEndian>()?,
            height: reader.read_i32::<LittleEndian>()?,
            planes: reader.read_u16::<LittleEndian>()?,
            bit_depth: reader.read_u16::<LittleEndian>()?,
            compression: reader.read_u32::<LittleEndian>()?,
            image_size: reader.read_u32::<LittleEndian>()?,
            x_pixels_per_metre: reader.read_i32::<LittleEndian>()?,
            y_pixels_per_metre: reader.read_i32::<LittleEndian>()?,
            num_colours_used: reader.read_u32::<LittleEndian>()?,
            num_important_colours: reader.read_u32::<LittleEndian>()?,
        })
    }

    /// Palette entries that follow the info header: only 4- and 8-bit images
    /// carry one.
    pub fn palette_len(&self) -> usize {
        match self.bit_depth {
            4 => 16,
            8 => 256,
            _ => 0,
        }
    }

    pub fn pixel_buffer_len(&self) -> Option<usize> {
        pixel_buffer_len(self.width, self.height, self.bit_depth as u32)
    }
}
