//! Archive and bitmap builders shared by the integration tests.

use byteorder::{LittleEndian, WriteBytesExt};

/// A VOL archive with each entry's data stored after the table, in order.
pub fn vol_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = b" VOL".to_vec();
    out.write_u32::<LittleEndian>(entries.len() as u32).unwrap();

    let mut data_offset = 8 + entries.len() * 24;
    for (name, data) in entries {
        let mut field = [0u8; 16];
        field[..name.len()].copy_from_slice(name.as_bytes());
        out.extend_from_slice(&field);
        out.write_u32::<LittleEndian>(data_offset as u32).unwrap();
        out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        data_offset += data.len();
    }
    for (_, data) in entries {
        out.extend_from_slice(data);
    }
    out
}

/// An 8-bit PBMP with a `head`, `PiDX` and `data` chunk, then a zero-size
/// terminator.
pub fn pbmp(width: i32, height: i32, palette_index: u32, pixels: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();

    body.extend_from_slice(b"head");
    body.write_u32::<LittleEndian>(20).unwrap();
    body.write_u32::<LittleEndian>(0x0100).unwrap();
    body.write_i32::<LittleEndian>(width).unwrap();
    body.write_i32::<LittleEndian>(height).unwrap();
    body.write_u32::<LittleEndian>(8).unwrap();
    body.write_u32::<LittleEndian>(0).unwrap();

    body.extend_from_slice(b"PiDX");
    body.write_u32::<LittleEndian>(4).unwrap();
    body.write_u32::<LittleEndian>(palette_index).unwrap();

    body.extend_from_slice(b"data");
    body.write_u32::<LittleEndian>(pixels.len() as u32).unwrap();
    body.extend_from_slice(pixels);

    body.extend_from_slice(b"END!");
    body.write_u32::<LittleEndian>(0).unwrap();

    let mut out = b"PBMP".to_vec();
    out.write_u32::<LittleEndian>(body.len() as u32 + 8).unwrap();
    out.extend_from_slice(&body);
    out
}
