//! In-memory fixture builders for unit tests.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::archive::NAME_LEN;

pub fn name_field(name: &str) -> [u8; NAME_LEN] {
    let mut field = [0u8; NAME_LEN];
    field[..name.len()].copy_from_slice(name.as_bytes());
    field
}

fn write_record(out: &mut Vec<u8>, name: &str, offset: usize, size: usize) {
    out.extend_from_slice(&name_field(name));
    out.write_u32::<LittleEndian>(offset as u32).unwrap();
    out.write_u32::<LittleEndian>(size as u32).unwrap();
}

fn patch_u32(out: &mut [u8], at: usize, value: usize) {
    out[at..at + 4].copy_from_slice(&(value as u32).to_le_bytes());
}

/// A VOL archive with the entries' data laid out after the table, in order.
pub fn vol_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b" VOL");
    out.write_u32::<LittleEndian>(entries.len() as u32).unwrap();

    let mut data_offset = 8 + entries.len() * 24;
    for (name, data) in entries {
        write_record(&mut out, name, data_offset, data.len());
        data_offset += data.len();
    }
    for (_, data) in entries {
        out.extend_from_slice(data);
    }
    out
}

/// A DYN archive with one table per patch followed by all data.
pub fn dyn_archive(patches: &[&[(&str, &[u8])]]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"DYNV");
    out.write_u32::<LittleEndian>(patches.len() as u32).unwrap();

    let tables_len: usize = patches.iter().map(|p| 4 + p.len() * 24).sum();
    let mut data_offset = 8 + tables_len;
    for patch in patches {
        out.write_u32::<LittleEndian>(patch.len() as u32).unwrap();
        for (name, data) in patch.iter() {
            write_record(&mut out, name, data_offset, data.len());
            data_offset += data.len();
        }
    }
    for patch in patches {
        for (_, data) in patch.iter() {
            out.extend_from_slice(data);
        }
    }
    out
}

pub enum RmfNode<'a> {
    File(&'a str, &'a [u8]),
    Folder(&'a str, Vec<RmfNode<'a>>),
}

/// An RMF archive: every table first, depth first, then file data.
pub fn rmf_archive(root: &[RmfNode<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"RMF\0");

    let mut pending = Vec::new();
    write_rmf_table(&mut out, root, &mut pending);

    for (record_at, data) in pending {
        let offset = out.len();
        out.extend_from_slice(data);
        patch_u32(&mut out, record_at + NAME_LEN + 4, offset);
        patch_u32(&mut out, record_at + NAME_LEN + 8, data.len());
    }
    out
}

fn write_rmf_table<'a>(
    out: &mut Vec<u8>,
    nodes: &'a [RmfNode<'a>],
    pending: &mut Vec<(usize, &'a [u8])>,
) {
    out.write_u32::<LittleEndian>(nodes.len() as u32).unwrap();

    let mut records = Vec::with_capacity(nodes.len());
    for node in nodes {
        records.push(out.len());
        let (name, kind) = match node {
            RmfNode::File(name, _) => (name, 0u32),
            RmfNode::Folder(name, _) => (name, 1u32),
        };
        out.extend_from_slice(&name_field(name));
        out.write_u32::<LittleEndian>(kind).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
    }

    for (node, record_at) in nodes.iter().zip(records) {
        match node {
            RmfNode::File(_, data) => pending.push((record_at, *data)),
            RmfNode::Folder(_, children) => {
                let table_at = out.len();
                write_rmf_table(out, children, pending);
                patch_u32(out, record_at + NAME_LEN + 4, table_at);
                patch_u32(out, record_at + NAME_LEN + 8, 4 + children.len() * 28);
            }
        }
    }
}

/// Raw PBMP chunk: tag, little-endian size, payload.
pub fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    chunk_with_size(tag, payload.len() as u32, payload)
}

/// Raw PBMP chunk whose declared size need not match the payload.
pub fn chunk_with_size(tag: &[u8; 4], size: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.write_u32::<LittleEndian>(size).unwrap();
    out.extend_from_slice(payload);
    out
}

pub fn pbmp_head(width: i32, height: i32, bit_depth: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(0x0100).unwrap();
    out.write_i32::<LittleEndian>(width).unwrap();
    out.write_i32::<LittleEndian>(height).unwrap();
    out.write_u32::<LittleEndian>(bit_depth).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    chunk(b"head", &out)
}

/// `PBMP` tag and file size around the given chunks.
pub fn pbmp_file(chunks: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = chunks.concat();
    let mut out = b"PBMP".to_vec();
    out.write_u32::<LittleEndian>(body.len() as u32 + 8).unwrap();
    out.extend_from_slice(&body);
    out
}

/// A Windows BMP with `palette_len` colours `(i, i, i, 0)` and the given pixels.
pub fn windows_bmp(
    width: i32,
    height: i32,
    bit_depth: u16,
    palette_len: usize,
    pixels: &[u8],
) -> Vec<u8> {
    let pixel_offset = 14 + 40 + palette_len * 4;
    let mut out = b"BM".to_vec();
    out.write_u32::<LittleEndian>((pixel_offset + pixels.len()) as u32)
        .unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(pixel_offset as u32).unwrap();

    out.write_u32::<LittleEndian>(40).unwrap();
    out.write_i32::<LittleEndian>(width).unwrap();
    out.write_i32::<LittleEndian>(height).unwrap();
    out.write_u16::<LittleEndian>(1).unwrap();
    out.write_u16::<LittleEndian>(bit_depth).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(pixels.len() as u32).unwrap();
    out.write_i32::<LittleEndian>(2835).unwrap();
    out.write_i32::<LittleEndian>(2835).unwrap();
    out.write_u32::<LittleEndian>(palette_len as u32).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();

    for i in 0..palette_len {
        let v = i as u8;
        out.extend_from_slice(&[v, v, v, 0]);
    }
    out.extend_from_slice(pixels);
    out
}
