//! Stream plumbing shared by the archive plugins, the bitmap codec and the explorer.
//!
//! Every parser in this crate works against a `&mut dyn ReadSeek`: a blocking,
//! seekable byte stream whose cursor is owned by the caller. Nested archives are
//! parsed through a [`SubStream`] window over the already-open outer stream.

mod window;

pub use window::SubStream;

use std::io::{self, Read, Seek, SeekFrom};

/// A seekable byte source usable as a trait object.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Total length of the stream. The cursor is left where it was.
pub fn stream_len(stream: &mut dyn ReadSeek) -> io::Result<u64> {
    let pos = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    if pos != len {
        stream.seek(SeekFrom::Start(pos))?;
    }
    Ok(len)
}

/// Read `N` bytes at the current position without consuming them.
///
/// Returns `None` if the stream ends first. The cursor is restored in every case,
/// including when the read itself fails.
pub fn peek_bytes<const N: usize>(stream: &mut dyn ReadSeek) -> io::Result<Option<[u8; N]>> {
    let start = stream.stream_position()?;
    let mut buf = [0u8; N];
    let read = read_fully(stream, &mut buf);
    stream.seek(SeekFrom::Start(start))?;
    Ok((read? == N).then_some(buf))
}

/// Read exactly `N` bytes, typically a format tag.
pub fn read_tag<const N: usize>(stream: &mut dyn ReadSeek) -> io::Result<[u8; N]> {
    let mut tag = [0u8; N];
    stream.read_exact(&mut tag)?;
    Ok(tag)
}

/// Like `read_exact`, but reports how much was read instead of failing on EOF.
pub fn read_fully(stream: &mut dyn ReadSeek, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Move the cursor forward by `count` bytes.
pub fn skip(stream: &mut dyn ReadSeek, count: u64) -> io::Result<u64> {
    let delta = i64::try_from(count)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "skip distance too large"))?;
    stream.seek(SeekFrom::Current(delta))
}
