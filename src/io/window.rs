use std::io::{self, Read, Seek, SeekFrom};

/// A bounded window onto another stream.
///
/// Position 0 of the window is `start` in the inner stream and reads stop at
/// `start + len`. This is how an archive stored inside another archive is
/// sniffed and parsed without copying it out to a temporary file.
pub struct SubStream<R> {
    inner: R,
    start: u64,
    len: u64,
    pos: u64,
}

impl<R: Read + Seek> SubStream<R> {
    /// Create a window over `inner[start..start + len]`, positioned at its start.
    pub fn new(mut inner: R, start: u64, len: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self {
            inner,
            start,
            len,
            pos: 0,
        })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> Read for SubStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.pos);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let max = (buf.len() as u64).min(remaining) as usize;
        let n = self.inner.read(&mut buf[..max])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for SubStream<R> {
    fn seek(&mut self, target: SeekFrom) -> io::Result<u64> {
        let new_pos = match target {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(delta) => self.len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };

        let Some((new_pos, inner_pos)) =
            new_pos.and_then(|pos| Some((pos, self.start.checked_add(pos)?)))
        else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            ));
        };

        // Seeking past the end is allowed, as with files; reads then return 0.
        self.inner.seek(SeekFrom::Start(inner_pos))?;
        self.pos = new_pos;
        Ok(new_pos)
    }
}
