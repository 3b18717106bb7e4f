use super::{BufferStream, Stream, Whence};
use crate::allocator::Allocator;
use crate::error::StreamError;
use std::io;

impl<A: Allocator> io::Read for BufferStream<'_, A> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match Stream::read(self, buf) {
            Ok(n) => Ok(n),
            Err(StreamError::EndOfStream) => Ok(0),
            Err(err) => Err(err.into()),
        }
    }
}

/// `flush` here only satisfies the `io::Write` contract; it never empties
/// the buffer the way [`Stream::flush`] does.
impl<A: Allocator> io::Write for BufferStream<'_, A> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match Stream::write(self, buf) {
            Ok(n) => Ok(n),
            // no room left to write
            Err(StreamError::EndOfStream) => Err(io::Error::new(
                io::ErrorKind::WriteZero,
                StreamError::EndOfStream,
            )),
            Err(err) => Err(err.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<A: Allocator> io::Seek for BufferStream<'_, A> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (to, whence) = match pos {
            io::SeekFrom::Start(n) => {
                let n = i64::try_from(n)
                    .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?;
                (n, Whence::Start)
            }
            io::SeekFrom::Current(n) => (n, Whence::Current),
            io::SeekFrom::End(n) => {
                let n = n
                    .checked_neg()
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?;
                (n, Whence::End)
            }
        };

        Ok(Stream::seek(self, to, whence)? as u64)
    }
}
