//! A uniform byte-stream capability.
//!
//! Every operation has a default that reports
//! [`StreamError::NotImplemented`], so an implementation only overrides what
//! it can actually do and consumers handle the rest uniformly.
mod buffer;
mod io;

pub use buffer::BufferStream;

use crate::error::StreamError;
use std::time::Duration;

/// Origin for [`Stream::seek`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Whence {
    /// `to` is an absolute offset.
    Start,
    /// `to` is added to the current offset.
    Current,
    /// `to` is subtracted from the stream's length.
    End,
}

/// Readiness a caller can wait for with [`Stream::poll`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PollEvent {
    Read,
    Write,
}

pub trait Stream {
    /// Moves the cursor and returns its new offset.
    fn seek(&mut self, _to: i64, _whence: Whence) -> Result<usize, StreamError> {
        Err(StreamError::NotImplemented)
    }

    fn tell(&self) -> Result<usize, StreamError> {
        Err(StreamError::NotImplemented)
    }

    /// Reads into `buf` at the cursor and advances it by the count returned.
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, StreamError> {
        Err(StreamError::NotImplemented)
    }

    /// Reads into `buf` starting at `offset`. The cursor does not move.
    fn read_at(&mut self, _buf: &mut [u8], _offset: usize) -> Result<usize, StreamError> {
        Err(StreamError::NotImplemented)
    }

    /// Writes `buf` at the cursor and advances it by the count returned.
    fn write(&mut self, _buf: &[u8]) -> Result<usize, StreamError> {
        Err(StreamError::NotImplemented)
    }

    /// Writes `buf` starting at `offset`. The cursor does not move.
    fn write_at(&mut self, _buf: &[u8], _offset: usize) -> Result<usize, StreamError> {
        Err(StreamError::NotImplemented)
    }

    fn read_byte(&mut self) -> Result<u8, StreamError> {
        let mut byte = [0];

        match self.read(&mut byte)? {
            0 => Err(StreamError::EndOfStream),
            _ => Ok(byte[0]),
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), StreamError> {
        match self.write(&[byte])? {
            0 => Err(StreamError::EndOfStream),
            _ => Ok(()),
        }
    }

    fn close(&mut self) -> Result<(), StreamError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        Err(StreamError::NotImplemented)
    }

    /// Length of the stream's content in bytes.
    fn size(&self) -> Result<usize, StreamError> {
        Err(StreamError::NotImplemented)
    }

    /// Waits up to `timeout` for `event` and reports whether it is ready.
    fn poll(&mut self, _event: PollEvent, _timeout: Duration) -> Result<bool, StreamError> {
        Err(StreamError::NotImplemented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sink {
        taken: usize,
    }

    impl Stream for Sink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
            self.taken += buf.len();
            Ok(buf.len())
        }
    }

    #[test]
    fn unimplemented_operations_report_so() {
        let mut sink = Sink { taken: 0 };
        let stream: &mut dyn Stream = &mut sink;

        assert_eq!(stream.read(&mut [0; 4]), Err(StreamError::NotImplemented));
        assert_eq!(stream.read_byte(), Err(StreamError::NotImplemented));
        assert_eq!(stream.seek(0, Whence::Start), Err(StreamError::NotImplemented));
        assert_eq!(stream.tell(), Err(StreamError::NotImplemented));
        assert_eq!(stream.size(), Err(StreamError::NotImplemented));
        assert_eq!(stream.flush(), Err(StreamError::NotImplemented));
        assert_eq!(
            stream.poll(PollEvent::Read, Duration::ZERO),
            Err(StreamError::NotImplemented)
        );
        assert_eq!(stream.close(), Ok(()));
    }

    #[test]
    fn byte_helpers_go_through_write() {
        let mut sink = Sink { taken: 0 };

        sink.write_byte(b'x').unwrap();
        sink.write_byte(b'y').unwrap();

        assert_eq!(sink.taken, 2);
    }
}
